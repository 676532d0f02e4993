//! Integration tests driving a real inotify channel against a temporary
//! directory.
//!
//! Events are queued by the kernel as soon as the mutation happens, so
//! the tests mutate first and poll afterwards; `poll_events` returns
//! immediately with the queued batch.

use std::fs;

use dirnotify::{Event, EventKind, Interest, WatchChannel};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Keep polling until `count` events have been collected, in case the
/// kernel split the queued mutations across reads.
fn collect_events(channel: &mut WatchChannel, count: usize) -> Vec<Event> {
    let mut events = Vec::new();
    while events.len() < count {
        events.extend(channel.poll_events().unwrap());
    }
    events
}

#[test]
fn test_file_create_then_delete_reports_both() {
    let dir = TempDir::new().unwrap();
    let mut channel = WatchChannel::open().unwrap();
    channel.subscribe(dir.path(), Interest::default()).unwrap();

    fs::File::create(dir.path().join("a.txt")).unwrap();
    let events = channel.poll_events().unwrap();
    assert_eq!(events, vec![Event::new(EventKind::Created, false, "a.txt")]);

    fs::remove_file(dir.path().join("a.txt")).unwrap();
    let events = channel.poll_events().unwrap();
    assert_eq!(events, vec![Event::new(EventKind::Deleted, false, "a.txt")]);
}

#[test]
fn test_subdirectory_create_is_flagged_as_directory() {
    let dir = TempDir::new().unwrap();
    let mut channel = WatchChannel::open().unwrap();
    channel.subscribe(dir.path(), Interest::default()).unwrap();

    fs::create_dir(dir.path().join("sub")).unwrap();
    let events = channel.poll_events().unwrap();
    assert_eq!(events, vec![Event::new(EventKind::Created, true, "sub")]);
}

#[test]
fn test_mutation_order_is_preserved() {
    let dir = TempDir::new().unwrap();
    let mut channel = WatchChannel::open().unwrap();
    channel.subscribe(dir.path(), Interest::default()).unwrap();

    fs::File::create(dir.path().join("first.txt")).unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::remove_file(dir.path().join("first.txt")).unwrap();
    fs::remove_dir(dir.path().join("sub")).unwrap();

    let events = collect_events(&mut channel, 4);
    assert_eq!(
        events,
        vec![
            Event::new(EventKind::Created, false, "first.txt"),
            Event::new(EventKind::Created, true, "sub"),
            Event::new(EventKind::Deleted, false, "first.txt"),
            Event::new(EventKind::Deleted, true, "sub"),
        ]
    );
}

#[test]
fn test_create_only_interest_ignores_deletes() {
    let dir = TempDir::new().unwrap();
    let mut channel = WatchChannel::open().unwrap();
    channel.subscribe(dir.path(), Interest::CREATE).unwrap();

    fs::File::create(dir.path().join("kept.txt")).unwrap();
    fs::remove_file(dir.path().join("kept.txt")).unwrap();
    fs::File::create(dir.path().join("second.txt")).unwrap();

    let events = collect_events(&mut channel, 2);
    assert_eq!(
        events,
        vec![
            Event::new(EventKind::Created, false, "kept.txt"),
            Event::new(EventKind::Created, false, "second.txt"),
        ]
    );
}

#[test]
fn test_unsubscribed_directory_goes_quiet() {
    let dir = TempDir::new().unwrap();
    let mut channel = WatchChannel::open().unwrap();
    let token = channel.subscribe(dir.path(), Interest::default()).unwrap();
    channel.unsubscribe(token).unwrap();

    fs::File::create(dir.path().join("unseen.txt")).unwrap();

    // The removal itself queues only an administrative record, which
    // must never surface; the mutation after it is not delivered at all.
    let batch = channel
        .poll_events_timeout(std::time::Duration::from_millis(100))
        .unwrap();
    assert_eq!(batch, None);
}

#[test]
fn test_drop_releases_the_channel() {
    // Exhausting the descriptor table would be the real failure mode;
    // here it is enough that repeated open/drop cycles never error.
    for _ in 0..64 {
        let dir = TempDir::new().unwrap();
        let mut channel = WatchChannel::open().unwrap();
        channel.subscribe(dir.path(), Interest::default()).unwrap();
    }
}
