//! Observer registry behavior under in-flight progress.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wristlink_core::delivery;
use wristlink_core::observers::TransferObservers;
use wristlink_core::session::{TransferHandle, TransferKind, TransferProgress};

fn counting_callback() -> (Arc<AtomicUsize>, impl FnMut(TransferProgress) + Send + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    (hits, move |_progress| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// Let the watcher task see the update and post to the delivery queue.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_callback_fires_per_progress_update() {
    let (handle_tx, mut queue) = delivery::channel();
    let observers = TransferObservers::new(handle_tx);
    let (transfer, progress_tx) = TransferHandle::channel(TransferKind::File, None, 4);
    let (hits, callback) = counting_callback();

    observers.observe(&transfer, callback);
    progress_tx
        .send(TransferProgress { completed: 1, total: 4 })
        .unwrap();
    settle().await;
    progress_tx
        .send(TransferProgress { completed: 2, total: 4 })
        .unwrap();
    settle().await;

    queue.run_pending();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unobserve_stops_in_flight_progress() {
    let (handle_tx, mut queue) = delivery::channel();
    let observers = TransferObservers::new(handle_tx);
    let (transfer, progress_tx) = TransferHandle::channel(TransferKind::File, None, 4);
    let (hits, callback) = counting_callback();

    observers.observe(&transfer, callback);
    progress_tx
        .send(TransferProgress { completed: 1, total: 4 })
        .unwrap();
    settle().await;

    // The update is queued on the delivery context but has not run yet.
    observers.unobserve(&transfer);
    queue.run_pending();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_second_observe_replaces_first() {
    let (handle_tx, mut queue) = delivery::channel();
    let observers = TransferObservers::new(handle_tx);
    let (transfer, progress_tx) = TransferHandle::channel(TransferKind::UserInfo, None, 4);
    let (first_hits, first) = counting_callback();
    let (second_hits, second) = counting_callback();

    observers.observe(&transfer, first);
    observers.observe(&transfer, second);
    progress_tx
        .send(TransferProgress { completed: 1, total: 4 })
        .unwrap();
    settle().await;

    queue.run_pending();
    assert_eq!(first_hits.load(Ordering::SeqCst), 0);
    assert_eq!(second_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropping_registry_deregisters_everything() {
    let (handle_tx, mut queue) = delivery::channel();
    let observers = TransferObservers::new(handle_tx);
    let (first, first_tx) = TransferHandle::channel(TransferKind::File, None, 4);
    let (second, second_tx) = TransferHandle::channel(TransferKind::UserInfo, None, 4);
    let (hits, callback) = counting_callback();
    let (more_hits, other_callback) = counting_callback();

    observers.observe(&first, callback);
    observers.observe(&second, other_callback);
    drop(observers);

    first_tx
        .send(TransferProgress { completed: 1, total: 4 })
        .unwrap();
    second_tx
        .send(TransferProgress { completed: 1, total: 4 })
        .unwrap();
    settle().await;

    queue.run_pending();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(more_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_updates_before_observe_do_not_replay() {
    let (handle_tx, mut queue) = delivery::channel();
    let observers = TransferObservers::new(handle_tx);
    let (transfer, progress_tx) = TransferHandle::channel(TransferKind::File, None, 4);

    progress_tx
        .send(TransferProgress { completed: 3, total: 4 })
        .unwrap();

    let (hits, callback) = counting_callback();
    observers.observe(&transfer, callback);
    settle().await;

    queue.run_pending();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
