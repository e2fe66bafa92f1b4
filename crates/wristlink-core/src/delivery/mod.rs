//! The single delivery context for UI-facing updates.
//!
//! Transport callbacks fire on arbitrary worker threads, but presentation
//! state is only ever mutated from one place: the loop that drains a
//! [`DeliveryQueue`]. Anything that needs to touch that state from another
//! context posts a task through a [`DeliveryHandle`] instead of running it
//! in place.

use tokio::sync::mpsc;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Create a delivery queue and a handle for posting to it.
#[must_use]
pub fn channel() -> (DeliveryHandle, DeliveryQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DeliveryHandle { tx }, DeliveryQueue { rx })
}

/// Posting side of the delivery context. Cheap to clone, safe from any thread.
#[derive(Clone)]
pub struct DeliveryHandle {
    tx: mpsc::UnboundedSender<Task>,
}

impl DeliveryHandle {
    /// Enqueue a task for the delivery loop. Never blocks.
    ///
    /// Tasks posted after the queue is gone are dropped silently; there is
    /// no UI left to update at that point.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        let _ = self.tx.send(Box::new(task));
    }
}

/// Consuming side of the delivery context, drained by exactly one loop.
pub struct DeliveryQueue {
    rx: mpsc::UnboundedReceiver<Task>,
}

impl DeliveryQueue {
    /// Wait for the next task and run it.
    ///
    /// Returns `false` once every handle is gone and the queue is drained.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run every task currently queued, without waiting. Returns the count.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}
