//! Progress observer registry for in-flight transfers.
//!
//! At most one progress callback per active transfer handle: observing a
//! handle that is already observed replaces the previous registration.
//! Progress arrives on arbitrary worker threads through the handle's
//! watch channel; every callback invocation is marshaled onto the
//! delivery context, and a queued invocation re-checks its registration
//! there, so after `unobserve` returns the callback never runs again even
//! for updates already in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::delivery::DeliveryHandle;
use crate::session::{TransferHandle, TransferProgress};

type ProgressCallback = Arc<Mutex<Box<dyn FnMut(TransferProgress) + Send>>>;

/// Registry of progress callbacks keyed by transfer handle.
///
/// Holds bookkeeping only; transfer lifetime belongs to the transport.
/// Dropping the registry deregisters every still-active handle.
pub struct TransferObservers {
    delivery: DeliveryHandle,
    entries: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl TransferObservers {
    /// Create an empty registry posting to the given delivery context.
    #[must_use]
    pub fn new(delivery: DeliveryHandle) -> Self {
        Self {
            delivery,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register `callback` for the handle's progress stream.
    ///
    /// A second `observe` for the same handle without an intervening
    /// [`Self::unobserve`] is a caller logic bug; the registry resolves it
    /// by letting the last registration win.
    ///
    /// Must be called from within a tokio runtime.
    pub fn observe(
        &self,
        handle: &TransferHandle,
        callback: impl FnMut(TransferProgress) + Send + 'static,
    ) {
        let token = CancellationToken::new();
        let previous = self
            .entries
            .lock()
            .expect("observer registry lock poisoned")
            .insert(handle.id(), token.clone());
        if let Some(previous) = previous {
            tracing::warn!(transfer = %handle.id(), "transfer observed twice, replacing callback");
            previous.cancel();
        }

        let mut progress_rx = handle.progress();
        // Mark the current value seen before the watcher starts: only
        // updates published after registration flow to the callback.
        let _ = progress_rx.borrow_and_update();
        let delivery = self.delivery.clone();
        let callback: ProgressCallback = Arc::new(Mutex::new(Box::new(callback)));
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    changed = progress_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let progress = *progress_rx.borrow_and_update();
                        let gate = token.clone();
                        let callback = Arc::clone(&callback);
                        delivery.post(move || {
                            if gate.is_cancelled() {
                                return;
                            }
                            let mut callback =
                                callback.lock().expect("observer callback lock poisoned");
                            (*callback)(progress);
                        });
                    }
                }
            }
        });
    }

    /// Deregister the handle's callback. No-op if not registered.
    ///
    /// Cancellation is synchronous: once this returns, the callback is
    /// never invoked again.
    pub fn unobserve(&self, handle: &TransferHandle) {
        let token = self
            .entries
            .lock()
            .expect("observer registry lock poisoned")
            .remove(&handle.id());
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Number of handles currently observed.
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.entries
            .lock()
            .expect("observer registry lock poisoned")
            .len()
    }
}

impl Drop for TransferObservers {
    fn drop(&mut self) {
        let mut entries = self.entries.lock().expect("observer registry lock poisoned");
        for (_, token) in entries.drain() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery;
    use crate::session::TransferKind;

    #[tokio::test]
    async fn test_bookkeeping() {
        let (handle_tx, _queue) = delivery::channel();
        let observers = TransferObservers::new(handle_tx);
        let (transfer, _progress) = TransferHandle::channel(TransferKind::UserInfo, None, 4);

        observers.observe(&transfer, |_| {});
        assert_eq!(observers.observed_count(), 1);

        // Replacing keeps a single registration.
        observers.observe(&transfer, |_| {});
        assert_eq!(observers.observed_count(), 1);

        observers.unobserve(&transfer);
        assert_eq!(observers.observed_count(), 0);

        // Deregistering again is a no-op.
        observers.unobserve(&transfer);
        assert_eq!(observers.observed_count(), 0);
    }
}
