//! Typed publish/subscribe channel for session events.
//!
//! The bus is the only path from the dispatcher and the transport to the
//! presentation layer. Publication is non-blocking and safe from any
//! thread; each subscriber owns an ordered queue and drains it from its
//! own task, so presentation state is never touched from two contexts at
//! once. Subscriptions end when the [`EventStream`] is dropped.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;

use crate::status::CommandStatus;

/// An event broadcast to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A command status record flowed (outcome, reply, or incoming data)
    DataFlowed(CommandStatus),
    /// The session transport finished activating
    ActivationCompleted,
    /// The counterpart's reachability changed
    ReachabilityChanged,
}

/// In-process broadcast channel for [`SessionEvent`]s.
///
/// Cloning the bus yields another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    ///
    /// The subscriber receives every event published after this call, in
    /// publication order, until the returned stream is dropped.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("bus lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber { id, tx });
        EventStream {
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Broadcast an event to every current subscriber.
    ///
    /// Subscribers whose stream has gone away are pruned as a side effect.
    pub fn publish(&self, event: &SessionEvent) {
        let mut inner = self.inner.lock().expect("bus lock poisoned");
        inner
            .subscribers
            .retain(|subscriber| subscriber.tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().expect("bus lock poisoned").subscribers.len()
    }
}

/// A subscriber's ordered event queue.
///
/// Dropping the stream unsubscribes it from the bus.
pub struct EventStream {
    id: u64,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    bus: Weak<Mutex<BusInner>>,
}

impl EventStream {
    /// Wait for the next event.
    ///
    /// Returns `None` once the bus is gone and the queue is drained.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Take the next event without waiting, if one is queued.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            if let Ok(mut inner) = bus.lock() {
                inner.subscribers.retain(|subscriber| subscriber.id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{Command, CommandStatus, Phrase};

    #[test]
    fn test_publish_reaches_all_subscribers_in_order() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(&SessionEvent::ActivationCompleted);
        bus.publish(&SessionEvent::ReachabilityChanged);

        for stream in [&mut first, &mut second] {
            assert!(matches!(stream.try_next(), Some(SessionEvent::ActivationCompleted)));
            assert!(matches!(stream.try_next(), Some(SessionEvent::ReachabilityChanged)));
            assert!(stream.try_next().is_none());
        }
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let stream = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(stream);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.publish(&SessionEvent::ActivationCompleted);
        let mut stream = bus.subscribe();
        assert!(stream.try_next().is_none());
    }

    #[test]
    fn test_status_records_flow_through() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe();
        let status = CommandStatus::new(Command::SendMessage, Phrase::Sent);
        bus.publish(&SessionEvent::DataFlowed(status));

        match stream.try_next() {
            Some(SessionEvent::DataFlowed(received)) => {
                assert_eq!(received.command, Command::SendMessage);
                assert_eq!(received.phrase, Phrase::Sent);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
