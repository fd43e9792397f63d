//! Post-commit change notification.
//!
//! After a vote transaction commits, the engine tells the UI-invalidation
//! collaborator (an SSE fan-out in production) that an argument's aggregates
//! changed. Notification is strictly best-effort: the transaction is already
//! committed, so a lost signal costs a stale UI, never a wrong balance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A fire-and-forget "this argument changed" signal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArgumentChanged {
    pub topic_id: String,
    pub argument_id: String,
    /// Why the aggregates moved, e.g. `"new_vote"`.
    pub reason: String,
}

/// The notification seam between the ledger engine and the SSE collaborator.
pub trait ChangeNotifier: Send + Sync {
    /// Emit a change signal. Implementations must swallow delivery failures;
    /// the commit this describes has already happened.
    fn argument_changed(&self, topic_id: &str, argument_id: &str, reason: &str);
}

/// Notifier that drops every signal (tests, offline tooling).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn argument_changed(&self, _topic_id: &str, _argument_id: &str, _reason: &str) {}
}

/// Broadcast-channel notifier for in-process subscribers.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ArgumentChanged>,
    sequence: Arc<AtomicU64>,
}

impl BroadcastNotifier {
    /// Create a notifier with the given subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to change signals.
    pub fn subscribe(&self) -> broadcast::Receiver<ArgumentChanged> {
        self.sender.subscribe()
    }

    /// Number of signals emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn argument_changed(&self, topic_id: &str, argument_id: &str, reason: &str) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        let event = ArgumentChanged {
            topic_id: topic_id.to_string(),
            argument_id: argument_id.to_string(),
            reason: reason.to_string(),
        };
        // No subscribers is not a failure.
        if self.sender.send(event).is_err() {
            tracing::debug!(topic_id, argument_id, "change signal had no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_delivery() {
        let notifier = BroadcastNotifier::new(16);
        let mut receiver = notifier.subscribe();

        notifier.argument_changed("t1", "a1", "new_vote");
        let event = receiver.recv().await.expect("event delivered");
        assert_eq!(event.topic_id, "t1");
        assert_eq!(event.argument_id, "a1");
        assert_eq!(event.reason, "new_vote");
        assert_eq!(notifier.sequence(), 1);
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let notifier = BroadcastNotifier::new(16);
        notifier.argument_changed("t1", "a1", "new_vote");
        assert_eq!(notifier.sequence(), 1);
    }
}
