//! In-process change bus backed by a tokio broadcast channel.
//!
//! Repositories publish a [`Change`] after every successful write; live
//! queries subscribe and re-run themselves when a relevant change arrives.

use tokio::sync::broadcast;

use shiori_domain::change::Change;

/// In-process change bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the change is simply dropped).
#[derive(Debug, Clone)]
pub struct InProcessChangeBus {
    sender: broadcast::Sender<Change>,
}

impl InProcessChangeBus {
    /// Create a new change bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a change to all current subscribers.
    pub fn publish(&self, change: Change) {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(change);
    }

    /// Subscribe to changes on this bus.
    ///
    /// Returns a receiver that will get all changes published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }
}

impl Default for InProcessChangeBus {
    fn default() -> Self {
        Self::new(256)
    }
}
