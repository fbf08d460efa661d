//! State fan-out to observers: the read-side boundary of the core.
//!
//! Built on a watch channel, which is exactly the delivery contract the
//! scheduler needs: publishing replaces the latest value without blocking,
//! and every observer independently sees the most recent state it has not
//! consumed yet. An observer that cannot keep up silently skips intermediate
//! ticks instead of queueing them, so a slow consumer can never stall tick
//! production.

use std::sync::Arc;

use log::debug;
use shared::TickUpdate;
use tokio::sync::watch;

/// Publishing side, owned by the simulation loop.
pub struct Broadcaster {
    sender: watch::Sender<Option<Arc<TickUpdate>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Broadcaster { sender }
    }

    /// Replaces the latest published state. Never blocks, succeeds with or
    /// without observers.
    pub fn publish(&self, update: TickUpdate) {
        self.sender.send_replace(Some(Arc::new(update)));
    }

    /// Registers a new observer.
    ///
    /// The observer starts at the current state: `latest` returns it
    /// immediately, `next_update` waits for the publish after registration.
    pub fn subscribe(&self) -> StateObserver {
        let observer = StateObserver {
            receiver: self.sender.subscribe(),
        };
        debug!("observer registered ({} now connected)", self.observer_count());
        observer
    }

    /// Number of currently registered observers. Dropping a
    /// [`StateObserver`] unregisters it.
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Broadcaster::new()
    }
}

/// One observer's handle onto the published state stream.
pub struct StateObserver {
    receiver: watch::Receiver<Option<Arc<TickUpdate>>>,
}

impl StateObserver {
    /// The most recent published state, if any tick has been published yet.
    ///
    /// Marks the value as seen, so a following `next_update` waits for a
    /// genuinely newer publish.
    pub fn latest(&mut self) -> Option<Arc<TickUpdate>> {
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for the next publish after the last state this observer saw.
    ///
    /// Returns None once the broadcaster is gone (simulation shut down).
    pub async fn next_update(&mut self) -> Option<Arc<TickUpdate>> {
        if self.receiver.changed().await.is_err() {
            return None;
        }
        self.receiver.borrow_and_update().clone()
    }
}
