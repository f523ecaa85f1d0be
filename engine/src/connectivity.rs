//! Connectivity monitor.
//!
//! Tracks network reachability and notifies subscribers exactly once per
//! actual transition. The platform signal is pushed in through
//! [`ConnectivityMonitor::set_online`] or forwarded from a watch channel with
//! [`ConnectivityMonitor::attach`].

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A reachability transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
}

impl ConnectivityEvent {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityEvent::BecameOnline)
    }
}

type Handler = Arc<dyn Fn(ConnectivityEvent) + Send + Sync>;

struct Shared {
    online: AtomicBool,
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

/// Observes reachability and fans transitions out to subscribers.
///
/// Cheap to clone; clones observe the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    shared: Arc<Shared>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                online: AtomicBool::new(online),
                next_id: AtomicU64::new(0),
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_online(&self) -> bool {
        self.shared.online.load(Ordering::SeqCst)
    }

    /// Record the platform's current reachability.
    ///
    /// Returns the emitted event, or `None` if the state did not change.
    pub fn set_online(&self, online: bool) -> Option<ConnectivityEvent> {
        let previous = self.shared.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return None;
        }

        let event = if online {
            ConnectivityEvent::BecameOnline
        } else {
            ConnectivityEvent::BecameOffline
        };
        tracing::debug!(?event, "connectivity changed");

        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<Handler> = self
            .shared
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }

        Some(event)
    }

    /// Register a transition callback. Dropping the returned handle unsubscribes.
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ConnectivityEvent) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        self.shared.handlers.lock().push((id, Arc::new(callback)));
        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.handlers.lock().len()
    }

    /// Follow a platform signal published on a watch channel.
    ///
    /// The current value is applied immediately; the task ends when the
    /// sender is dropped.
    pub fn attach(&self, mut signal: watch::Receiver<bool>) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let initial = *signal.borrow_and_update();
            monitor.set_online(initial);
            while signal.changed().await.is_ok() {
                let online = *signal.borrow_and_update();
                monitor.set_online(online);
            }
        })
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("online", &self.is_online())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle to a registered callback.
#[derive(Debug)]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    shared: Weak<Shared>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.handlers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
