//! Event System
//!
//! Provides a pub/sub event bus so collaborators (problems panel, tab chrome,
//! save indicator) can follow an editing session without polling it.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use tracing::debug;

/// Events emitted by an editing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A committed edit produced a new generation
    ContentChanged { generation: u64 },
    /// Dirty flag flipped relative to the saved baseline
    DirtyChanged(bool),
    /// Diagnostics were recomputed or muting changed
    DiagnosticsUpdated { visible: usize },
    /// Transient status line text
    Status(String),
    /// A save the session was asked to trigger finished
    SaveCompleted { success: bool },
    /// Session shut down
    Closed,
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Receive the next event (blocking)
    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain everything currently queued
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus for publish/subscribe pattern
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Emit an event to all subscribers, dropping the ones that went away
    pub fn emit(&self, event: Event) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());

        let delivered = subscribers.len();
        debug!("Event {:?} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Get the number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
