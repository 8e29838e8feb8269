//! Real-time channel hub.
//!
//! One connection serves the whole process. Views register interest in event
//! kinds with [`ChannelHub::subscribe`] and receive matching events on their
//! own queue. Dropping the [`Subscription`] removes the listener, so every
//! subscribe has exactly one matching unsubscribe and a remounted view never
//! sees an event twice.
//!
//! The channel itself does not scope events per quiz; listeners must filter
//! by quiz id.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, PoisonError, Weak},
};

use quizcast_core::{ChannelError, RealtimeChannel};
use quizcast_proto::{ClientEmit, EventKind, QuizId, ServerEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

#[derive(Debug)]
struct Listener {
    kinds: BTreeSet<EventKind>,
    queue: UnboundedSender<ServerEvent>,
}

/// Shared owner of the real-time connection.
#[derive(Debug)]
pub struct ChannelHub<C> {
    channel: C,
    joined: BTreeSet<QuizId>,
    registry: Arc<Mutex<Registry>>,
    open: bool,
}

impl<C: RealtimeChannel> ChannelHub<C> {
    /// Take ownership of a connected channel.
    pub fn new(channel: C) -> Self {
        Self { channel, joined: BTreeSet::new(), registry: Arc::default(), open: true }
    }

    /// Subscribe the connection to a quiz room. Joining a room already joined
    /// sends nothing.
    ///
    /// Returns whether a join was sent.
    ///
    /// # Errors
    ///
    /// `ChannelError` if the emit fails; the room is not recorded as joined.
    pub async fn join_room(&mut self, quiz_id: &QuizId) -> Result<bool, ChannelError> {
        if self.joined.contains(quiz_id) {
            trace!(%quiz_id, "room already joined");
            return Ok(false);
        }
        self.channel.emit(ClientEmit::JoinRoom { quiz_id: quiz_id.clone() }).await?;
        debug!(%quiz_id, "joined room");
        self.joined.insert(quiz_id.clone());
        Ok(true)
    }

    /// Rooms joined so far.
    pub fn joined_rooms(&self) -> impl Iterator<Item = &QuizId> {
        self.joined.iter()
    }

    /// Register a listener for `kinds`.
    pub fn subscribe(&self, kinds: &[EventKind]) -> Subscription {
        let (queue, events) = mpsc::unbounded_channel();
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Listener { kinds: kinds.iter().copied().collect(), queue });
        debug!(id, ?kinds, "listener registered");
        Subscription { id, events, registry: Arc::downgrade(&self.registry) }
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner).listeners.len()
    }

    /// Whether the connection is still delivering events.
    pub fn is_connected(&self) -> bool {
        self.open && self.channel.is_connected()
    }

    /// Wait for one event and hand it to every listener registered for its
    /// kind.
    ///
    /// Returns the number of listeners reached, or `None` once the channel
    /// has closed. Cancel-safe.
    pub async fn pump(&mut self) -> Option<usize> {
        if !self.open {
            return None;
        }
        let Some(event) = self.channel.recv().await else {
            warn!("realtime channel closed");
            self.open = false;
            return None;
        };
        Some(self.dispatch(&event))
    }

    fn dispatch(&self, event: &ServerEvent) -> usize {
        let kind = event.kind();
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0;
        for listener in registry.listeners.values().filter(|l| l.kinds.contains(&kind)) {
            if listener.queue.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        trace!(event = kind.name(), delivered, "dispatched");
        delivered
    }

    /// Close the connection. Listeners stay registered but receive nothing
    /// more.
    pub async fn close(&mut self) {
        self.channel.close().await;
        self.open = false;
    }
}

/// A registered listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    events: UnboundedReceiver<ServerEvent>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Next event for this listener. Cancel-safe.
    ///
    /// Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        self.events.try_recv().ok()
    }
}

/// Next event of an optional subscription; pends forever without one.
pub(crate) async fn next_event(subscription: &mut Option<Subscription>) -> Option<ServerEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().unwrap_or_else(PoisonError::into_inner).listeners.remove(&self.id);
            debug!(id = self.id, "listener removed");
        }
    }
}
