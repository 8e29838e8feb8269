//! In-memory real-time channel.
//!
//! [`FakeChannel`] goes into the hub; the paired [`FakeServer`] stays with
//! the test to push events, inspect emits and drop the connection.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use quizcast_core::{ChannelError, RealtimeChannel};
use quizcast_proto::{ClientEmit, ServerEvent};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::trace;

#[derive(Debug, Default)]
struct Shared {
    emitted: Mutex<Vec<ClientEmit>>,
    closed: AtomicBool,
}

/// Client half, implementing [`RealtimeChannel`].
#[derive(Debug)]
pub struct FakeChannel {
    incoming: UnboundedReceiver<ServerEvent>,
    shared: Arc<Shared>,
}

/// Server half, held by the test.
#[derive(Debug, Clone)]
pub struct FakeServer {
    outgoing: UnboundedSender<ServerEvent>,
    shared: Arc<Shared>,
}

impl FakeChannel {
    /// A connected pair.
    pub fn pair() -> (Self, FakeServer) {
        let (outgoing, incoming) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        (Self { incoming, shared: Arc::clone(&shared) }, FakeServer { outgoing, shared })
    }
}

#[async_trait]
impl RealtimeChannel for FakeChannel {
    async fn emit(&mut self, event: ClientEmit) -> Result<(), ChannelError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        trace!(?event, "fake emit");
        self.shared.emitted.lock().unwrap_or_else(PoisonError::into_inner).push(event);
        Ok(())
    }

    async fn recv(&mut self) -> Option<ServerEvent> {
        self.incoming.recv().await
    }

    fn is_connected(&self) -> bool {
        !self.shared.closed.load(Ordering::Acquire)
    }

    async fn close(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.incoming.close();
    }
}

impl FakeServer {
    /// Deliver an event to the client. Returns false once the client is gone.
    pub fn push(&self, event: ServerEvent) -> bool {
        self.outgoing.send(event).is_ok()
    }

    /// Everything the client emitted, oldest first.
    pub fn emitted(&self) -> Vec<ClientEmit> {
        self.shared.emitted.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of room joins emitted.
    pub fn room_joins(&self) -> usize {
        self.emitted().iter().filter(|e| matches!(e, ClientEmit::JoinRoom { .. })).count()
    }

    /// Drop the connection from the server side.
    pub fn disconnect(self) {
        self.shared.closed.store(true, Ordering::Release);
    }
}
