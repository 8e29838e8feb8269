//! Real-time channel abstraction.
//!
//! Models one long-lived bidirectional connection to the backend. Production
//! uses socket.io over a websocket; tests feed events through an in-memory
//! queue. Implementations deliver events in server-send order and never
//! reorder across calls to [`RealtimeChannel::recv`].

use async_trait::async_trait;
use quizcast_proto::{ClientEmit, ServerEvent};

use crate::error::ChannelError;

/// A persistent connection that delivers server events.
#[async_trait]
pub trait RealtimeChannel: Send + 'static {
    /// Send an event to the server.
    async fn emit(&mut self, event: ClientEmit) -> Result<(), ChannelError>;

    /// Wait for the next event.
    ///
    /// Returns `None` once the connection is closed. Must be cancel-safe: a
    /// dropped call loses no event.
    async fn recv(&mut self) -> Option<ServerEvent>;

    /// Whether the connection is believed to be open.
    fn is_connected(&self) -> bool;

    /// Close the connection.
    async fn close(&mut self);
}
