//! Production I/O for the core seams.
//!
//! - [`HttpApi`]: REST calls over reqwest with a cookie store and a bearer
//!   token fallback
//! - [`WebSocketChannel`]: socket.io over a tokio-tungstenite websocket

mod http;
mod ws;

pub use http::HttpApi;
pub use ws::{WebSocketChannel, socket_url};
