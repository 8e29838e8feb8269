//! socket.io channel over a websocket.
//!
//! One background task owns the websocket. It answers engine.io pings,
//! connects the default namespace, holds back emits until the namespace is
//! confirmed, and forwards decoded events to an unbounded queue.
//! [`RealtimeChannel::recv`] reads that queue, so dropping a `recv` future
//! loses nothing.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use quizcast_core::{ChannelError, RealtimeChannel};
use quizcast_proto::{ClientEmit, Packet, ProtocolError, ServerEvent, SocketPacket};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Websocket endpoint for a backend base URL.
///
/// `http` maps to `ws` and `https` to `wss`; the path and query select the
/// engine.io v4 websocket transport.
///
/// # Errors
///
/// `Transport` for unparseable URLs and unsupported schemes.
pub fn socket_url(base_url: &str) -> Result<Url, ChannelError> {
    let mut url =
        Url::parse(base_url).map_err(|err| ChannelError::Transport(format!("{base_url}: {err}")))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ChannelError::Transport(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| ChannelError::Transport(format!("cannot use scheme {scheme}")))?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

#[derive(Debug)]
enum Outgoing {
    Emit(ClientEmit),
    Close,
}

/// Production [`RealtimeChannel`].
#[derive(Debug)]
pub struct WebSocketChannel {
    outgoing: UnboundedSender<Outgoing>,
    events: UnboundedReceiver<ServerEvent>,
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WebSocketChannel {
    /// Open the websocket for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// `Transport` if the URL is invalid or the handshake fails.
    pub async fn connect(base_url: &str) -> Result<Self, ChannelError> {
        let url = socket_url(base_url)?;
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|err| ChannelError::Transport(err.to_string()))?;
        info!(%url, "realtime channel connected");

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(run(stream, outgoing_rx, events_tx, Arc::clone(&connected)));

        Ok(Self { outgoing, events, connected, task: Some(task) })
    }

    /// A channel that never connected. Emits fail with `Closed` and `recv`
    /// returns `None` at once, so a session on it runs on REST alone.
    pub fn offline() -> Self {
        let (outgoing, _) = mpsc::unbounded_channel();
        let (_, events) = mpsc::unbounded_channel();
        Self { outgoing, events, connected: Arc::new(AtomicBool::new(false)), task: None }
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[async_trait]
impl RealtimeChannel for WebSocketChannel {
    async fn emit(&mut self, event: ClientEmit) -> Result<(), ChannelError> {
        if !self.is_connected() {
            return Err(ChannelError::Closed);
        }
        self.outgoing.send(Outgoing::Emit(event)).map_err(|_| ChannelError::Closed)
    }

    async fn recv(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn close(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if self.outgoing.send(Outgoing::Close).is_ok() {
                if let Err(err) = task.await {
                    debug!(%err, "socket task ended abnormally");
                }
            }
        }
        self.connected.store(false, Ordering::Release);
    }
}

async fn run<S>(
    stream: S,
    mut outgoing: UnboundedReceiver<Outgoing>,
    events: UnboundedSender<ServerEvent>,
    connected: Arc<AtomicBool>,
) where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut source) = stream.split();
    let mut socket = SocketState::default();

    loop {
        let frames = tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let outcome = socket.on_frame(&text);
                    if let Some(event) = outcome.event {
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    if outcome.closed {
                        let _ = send_all(&mut sink, outcome.replies).await;
                        break;
                    }
                    outcome.replies
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("realtime channel closed by server");
                    break;
                },
                Some(Ok(_)) => Vec::new(),
                Some(Err(err)) => {
                    warn!(%err, "realtime channel error");
                    break;
                },
            },
            command = outgoing.recv() => match command {
                Some(Outgoing::Emit(emit)) => match socket.emit(&emit) {
                    Ok(frame) => frame.into_iter().collect(),
                    Err(err) => {
                        warn!(%err, "could not encode emit");
                        Vec::new()
                    },
                },
                Some(Outgoing::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                },
            },
        };

        if let Err(err) = send_all(&mut sink, frames).await {
            warn!(%err, "realtime channel write failed");
            break;
        }
    }

    connected.store(false, Ordering::Release);
}

async fn send_all<K>(sink: &mut K, frames: Vec<String>) -> Result<(), tokio_tungstenite::tungstenite::Error>
where
    K: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    for frame in frames {
        sink.send(Message::Text(frame)).await?;
    }
    Ok(())
}

/// What one inbound frame produced.
#[derive(Debug, Default, PartialEq)]
struct FrameOutcome {
    replies: Vec<String>,
    event: Option<ServerEvent>,
    closed: bool,
}

impl FrameOutcome {
    fn reply(&mut self, packet: &Packet) {
        match packet.encode() {
            Ok(frame) => self.replies.push(frame),
            Err(err) => warn!(%err, "could not encode reply"),
        }
    }
}

/// socket.io session bookkeeping, independent of the socket itself.
#[derive(Debug, Default)]
struct SocketState {
    namespace_ready: bool,
    held: Vec<String>,
}

impl SocketState {
    fn on_frame(&mut self, text: &str) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();
        let packet = match Packet::decode(text) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(%err, frame = text, "undecodable frame");
                return outcome;
            },
        };

        match packet {
            Packet::Open(handshake) => {
                debug!(sid = %handshake.sid, "engine.io open");
                outcome.reply(&Packet::Message(SocketPacket::connect()));
            },
            Packet::Ping => outcome.reply(&Packet::Pong),
            Packet::Close => outcome.closed = true,
            Packet::Pong | Packet::Noop => {},
            Packet::Message(SocketPacket::Connect { namespace, .. }) => {
                debug!(%namespace, "namespace connected");
                self.namespace_ready = true;
                outcome.replies.append(&mut self.held);
            },
            Packet::Message(SocketPacket::Event { name, args, .. }) => {
                match ServerEvent::from_event(&name, args) {
                    Ok(event) => outcome.event = Some(event),
                    Err(ProtocolError::UnknownEvent(name)) => debug!(%name, "ignoring unknown event"),
                    Err(err) => warn!(%err, "discarding malformed event"),
                }
            },
            Packet::Message(SocketPacket::ConnectError { message, .. }) => {
                warn!(reason = message.as_deref().unwrap_or(""), "namespace connect refused");
                outcome.closed = true;
            },
            Packet::Message(SocketPacket::Disconnect { namespace }) => {
                info!(%namespace, "namespace disconnected by server");
                outcome.closed = true;
            },
        }
        outcome
    }

    /// Encode an emit. Returns `None` while the namespace is not confirmed;
    /// the frame is sent once it is.
    fn emit(&mut self, emit: &ClientEmit) -> Result<Option<String>, ProtocolError> {
        let (name, payload) = emit.to_event();
        let frame = Packet::Message(SocketPacket::event(name, vec![payload])).encode()?;
        if self.namespace_ready {
            Ok(Some(frame))
        } else {
            self.held.push(frame);
            Ok(None)
        }
    }
}
