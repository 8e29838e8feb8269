//! socket.io packets over engine.io websocket frames.
//!
//! Every websocket text frame is one engine.io packet: a single type digit
//! followed by an optional body. Type `4` wraps a socket.io packet, which has
//! its own type digit, an optional namespace (`/name,`), an optional ack id,
//! and a JSON body.
//!
//! ```text
//! 0{"sid":"abc","pingInterval":25000,...}   engine.io open
//! 2                                          engine.io ping
//! 40                                         socket.io connect, default namespace
//! 42["question:pushed",{"quizId":"q1",...}]  socket.io event
//! 42/admin,7["votes:update",{...}]           event on /admin with ack id 7
//! ```
//!
//! Binary attachments and acknowledgements are not part of the quiz contract
//! and are rejected as malformed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ProtocolError, Result};

/// Namespace used when none is written on the wire.
pub const DEFAULT_NAMESPACE: &str = "/";

/// engine.io open handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine session id.
    pub sid: String,
    /// Transports the server would upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    /// Largest accepted payload in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

/// socket.io packet carried inside an engine.io message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connect (client request or server confirmation).
    Connect {
        /// Namespace.
        namespace: String,
        /// Auth payload (client) or `{sid}` (server).
        data: Option<Value>,
    },
    /// Namespace disconnect.
    Disconnect {
        /// Namespace.
        namespace: String,
    },
    /// Named event with arguments.
    Event {
        /// Namespace.
        namespace: String,
        /// Acknowledgement id requested by the sender.
        ack_id: Option<u64>,
        /// Event name.
        name: String,
        /// Event arguments.
        args: Vec<Value>,
    },
    /// Server refused the namespace connect.
    ConnectError {
        /// Namespace.
        namespace: String,
        /// Reason, if given.
        message: Option<String>,
    },
}

impl SocketPacket {
    /// Event on the default namespace without an ack id.
    pub fn event(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Event { namespace: DEFAULT_NAMESPACE.into(), ack_id: None, name: name.into(), args }
    }

    /// Connect request for the default namespace.
    pub fn connect() -> Self {
        Self::Connect { namespace: DEFAULT_NAMESPACE.into(), data: None }
    }

    fn decode(body: &str) -> Result<Self> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or_else(|| malformed("empty socket.io packet"))?;
        let (namespace, rest) = split_namespace(chars.as_str());
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (ack, json) = rest.split_at(digits);
        let ack_id = if ack.is_empty() {
            None
        } else {
            Some(ack.parse::<u64>().map_err(|_| malformed("ack id out of range"))?)
        };

        match kind {
            '0' => {
                let data = if json.is_empty() { None } else { Some(serde_json::from_str(json)?) };
                Ok(Self::Connect { namespace, data })
            },
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let mut items: Vec<Value> = serde_json::from_str(json)?;
                if items.is_empty() {
                    return Err(malformed("event without a name"));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(malformed("event name is not a string"));
                };
                Ok(Self::Event { namespace, ack_id, name, args: items })
            },
            '4' => {
                let message = if json.is_empty() {
                    None
                } else {
                    let value: Value = serde_json::from_str(json)?;
                    value.get("message").and_then(Value::as_str).map(str::to_string)
                };
                Ok(Self::ConnectError { namespace, message })
            },
            other => Err(malformed(format!("unsupported socket.io packet type {other:?}"))),
        }
    }

    fn encode(&self, out: &mut String) -> Result<()> {
        match self {
            Self::Connect { namespace, data } => {
                out.push('0');
                push_namespace(out, namespace);
                if let Some(data) = data {
                    out.push_str(&serde_json::to_string(data)?);
                }
            },
            Self::Disconnect { namespace } => {
                out.push('1');
                push_namespace(out, namespace);
            },
            Self::Event { namespace, ack_id, name, args } => {
                out.push('2');
                push_namespace(out, namespace);
                if let Some(id) = ack_id {
                    out.push_str(&id.to_string());
                }
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                out.push_str(&serde_json::to_string(&items)?);
            },
            Self::ConnectError { namespace, message } => {
                out.push('4');
                push_namespace(out, namespace);
                if let Some(message) = message {
                    out.push_str(&serde_json::to_string(&serde_json::json!({ "message": message }))?);
                }
            },
        }
        Ok(())
    }
}

/// One engine.io packet (one websocket text frame).
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Session opened.
    Open(Handshake),
    /// Session closed.
    Close,
    /// Heartbeat request; must be answered with [`Packet::Pong`].
    Ping,
    /// Heartbeat reply.
    Pong,
    /// socket.io payload.
    Message(SocketPacket),
    /// No-op.
    Noop,
}

impl Packet {
    /// Decode one websocket text frame.
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or_else(|| malformed("empty frame"))?;
        let body = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(body)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(SocketPacket::decode(body)?)),
            '6' => Ok(Self::Noop),
            other => Err(malformed(format!("unsupported engine.io packet type {other:?}"))),
        }
    }

    /// Encode as one websocket text frame.
    pub fn encode(&self) -> Result<String> {
        let mut out = String::new();
        match self {
            Self::Open(handshake) => {
                out.push('0');
                out.push_str(&serde_json::to_string(handshake)?);
            },
            Self::Close => out.push('1'),
            Self::Ping => out.push('2'),
            Self::Pong => out.push('3'),
            Self::Message(packet) => {
                out.push('4');
                packet.encode(&mut out)?;
            },
            Self::Noop => out.push('6'),
        }
        Ok(out)
    }
}

fn malformed(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::MalformedPacket(reason.into())
}

fn split_namespace(body: &str) -> (String, &str) {
    if !body.starts_with('/') {
        return (DEFAULT_NAMESPACE.to_string(), body);
    }
    match body.find(',') {
        Some(comma) => (body[..comma].to_string(), &body[comma + 1..]),
        None => (body.to_string(), ""),
    }
}

fn push_namespace(out: &mut String, namespace: &str) {
    if namespace != DEFAULT_NAMESPACE {
        out.push_str(namespace);
        out.push(',');
    }
}
