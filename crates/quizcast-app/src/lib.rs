//! Application layer for quizcast
//!
//! Runtimes that execute the client state machines against real or fake
//! I/O, plus the [`Driver`] trait that frontends implement. The same runtime
//! code runs in the terminal client and in deterministic tests.
//!
//! # Components
//!
//! - [`ChannelHub`]: shared real-time connection with per-view subscriptions
//! - [`ParticipantRuntime`]: participant view (calls, countdown, storage)
//! - [`HostRuntime`]: host view
//! - [`AuthService`]: login state with periodic re-checks
//! - [`Driver`], [`run_participant`], [`run_host`]: frontend loop
//! - [`Config`]: backend URL resolution

mod auth;
mod config;
mod countdown;
mod driver;
mod error;
mod host;
mod hub;
mod participant;
#[cfg(test)]
mod testing;

pub use auth::AuthService;
pub use config::{BACKEND_URL_VAR, Config, DEFAULT_BACKEND_URL};
pub use countdown::{Countdown, TICK};
pub use driver::{Command, Driver, View, run_host, run_participant};
pub use error::{ConfigError, RuntimeError};
pub use host::HostRuntime;
pub use hub::{ChannelHub, Subscription};
pub use participant::ParticipantRuntime;
use quizcast_proto::EventKind;

/// Events a participant view listens for.
pub const PARTICIPANT_EVENTS: [EventKind; 2] = [EventKind::QuestionPushed, EventKind::QuizEnded];

/// Events a host view listens for.
pub const HOST_EVENTS: [EventKind; 5] = EventKind::ALL;
