//! Quiz client state machines.
//!
//! Pure state machines for the participant, host and login views. Each one
//! takes an event (user input, server push, completed REST call, timer tick)
//! and returns the actions a runtime must perform. Nothing here performs I/O,
//! reads a clock or spawns a task, so every transition is unit-testable.
//!
//! ```text
//!              JoinCompleted(ok)       question:pushed         AnswerSelected
//! ┌──────────┐ ───────────────> ┌─────────┐ ─────────> ┌──────────┐ ─────────> ┌──────────┐
//! │ Unjoined │                  │ Waiting │            │ Question │            │ Answered │
//! └──────────┘ <─────────────── └─────────┘ <───┐      │  Active  │ ──┐        └──────────┘
//!               LeaveRequested       │          │      └──────────┘   │ Tick to 0    │
//!                                    │          │        ┌──────────┐ <┘             │
//!                                    │          └────────│ TimedOut │                │
//!                     quiz:ended     ↓                   └──────────┘ question:pushed│
//!                               ┌───────┐  <───────────────────────────────────────────┘
//!                               │ Ended │
//!                               └───────┘
//! ```
//!
//! # Components
//!
//! - [`Participant`]: one participant's view of one quiz
//! - [`Host`]: the host's view of one quiz
//! - [`AuthSession`]: login state cache
//! - [`session`]: persisted session codec and display-name obfuscation
//! - [`draft`]: quiz draft construction and validation
//! - `transport` (feature): reqwest REST client and socket.io channel

pub mod auth;
pub mod draft;
pub mod error;
pub mod host;
pub mod participant;
pub mod session;
#[cfg(feature = "transport")]
pub mod transport;

pub use auth::{AuthAction, AuthEvent, AuthSession};
pub use draft::{DraftBuilder, DraftError, QuestionBuilder};
pub use error::ClientError;
pub use host::{Host, HostAction, HostEvent};
pub use participant::{ActiveQuestion, Participant, ParticipantAction, ParticipantEvent, Phase};
pub use session::{PersistedState, Session};
