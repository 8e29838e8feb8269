//! Deterministic test harness for quizcast.
//!
//! In-memory implementations of the I/O seams, a scripted [`Driver`], a
//! reference model of the participant machine, and fixtures for the common
//! quiz used across tests.
//!
//! [`Driver`]: quizcast_app::Driver

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fake_api;
pub mod fake_channel;
pub mod fake_tracker;
pub mod fixtures;
pub mod model;
pub mod scripted_driver;

pub use fake_api::{ApiCall, FakeApi};
pub use fake_channel::{FakeChannel, FakeServer};
pub use fake_tracker::FakeTracker;
pub use model::{ModelOutcome, ModelParticipant, Operation};
pub use scripted_driver::{Frame, ScriptedDriver};
