//! quizcast core seams
//!
//! The quiz client talks to three things it does not own: the REST backend,
//! the real-time event channel, and durable local storage. Each is a trait
//! here so the state machines and runtimes above can be driven by production
//! implementations or by deterministic fakes without change.
//!
//! # Components
//!
//! - [`api`]: REST action traits ([`QuizApi`], [`AuthApi`], [`GoalsApi`],
//!   [`DailyTasksApi`])
//! - [`channel`]: Real-time channel trait ([`RealtimeChannel`])
//! - [`storage`]: Key/value storage ([`Storage`], [`MemoryStorage`],
//!   [`FileStorage`])
//! - [`error`]: Error types for all three

pub mod api;
pub mod channel;
pub mod error;
pub mod storage;

pub use api::{AuthApi, DailyTasksApi, GoalsApi, QuizApi};
pub use channel::RealtimeChannel;
pub use error::{ApiError, ChannelError, StorageError};
pub use storage::{FileStorage, MemoryStorage, Storage, keys};
