//! # Studyloop Core Library
//!
//! This library provides the core logic for the Studyloop study timer.
//! The CLI binary is a thin embedding of this crate; any other frontend
//! composes the same pieces.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine cycling Work,
//!   ShortBreak and LongBreak phases; the caller (normally
//!   [`TimerService`]) delivers one `tick()` per elapsed second
//! - **Timer Service**: async wrapper owning the ticker task, a broadcast
//!   event channel, and the fire-and-forget hand-off of completed
//!   sessions to a recorder
//! - **Storage**: SQLite-based session storage and TOML-based
//!   configuration
//! - **Recorders**: pluggable sinks for completed sessions (local
//!   database, remote HTTP endpoint, in-memory)
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerService`]: async embedding surface with subscriptions
//! - [`Database`]: session persistence and statistics
//! - [`Config`]: application configuration management
//! - [`SessionRecorder`]: trait for session sinks

pub mod error;
pub mod events;
pub mod notify;
pub mod recorder;
pub mod service;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, RecorderError, Result};
pub use events::Event;
pub use notify::{Notifier, NotifyKind, NullNotifier, TerminalBell};
pub use recorder::{HttpRecorder, MemoryRecorder, SessionRecorder};
pub use service::TimerService;
pub use session::CompletedSession;
pub use storage::{Config, ConfigStore, Database, Stats, TomlConfigStore};
pub use timer::{Phase, TimerConfig, TimerEngine};
