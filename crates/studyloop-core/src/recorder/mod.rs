//! Session recording collaborators.
//!
//! A recorder durably stores completed work sessions. The timer never
//! waits on one: recording is dispatched fire-and-forget by the service,
//! and a failure is reported, not retried.

mod http;

pub use http::HttpRecorder;

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::RecorderError;
use crate::session::CompletedSession;

#[async_trait]
pub trait SessionRecorder: Send + Sync {
    /// Persist one completed work session.
    ///
    /// # Errors
    ///
    /// Returns a `RecorderError` when the session could not be stored.
    /// The caller treats this as reportable, never fatal.
    async fn record(&self, session: &CompletedSession) -> Result<(), RecorderError>;
}

/// Keeps sessions in memory. Useful for tests and ephemeral runs where
/// nothing should touch disk or network.
#[derive(Default)]
pub struct MemoryRecorder {
    sessions: Mutex<Vec<CompletedSession>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<CompletedSession> {
        self.sessions.lock().expect("recorder lock poisoned").clone()
    }
}

#[async_trait]
impl SessionRecorder for MemoryRecorder {
    async fn record(&self, session: &CompletedSession) -> Result<(), RecorderError> {
        self.sessions
            .lock()
            .expect("recorder lock poisoned")
            .push(session.clone());
        Ok(())
    }
}
