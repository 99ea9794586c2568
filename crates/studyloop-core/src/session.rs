use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed, non-skipped traversal of the Work phase.
///
/// Produced by the timer engine at the moment the countdown reaches zero;
/// handed to the session recorder as-is. The id is generated client-side so
/// a session stays identifiable even when recording fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub id: Uuid,
    /// Total seconds of the Work phase that produced this session,
    /// captured when the phase was entered.
    pub duration_secs: u32,
    pub tags: Vec<String>,
    pub notes: String,
    pub completed_at: DateTime<Utc>,
}
