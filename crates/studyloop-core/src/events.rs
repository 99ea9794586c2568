use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::CompletedSession;
use crate::timer::{Phase, TimerConfig};

/// Every state change in the timer produces an Event.
///
/// The engine returns the event caused by each operation; the service
/// republishes them on a broadcast channel so embedders can re-render
/// without polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// One second elapsed without a phase boundary.
    Tick {
        phase: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// A Work phase ran to zero. Carries the session payload handed to the
    /// recorder; the countdown is already sitting at the start of
    /// `next_phase`, halted.
    WorkCompleted {
        session: CompletedSession,
        next_phase: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// A break ran to zero; the countdown is back at Work, halted.
    BreakCompleted {
        finished: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// Forced transition. No session is counted or recorded.
    TimerSkipped {
        from: Phase,
        to: Phase,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    ConfigUpdated {
        config: TimerConfig,
        at: DateTime<Utc>,
    },
    /// The session recorder failed. The transition that produced the
    /// session stands regardless.
    SessionRecordFailed {
        session_id: uuid::Uuid,
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        seconds_remaining: u32,
        total_secs: u32,
        is_running: bool,
        completed_work_sessions: u32,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}
