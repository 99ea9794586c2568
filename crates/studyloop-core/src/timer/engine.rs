//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use
//! internal threads - the caller delivers one `tick()` per elapsed second
//! while the countdown is running.
//!
//! ## Phase cycle
//!
//! ```text
//! Work -> ShortBreak -> Work -> ... -> Work -> LongBreak -> Work
//! ```
//!
//! Every `sessions_before_long_break`-th completed Work phase is followed
//! by a long break. The engine halts at every phase boundary; the embedder
//! decides when to start the next countdown.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(config);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event) at a phase boundary
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::{Phase, TimerConfig};
use crate::error::ConfigError;
use crate::events::Event;
use crate::session::CompletedSession;

/// Core timer engine.
///
/// Single-owner mutable state: every field is touched only through the
/// command methods below, and a transition decision is made inside the same
/// `tick()` that brings the countdown to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    config: TimerConfig,
    phase: Phase,
    seconds_remaining: u32,
    /// Full duration of the current phase, captured at phase entry.
    /// Reconfiguration mid-phase leaves it untouched.
    phase_total_secs: u32,
    running: bool,
    completed_work_sessions: u32,
    #[serde(default)]
    pending_tags: Vec<String>,
    #[serde(default)]
    pending_notes: String,
}

impl TimerEngine {
    /// Create a new engine in the initial Work phase, halted.
    ///
    /// The configuration is expected to be valid; use
    /// [`TimerConfig::validate`] at the boundary that produced it.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            phase: Phase::Work,
            seconds_remaining: config.work_secs,
            phase_total_secs: config.work_secs,
            running: false,
            completed_work_sessions: 0,
            pending_tags: Vec::new(),
            pending_notes: String::new(),
            config,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn pending_tags(&self) -> &[String] {
        &self.pending_tags
    }

    pub fn pending_notes(&self) -> &str {
        &self.pending_notes
    }

    pub fn total_secs(&self) -> u32 {
        self.phase_total_secs
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        if self.phase_total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.seconds_remaining as f64 / self.phase_total_secs as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            total_secs: self.phase_total_secs,
            is_running: self.running,
            completed_work_sessions: self.completed_work_sessions,
            progress_pct: self.progress() * 100.0,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Resume the countdown. No-op while already running or while the
    /// countdown sits at zero (a transition has to happen first).
    pub fn start(&mut self) -> Option<Event> {
        if self.running || self.seconds_remaining == 0 {
            return None;
        }
        self.running = true;
        Some(Event::TimerStarted {
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Halt the countdown. No-op while not running.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(Event::TimerPaused {
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Deliver one elapsed second. Returns the boundary event when the
    /// countdown reaches zero, `None` otherwise (including while halted).
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return None;
        }
        Some(self.complete_phase())
    }

    /// Force the transition to the next logical phase without counting the
    /// current one. A skipped Work phase produces no session record.
    pub fn skip(&mut self) -> Option<Event> {
        let from = self.phase;
        self.running = false;
        let to = match self.phase {
            // The break kind the session would have earned had it finished.
            Phase::Work => self.break_kind(self.completed_work_sessions + 1),
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.enter(to);
        Some(Event::TimerSkipped {
            from,
            to,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Replace the configuration. The active countdown is left untouched;
    /// new durations apply from the next phase entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` and keeps the previous
    /// configuration when any invariant is violated.
    pub fn set_config(&mut self, config: TimerConfig) -> Result<Event, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(Event::ConfigUpdated {
            config,
            at: Utc::now(),
        })
    }

    /// Return to the initial state: Work phase at full duration, session
    /// counter zeroed, pending tags and notes cleared.
    pub fn reset(&mut self) -> Event {
        self.running = false;
        self.completed_work_sessions = 0;
        self.pending_tags.clear();
        self.pending_notes.clear();
        self.enter(Phase::Work);
        Event::TimerReset { at: Utc::now() }
    }

    /// Attach a label to the in-progress Work session. Duplicates and
    /// blank labels are ignored. Returns whether the set changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.pending_tags.iter().any(|t| t == tag) {
            return false;
        }
        self.pending_tags.push(tag.to_string());
        true
    }

    /// Remove a label. Returns whether the set changed.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.pending_tags.len();
        self.pending_tags.retain(|t| t != tag);
        self.pending_tags.len() != before
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.pending_notes = notes.into();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_phase(&mut self) -> Event {
        self.running = false;
        match self.phase {
            Phase::Work => {
                self.completed_work_sessions += 1;
                let session = CompletedSession {
                    id: Uuid::new_v4(),
                    duration_secs: self.phase_total_secs,
                    tags: std::mem::take(&mut self.pending_tags),
                    notes: std::mem::take(&mut self.pending_notes),
                    completed_at: Utc::now(),
                };
                let next = self.break_kind(self.completed_work_sessions);
                self.enter(next);
                Event::WorkCompleted {
                    session,
                    next_phase: next,
                    seconds_remaining: self.seconds_remaining,
                    at: Utc::now(),
                }
            }
            Phase::ShortBreak | Phase::LongBreak => {
                let finished = self.phase;
                self.enter(Phase::Work);
                Event::BreakCompleted {
                    finished,
                    seconds_remaining: self.seconds_remaining,
                    at: Utc::now(),
                }
            }
        }
    }

    fn break_kind(&self, completed: u32) -> Phase {
        if completed % self.config.sessions_before_long_break == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_total_secs = self.config.duration_secs(phase);
        self.seconds_remaining = self.phase_total_secs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn short_config() -> TimerConfig {
        TimerConfig {
            work_secs: 5,
            short_break_secs: 2,
            long_break_secs: 10,
            sessions_before_long_break: 2,
        }
    }

    /// Run a started engine to its next boundary, returning the event.
    fn run_to_boundary(engine: &mut TimerEngine) -> Event {
        engine.start();
        loop {
            if let Some(event) = engine.tick() {
                return event;
            }
        }
    }

    #[test]
    fn fresh_engine_starts_in_work() {
        let engine = TimerEngine::new(short_config());
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.seconds_remaining(), 5);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_work_sessions(), 0);
    }

    #[test]
    fn start_and_pause_are_idempotent() {
        let mut engine = TimerEngine::new(short_config());
        assert!(engine.pause().is_none());
        assert!(engine.start().is_some());
        assert!(engine.start().is_none());
        assert!(engine.is_running());
        assert!(engine.pause().is_some());
        assert!(engine.pause().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn ticks_ignored_while_halted() {
        let mut engine = TimerEngine::new(short_config());
        for _ in 0..10 {
            assert!(engine.tick().is_none());
        }
        assert_eq!(engine.seconds_remaining(), 5);
    }

    #[test]
    fn work_completion_enters_short_break_and_halts() {
        let mut engine = TimerEngine::new(short_config());
        engine.start();
        for _ in 0..4 {
            assert!(engine.tick().is_none());
        }
        let event = engine.tick().expect("fifth tick crosses the boundary");
        match event {
            Event::WorkCompleted {
                session,
                next_phase,
                seconds_remaining,
                ..
            } => {
                assert_eq!(session.duration_secs, 5);
                assert_eq!(next_phase, Phase::ShortBreak);
                assert_eq!(seconds_remaining, 2);
            }
            other => panic!("expected WorkCompleted, got {other:?}"),
        }
        assert_eq!(engine.phase(), Phase::ShortBreak);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_work_sessions(), 1);
    }

    #[test]
    fn second_completion_earns_long_break() {
        let mut engine = TimerEngine::new(short_config());
        run_to_boundary(&mut engine); // Work -> ShortBreak
        run_to_boundary(&mut engine); // ShortBreak -> Work
        let event = run_to_boundary(&mut engine); // Work -> LongBreak
        match event {
            Event::WorkCompleted { next_phase, .. } => {
                assert_eq!(next_phase, Phase::LongBreak)
            }
            other => panic!("expected WorkCompleted, got {other:?}"),
        }
        assert_eq!(engine.seconds_remaining(), 10);
        assert_eq!(engine.completed_work_sessions(), 2);
    }

    #[test]
    fn cycle_law_with_classic_cadence() {
        // Classic 25/5/15 cadence, in seconds.
        let mut engine = TimerEngine::new(TimerConfig {
            work_secs: 1500,
            short_break_secs: 300,
            long_break_secs: 900,
            sessions_before_long_break: 4,
        });
        for completion in 1..=4u32 {
            let event = run_to_boundary(&mut engine); // Work -> break
            let expected = if completion == 4 {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            };
            match event {
                Event::WorkCompleted { next_phase, .. } => {
                    assert_eq!(next_phase, expected, "completion {completion}")
                }
                other => panic!("expected WorkCompleted, got {other:?}"),
            }
            run_to_boundary(&mut engine); // break -> Work
        }
        assert_eq!(engine.seconds_remaining(), 1500);
    }

    #[test]
    fn break_completion_returns_to_work() {
        let mut engine = TimerEngine::new(short_config());
        run_to_boundary(&mut engine);
        let event = run_to_boundary(&mut engine);
        match event {
            Event::BreakCompleted { finished, .. } => {
                assert_eq!(finished, Phase::ShortBreak)
            }
            other => panic!("expected BreakCompleted, got {other:?}"),
        }
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.seconds_remaining(), 5);
    }

    #[test]
    fn skip_never_counts_a_session() {
        let mut engine = TimerEngine::new(short_config());
        for _ in 0..6 {
            engine.skip();
        }
        assert_eq!(engine.completed_work_sessions(), 0);
    }

    #[test]
    fn skip_follows_the_cadence_rule() {
        // n=2, one session already completed: the next work session would
        // be the second, so skipping it lands in LongBreak.
        let mut engine = TimerEngine::new(short_config());
        run_to_boundary(&mut engine);
        run_to_boundary(&mut engine);
        assert_eq!(engine.phase(), Phase::Work);
        match engine.skip() {
            Some(Event::TimerSkipped { from, to, .. }) => {
                assert_eq!(from, Phase::Work);
                assert_eq!(to, Phase::LongBreak);
            }
            other => panic!("expected TimerSkipped, got {other:?}"),
        }
        assert_eq!(engine.completed_work_sessions(), 1);
    }

    #[test]
    fn skip_from_break_returns_to_work() {
        let mut engine = TimerEngine::new(short_config());
        engine.skip();
        assert_eq!(engine.phase(), Phase::ShortBreak);
        engine.skip();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.seconds_remaining(), 5);
        assert!(!engine.is_running());
    }

    #[test]
    fn cadence_of_one_means_every_break_is_long() {
        let mut engine = TimerEngine::new(TimerConfig {
            sessions_before_long_break: 1,
            ..short_config()
        });
        let event = run_to_boundary(&mut engine);
        match event {
            Event::WorkCompleted { next_phase, .. } => {
                assert_eq!(next_phase, Phase::LongBreak)
            }
            other => panic!("expected WorkCompleted, got {other:?}"),
        }
    }

    #[test]
    fn reconfigure_while_running_applies_at_next_entry() {
        let mut engine = TimerEngine::new(short_config());
        engine.start();
        engine.tick();
        assert_eq!(engine.seconds_remaining(), 4);

        let updated = TimerConfig {
            work_secs: 100,
            short_break_secs: 7,
            ..short_config()
        };
        engine.set_config(updated).unwrap();
        // Running countdown untouched.
        assert_eq!(engine.seconds_remaining(), 4);
        assert_eq!(engine.total_secs(), 5);

        engine.start();
        let event = run_to_boundary(&mut engine);
        match event {
            Event::WorkCompleted { session, .. } => {
                // Reports the duration the phase was entered with.
                assert_eq!(session.duration_secs, 5);
            }
            other => panic!("expected WorkCompleted, got {other:?}"),
        }
        // The new break duration is in effect from this entry.
        assert_eq!(engine.seconds_remaining(), 7);
    }

    #[test]
    fn set_config_rejects_invalid_and_keeps_previous() {
        let mut engine = TimerEngine::new(short_config());
        let bad = TimerConfig {
            work_secs: 0,
            ..short_config()
        };
        assert!(engine.set_config(bad).is_err());
        assert_eq!(engine.config(), &short_config());
    }

    #[test]
    fn tags_and_notes_attach_to_the_completed_session() {
        let mut engine = TimerEngine::new(short_config());
        assert!(engine.add_tag("math"));
        assert!(engine.add_tag("  history  "));
        assert!(!engine.add_tag("math")); // duplicate
        assert!(!engine.add_tag("   ")); // blank
        assert!(engine.remove_tag("history"));
        assert!(!engine.remove_tag("history"));
        engine.set_notes("chapter 4 review");

        let event = run_to_boundary(&mut engine);
        match event {
            Event::WorkCompleted { session, .. } => {
                assert_eq!(session.tags, vec!["math".to_string()]);
                assert_eq!(session.notes, "chapter 4 review");
            }
            other => panic!("expected WorkCompleted, got {other:?}"),
        }
        // Cleared for the next session.
        assert!(engine.pending_tags().is_empty());
        assert!(engine.pending_notes().is_empty());
    }

    #[test]
    fn tags_survive_a_skip() {
        let mut engine = TimerEngine::new(short_config());
        engine.add_tag("math");
        engine.skip();
        assert_eq!(engine.pending_tags().to_vec(), vec!["math".to_string()]);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut engine = TimerEngine::new(short_config());
        engine.add_tag("math");
        run_to_boundary(&mut engine);
        engine.reset();
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.seconds_remaining(), 5);
        assert!(!engine.is_running());
        assert_eq!(engine.completed_work_sessions(), 0);
        assert!(engine.pending_tags().is_empty());
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let engine = TimerEngine::new(short_config());
        match engine.snapshot() {
            Event::StateSnapshot {
                phase,
                seconds_remaining,
                total_secs,
                is_running,
                ..
            } => {
                assert_eq!(phase, Phase::Work);
                assert_eq!(seconds_remaining, 5);
                assert_eq!(total_secs, 5);
                assert!(!is_running);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }

    proptest! {
        /// n ticks while running decrement by exactly n, clamped at the
        /// phase boundary; no tick is lost or double-applied.
        #[test]
        fn ticks_decrement_exactly(work in 1u32..3_600, n in 0u32..4_000) {
            let mut engine = TimerEngine::new(TimerConfig {
                work_secs: work,
                ..TimerConfig::default()
            });
            engine.start();
            for _ in 0..n {
                engine.tick();
            }
            if n < work {
                prop_assert_eq!(engine.seconds_remaining(), work - n);
                prop_assert_eq!(engine.phase(), Phase::Work);
            } else {
                // Boundary crossed exactly once; the engine halted there.
                prop_assert_eq!(engine.completed_work_sessions(), 1);
                prop_assert!(!engine.is_running());
            }
        }

        /// Every k-th completed work session is followed by a long break,
        /// all others by a short break.
        #[test]
        fn cycle_law_holds_for_any_cadence(cadence in 1u32..8, rounds in 1u32..20) {
            let mut engine = TimerEngine::new(TimerConfig {
                work_secs: 3,
                short_break_secs: 1,
                long_break_secs: 2,
                sessions_before_long_break: cadence,
            });
            for completion in 1..=rounds {
                engine.start();
                let event = loop {
                    if let Some(event) = engine.tick() {
                        break event;
                    }
                };
                let expected = if completion % cadence == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
                match event {
                    Event::WorkCompleted { next_phase, .. } => {
                        prop_assert_eq!(next_phase, expected)
                    }
                    other => prop_assert!(false, "expected WorkCompleted, got {:?}", other),
                }
                engine.start();
                while engine.tick().is_none() {}
            }
        }
    }
}
