//! Async wrapper around the timer engine.
//!
//! The engine is single-owner state; the service enforces that by keeping
//! it behind a mutex and funneling every mutation through its own methods.
//! The service also owns the one-second ticker task, republishes every
//! event on a broadcast channel, and hands completed sessions to the
//! recorder without ever letting persistence block a tick.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::Event;
use crate::notify::{Notifier, NotifyKind};
use crate::recorder::SessionRecorder;
use crate::session::CompletedSession;
use crate::storage::ConfigStore;
use crate::timer::{Phase, TimerConfig, TimerEngine};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct TimerService {
    engine: Mutex<TimerEngine>,
    events: broadcast::Sender<Event>,
    store: Arc<dyn ConfigStore>,
    recorder: Arc<dyn SessionRecorder>,
    notifier: Arc<dyn Notifier>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl TimerService {
    /// Build a service with the timer configuration read from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot produce a configuration.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        recorder: Arc<dyn SessionRecorder>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let config = store.load()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            engine: Mutex::new(TimerEngine::new(config)),
            events,
            store,
            recorder,
            notifier,
            ticker: Mutex::new(None),
        })
    }

    /// Subscribe to every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Controls ─────────────────────────────────────────────────────

    pub fn start(&self) -> Option<Event> {
        let event = self.engine().start();
        self.publish(event.as_ref());
        event
    }

    pub fn pause(&self) -> Option<Event> {
        let event = self.engine().pause();
        self.publish(event.as_ref());
        event
    }

    /// Force the transition to the next phase. Rings the notifier like a
    /// natural boundary, but no session is counted or recorded.
    pub fn skip(&self) -> Option<Event> {
        let event = self.engine().skip();
        if let Some(Event::TimerSkipped { from, .. }) = &event {
            self.notifier.notify(notify_kind(*from));
        }
        self.publish(event.as_ref());
        event
    }

    pub fn reset(&self) -> Event {
        let event = self.engine().reset();
        self.publish(Some(&event));
        event
    }

    /// Validate and apply a new configuration, persisting it to the store.
    /// The running countdown is untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` (prior config kept, nothing
    /// saved) or a store error.
    pub fn set_config(&self, config: TimerConfig) -> Result<Event> {
        let event = self.engine().set_config(config)?;
        self.store.save(&config)?;
        self.publish(Some(&event));
        Ok(event)
    }

    pub fn add_tag(&self, tag: &str) -> bool {
        self.engine().add_tag(tag)
    }

    pub fn remove_tag(&self, tag: &str) -> bool {
        self.engine().remove_tag(tag)
    }

    pub fn set_notes(&self, notes: impl Into<String>) {
        self.engine().set_notes(notes);
    }

    pub fn snapshot(&self) -> Event {
        self.engine().snapshot()
    }

    pub fn config(&self) -> TimerConfig {
        *self.engine().config()
    }

    // ── Ticking ──────────────────────────────────────────────────────

    /// Deliver one elapsed second. Handles the boundary side effects:
    /// notification, session recording, event publication.
    ///
    /// Called by the internal ticker; exposed so embedders and tests can
    /// drive time themselves.
    pub fn tick(&self) {
        let event = {
            let mut engine = self.engine();
            let was_running = engine.is_running();
            match engine.tick() {
                Some(event) => Some(event),
                None if was_running => {
                    self.publish(Some(&Event::Tick {
                        phase: engine.phase(),
                        seconds_remaining: engine.seconds_remaining(),
                        at: Utc::now(),
                    }));
                    None
                }
                None => None,
            }
        };

        if let Some(event) = event {
            match &event {
                Event::WorkCompleted { session, .. } => {
                    self.notifier.notify(NotifyKind::WorkComplete);
                    self.dispatch_record(session.clone());
                }
                Event::BreakCompleted { .. } => {
                    self.notifier.notify(NotifyKind::BreakComplete);
                }
                _ => {}
            }
            self.publish(Some(&event));
        }
    }

    /// Spawn the one-second ticker on the current runtime. Idempotent.
    pub fn run_ticker(self: &Arc<Self>) {
        let mut slot = self.ticker.lock().expect("ticker lock poisoned");
        if slot.is_some() {
            return;
        }
        let service = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval is immediate.
            interval.tick().await;
            loop {
                interval.tick().await;
                service.tick();
            }
        }));
    }

    /// Stop the ticker. The countdown state is left as-is.
    pub fn shutdown(&self) {
        if let Some(handle) = self.ticker.lock().expect("ticker lock poisoned").take() {
            handle.abort();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn engine(&self) -> std::sync::MutexGuard<'_, TimerEngine> {
        self.engine.lock().expect("engine lock poisoned")
    }

    fn publish(&self, event: Option<&Event>) {
        if let Some(event) = event {
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
    }

    /// Hand a session to the recorder without blocking the tick path.
    /// A failure is logged and republished; the phase transition that
    /// produced the session stands regardless.
    fn dispatch_record(&self, session: CompletedSession) {
        let recorder = Arc::clone(&self.recorder);
        let events = self.events.clone();
        tokio::spawn(async move {
            match recorder.record(&session).await {
                Ok(()) => debug!(session_id = %session.id, "session recorded"),
                Err(e) => {
                    warn!(session_id = %session.id, error = %e, "failed to record session");
                    let _ = events.send(Event::SessionRecordFailed {
                        session_id: session.id,
                        message: e.to_string(),
                        at: Utc::now(),
                    });
                }
            }
        });
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.lock().expect("ticker lock poisoned").take() {
            handle.abort();
        }
    }
}

fn notify_kind(finished: Phase) -> NotifyKind {
    match finished {
        Phase::Work => NotifyKind::WorkComplete,
        Phase::ShortBreak | Phase::LongBreak => NotifyKind::BreakComplete,
    }
}
