//! Transition notifications.
//!
//! A notifier fires on every phase boundary, natural or skipped. Failures
//! are swallowed inside the implementation: a broken bell must never
//! interrupt the timer.

use std::io::Write;

/// Which boundary was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    WorkComplete,
    BreakComplete,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotifyKind);
}

/// Discards every notification.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _kind: NotifyKind) {}
}

/// Rings the terminal bell and prints a one-line notice to stderr.
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn notify(&self, kind: NotifyKind) {
        let message = match kind {
            NotifyKind::WorkComplete => "Work session complete",
            NotifyKind::BreakComplete => "Break over",
        };
        let mut stderr = std::io::stderr();
        // A closed stderr is not the timer's problem.
        let _ = write!(stderr, "\x07");
        let _ = writeln!(stderr, "{message}");
    }
}
