//! Failure capture: the per-instance last-error slot.
//!
//! Engine failures never cross the embedding boundary as `Err` values.
//! Each one is classified into a [`Severity`] and parked in the
//! instance's [`FailureSink`] until the driver reads it. A later failure
//! overwrites an unread one.
//!
//! Classification depends on the size of the process group. A failure
//! raised by a single rank ([`EngineError::Aborted`]) leaves the other
//! ranks of a larger group stranded, so it is group-fatal there; in a
//! group of one nothing is stranded and it is recoverable.

use std::fmt;

use quark_core::EngineError;

/// How badly a captured failure affects the process group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The group is still in step; further calls may proceed.
    Recoverable,
    /// Some ranks may be blocked in a collective; the group cannot
    /// continue.
    GroupFatal,
}

impl Severity {
    /// Classify `error` for a group of `group_size` ranks.
    pub fn classify(error: &EngineError, group_size: usize) -> Self {
        if error.is_single_rank() && group_size > 1 {
            Self::GroupFatal
        } else {
            Self::Recoverable
        }
    }

    /// Numeric code used by the C interface: 1 recoverable, 2 fatal.
    pub fn code(self) -> i32 {
        match self {
            Self::Recoverable => 1,
            Self::GroupFatal => 2,
        }
    }
}

/// A captured failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    /// Classification at capture time.
    pub severity: Severity,
    /// Engine message.
    pub message: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Holds at most one pending [`Failure`].
#[derive(Debug, Default)]
pub struct FailureSink {
    pending: Option<Failure>,
}

impl FailureSink {
    /// Capture `error` raised in a group of `group_size` ranks,
    /// replacing any pending failure.
    pub fn report(&mut self, error: &EngineError, group_size: usize) {
        let severity = Severity::classify(error, group_size);
        tracing::debug!(?severity, message = error.message(), "failure captured");
        self.pending = Some(Failure {
            severity,
            message: error.message().to_string(),
        });
    }

    /// Record a recoverable condition detected by the boundary itself.
    pub fn report_recoverable(&mut self, message: impl Into<String>) {
        self.pending = Some(Failure {
            severity: Severity::Recoverable,
            message: message.into(),
        });
    }

    /// Whether a failure is waiting to be read.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending failure, left in place.
    pub fn peek(&self) -> Option<&Failure> {
        self.pending.as_ref()
    }

    /// Remove and return the pending failure.
    pub fn take(&mut self) -> Option<Failure> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collective_failure_is_recoverable() {
        let mut sink = FailureSink::default();
        sink.report(&EngineError::all("Unknown command: bogus"), 4);
        let failure = sink.take().unwrap();
        assert_eq!(failure.severity, Severity::Recoverable);
        assert_eq!(failure.message, "Unknown command: bogus");
    }

    #[test]
    fn single_rank_failure_depends_on_group_size() {
        let error = EngineError::one("Non-numeric atom coords - simulation unstable");
        assert_eq!(Severity::classify(&error, 1), Severity::Recoverable);
        assert_eq!(Severity::classify(&error, 2), Severity::GroupFatal);
    }

    #[test]
    fn later_failure_overwrites_earlier() {
        let mut sink = FailureSink::default();
        sink.report(&EngineError::all("first"), 1);
        sink.report_recoverable("second");
        assert_eq!(sink.peek().map(|f| f.message.as_str()), Some("second"));
    }

    #[test]
    fn take_clears_until_next_failure() {
        let mut sink = FailureSink::default();
        assert!(!sink.has_pending());
        sink.report(&EngineError::one("boom"), 3);
        assert!(sink.has_pending());
        assert_eq!(sink.take().map(|f| f.severity), Some(Severity::GroupFatal));
        assert!(!sink.has_pending());
        assert_eq!(sink.take(), None);
    }

    #[test]
    fn severity_codes() {
        assert_eq!(Severity::Recoverable.code(), 1);
        assert_eq!(Severity::GroupFatal.code(), 2);
    }
}
