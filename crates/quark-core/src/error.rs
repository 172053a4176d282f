//! Engine error type.
//!
//! The engine distinguishes two ways a command can fail, mirroring how
//! a parallel program can fail: either every rank of the group detects
//! the same condition and stops together, or a single rank detects a
//! condition the others cannot see. The boundary layer classifies these
//! into failure severities; see the library's capture module.

use thiserror::Error;

/// Errors raised by engine collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A condition detected identically on every rank. The group stays
    /// in step and can continue with further commands.
    #[error("{message}")]
    Failed {
        /// Human-readable description.
        message: String,
    },
    /// A condition detected by one rank only. Any other rank may be
    /// waiting in a collective this rank will never enter.
    #[error("{message}")]
    Aborted {
        /// Human-readable description.
        message: String,
    },
}

impl EngineError {
    /// Failure raised collectively by all ranks.
    pub fn all(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Failure raised by the calling rank alone.
    pub fn one(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        match self {
            Self::Failed { message } | Self::Aborted { message } => message,
        }
    }

    /// Whether the failure was raised by a single rank.
    pub fn is_single_rank(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_bare_message() {
        let e = EngineError::all("Unknown command: frobnicate");
        assert_eq!(e.to_string(), "Unknown command: frobnicate");
        assert!(!e.is_single_rank());
    }

    #[test]
    fn one_is_single_rank() {
        let e = EngineError::one("Non-numeric atom coords");
        assert!(e.is_single_rank());
        assert_eq!(e.message(), "Non-numeric atom coords");
    }
}
