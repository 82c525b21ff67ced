//! Engine error types

use thiserror::Error;

use crate::phase::{Phase, Status};

/// Errors reported by the timer engine.
///
/// Both variants are recoverable and leave the engine untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{phase} duration must be between 1 and {max} minutes, got {minutes}")]
    InvalidDuration { phase: Phase, minutes: u32, max: u32 },

    #[error("cannot {operation} while {status}")]
    InvalidTransition {
        operation: &'static str,
        status: Status,
    },
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::InvalidDuration {
            phase: Phase::Break,
            minutes: 45,
            max: 30,
        };
        assert_eq!(
            err.to_string(),
            "break duration must be between 1 and 30 minutes, got 45"
        );

        let err = EngineError::InvalidTransition {
            operation: "pause",
            status: Status::Idle,
        };
        assert_eq!(err.to_string(), "cannot pause while idle");
    }
}
