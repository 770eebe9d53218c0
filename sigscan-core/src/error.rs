//! Evaluation errors.

use thiserror::Error;

pub use crate::params::ParamError;

/// Why an evaluation produced no result.
///
/// Every variant is terminal for that evaluation: the engine never returns a
/// partial signal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// A field the engine reads is NaN at `index` despite enough bars.
    #[error("{field} undefined at bar {index}")]
    IncompleteRow { index: usize, field: &'static str },
}

impl EvalError {
    /// True for errors meaning "cannot evaluate yet" rather than a fault.
    ///
    /// A NaN in the rows the engine reads is treated the same as a short
    /// series, so both variants qualify.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            EvalError::InsufficientHistory { .. } | EvalError::IncompleteRow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = EvalError::InsufficientHistory {
            required: 200,
            available: 199,
        };
        assert_eq!(e.to_string(), "insufficient history: need 200 bars, have 199");

        let e = EvalError::IncompleteRow {
            index: 5,
            field: "atr",
        };
        assert_eq!(e.to_string(), "atr undefined at bar 5");
        assert!(e.is_not_ready());
    }
}
