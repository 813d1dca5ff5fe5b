//! Error taxonomy for rule evaluation.

use thiserror::Error;

/// Errors raised while building or evaluating rules.
///
/// `Clone` so that every caller waiting on the same rule sees the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A rule's evaluation failed for a reason other than cancellation.
    #[error("rule '{rule}' failed: {message}")]
    Evaluation {
        /// Name of the failing rule.
        rule: String,
        /// What went wrong.
        message: String,
    },

    /// A predicate could not be evaluated.
    #[error("predicate error: {0}")]
    Predicate(String),

    /// A rule, predicate or bundle was built from invalid parts.
    #[error("invalid rule configuration: {0}")]
    Configuration(String),

    /// The evaluation was superseded. Never surfaced by the evaluation cache.
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EngineError {
    /// Whether this is the internal cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn evaluation_display() {
        let err = EngineError::Evaluation {
            rule: "age".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "rule 'age' failed: boom");
    }

    #[test]
    fn configuration_display() {
        let err = EngineError::Configuration("empty field list".into());
        assert_eq!(
            err.to_string(),
            "invalid rule configuration: empty field list"
        );
    }

    #[test]
    fn cancelled_is_detected() {
        assert!(EngineError::Cancelled.is_cancelled());
        assert!(!EngineError::Predicate("x".into()).is_cancelled());
    }

    #[test]
    fn clone_preserves_variant() {
        let err = EngineError::Predicate("bad regex".into());
        assert_matches!(err.clone(), EngineError::Predicate(msg) if msg == "bad regex");
    }
}
