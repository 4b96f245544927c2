//! Runtime and validation errors produced by the lifecycle passes.

use crate::builder::ConfigError;
use crate::core::state::display_or_empty;
use crate::core::BoxError;
use std::fmt;
use thiserror::Error;

/// Errors that abort a lifecycle cycle.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Trigger action on '{column}' failed: {source}")]
    ActionFailed {
        column: String,
        #[source]
        source: BoxError,
    },

    #[error("Persisting the host failed: {0}")]
    PersistFailed(#[source] BoxError),
}

/// What is wrong with a column's new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The value is not a declared state.
    InvalidState,
    /// The value is a declared state but entry was refused.
    InvalidTransition {
        message: String,
        from: Option<String>,
        to: String,
    },
}

/// Validation error scoped to one state column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub column: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn invalid_state(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: FieldErrorKind::InvalidState,
        }
    }

    pub fn invalid_transition(
        column: impl Into<String>,
        message: impl Into<String>,
        from: Option<&str>,
        to: &str,
    ) -> Self {
        Self {
            column: column.into(),
            kind: FieldErrorKind::InvalidTransition {
                message: message.into(),
                from: from.map(String::from),
                to: to.to_string(),
            },
        }
    }

    /// Error token: `invalid_state` or the state's configured message.
    pub fn token(&self) -> &str {
        match &self.kind {
            FieldErrorKind::InvalidState => "invalid_state",
            FieldErrorKind::InvalidTransition { message, .. } => message,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldErrorKind::InvalidState => {
                write!(f, "{} is not in a known state", self.column)
            }
            FieldErrorKind::InvalidTransition { from, to, .. } => write!(
                f,
                "{} has an invalid transition from '{}' to '{}'",
                self.column,
                display_or_empty(from.as_deref()),
                to
            ),
        }
    }
}

impl std::error::Error for FieldError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_message() {
        let err = FieldError::invalid_state("account_state");
        assert_eq!(err.to_string(), "account_state is not in a known state");
        assert_eq!(err.token(), "invalid_state");
    }

    #[test]
    fn invalid_transition_from_nothing_renders_empty() {
        let err = FieldError::invalid_transition("account_state", "invalid_transition", None, "special");
        assert_eq!(
            err.to_string(),
            "account_state has an invalid transition from '' to 'special'"
        );
    }

    #[test]
    fn invalid_transition_uses_configured_token() {
        let err = FieldError::invalid_transition("s", "needs_flag", Some("a"), "b");
        assert_eq!(err.token(), "needs_flag");
        assert_eq!(err.to_string(), "s has an invalid transition from 'a' to 'b'");
    }

    #[test]
    fn config_errors_convert() {
        let err: MachineError = ConfigError::UnknownMachine("x".into()).into();
        assert_eq!(err.to_string(), "Unknown state machine 'x'");
    }
}
