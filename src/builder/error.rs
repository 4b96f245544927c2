//! Configuration errors raised while declaring or extending state machines.

use thiserror::Error;

/// Errors in how a state machine was configured.
///
/// These are raised at definition time, or at the first evaluation of a
/// named guard or action the host cannot resolve. They are never recovered
/// internally.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown state option '{0}'")]
    UnknownOption(String),

    #[error("Invalid value for state option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("Unknown state machine '{0}'")]
    UnknownMachine(String),

    #[error("State machine for '{0}' already exists")]
    DuplicateMachine(String),

    #[error("Deferred trigger on '{column}' requires a host with a post-persistence hook")]
    DeferredUnsupported { column: String },

    #[error("Trigger patterns must name at least one state (from: {from}, to: {to})")]
    EmptyPattern { from: usize, to: usize },

    #[error("Guard '{name}' is not a method on the host")]
    UnresolvedGuard { name: String },

    #[error("Action '{name}' is not a method on the host")]
    UnresolvedAction { name: String },

    #[error("Failed to parse state machine definition: {0}")]
    Parse(#[from] serde_json::Error),
}
