//! Side-effecting trigger actions.

use crate::builder::ConfigError;
use crate::core::host::Host;
use crate::lifecycle::MachineError;
use std::fmt;
use std::sync::Arc;

/// Error type returned by actions and persistence callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Closure form of an action.
pub type ActionFn<H> = Arc<dyn Fn(&mut H) -> Result<(), BoxError> + Send + Sync>;

/// One step run when a trigger fires.
///
/// Mirrors [`Guard`](crate::core::Guard): either a closure receiving the host
/// mutably, or the name of a host method dispatched through
/// [`Host::call_action`].
pub enum Action<H> {
    Callable(ActionFn<H>),
    Method(String),
}

impl<H: Host> Action<H> {
    /// Create an action from a fallible closure.
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&mut H) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Action::Callable(Arc::new(action))
    }

    /// Create an action from a closure that cannot fail.
    pub fn infallible<F>(action: F) -> Self
    where
        F: Fn(&mut H) + Send + Sync + 'static,
    {
        Action::new(move |host: &mut H| {
            action(host);
            Ok(())
        })
    }

    /// Create an action that calls a named method on the host.
    pub fn method(name: impl Into<String>) -> Self {
        Action::Method(name.into())
    }

    /// Run the action. `column` only labels the error.
    pub(crate) fn invoke(&self, host: &mut H, column: &str) -> Result<(), MachineError> {
        let result = match self {
            Action::Callable(action) => action(host),
            Action::Method(name) => host
                .call_action(name)
                .ok_or_else(|| ConfigError::UnresolvedAction { name: name.clone() })?,
        };
        result.map_err(|source| MachineError::ActionFailed {
            column: column.to_string(),
            source,
        })
    }
}

impl<H> Clone for Action<H> {
    fn clone(&self) -> Self {
        match self {
            Action::Callable(action) => Action::Callable(Arc::clone(action)),
            Action::Method(name) => Action::Method(name.clone()),
        }
    }
}

impl<H> fmt::Debug for Action<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Callable(_) => f.write_str("Action::Callable(..)"),
            Action::Method(name) => f.debug_tuple("Action::Method").field(name).finish(),
        }
    }
}
