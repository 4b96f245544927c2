//! Guard predicates gating entry into a state.
//!
//! A guard is either a closure over the host or the name of a predicate
//! method the host resolves through [`Host::call_guard`]. Nothing else can be
//! represented, so shape errors are ruled out at construction time; the only
//! guard failure left for evaluation time is a method name the host does not
//! know.

use crate::builder::ConfigError;
use crate::core::host::Host;
use crate::core::state::non_blank;
use std::fmt;
use std::sync::Arc;

/// Closure form of a guard.
pub type Predicate<H> = Arc<dyn Fn(&H) -> bool + Send + Sync>;

/// Predicate that decides whether a host may enter a state.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::{Guard, Host};
///
/// struct Flag {
///     allowed: bool,
/// }
///
/// impl Host for Flag {
///     fn current_value(&self, _column: &str) -> Option<String> { None }
///     fn previous_value(&self, _column: &str) -> Option<String> { None }
///     fn set_value(&mut self, _column: &str, _state: &str) {}
///     fn call_guard(&self, name: &str) -> Option<bool> {
///         (name == "allowed").then_some(self.allowed)
///     }
/// }
///
/// let closure = Guard::new(|f: &Flag| f.allowed);
/// let method = Guard::<Flag>::method("allowed");
///
/// let host = Flag { allowed: true };
/// assert!(closure.check(&host).unwrap());
/// assert!(method.check(&host).unwrap());
/// assert!(Guard::<Flag>::method("missing").check(&host).is_err());
/// ```
pub enum Guard<H> {
    Callable(Predicate<H>),
    Method(String),
}

impl<H: Host> Guard<H> {
    /// Create a guard from a predicate closure.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&H) -> bool + Send + Sync + 'static,
    {
        Guard::Callable(Arc::new(predicate))
    }

    /// Create a guard that calls a named predicate on the host.
    pub fn method(name: impl Into<String>) -> Self {
        Guard::Method(name.into())
    }

    /// Implicit guard produced by a `from` option.
    ///
    /// Passes when the column's previous value is one of `states`, or when
    /// there is no previous value at all (a new object enters from nothing).
    pub(crate) fn from_states(column: &str, states: Vec<String>) -> Self {
        let column = column.to_string();
        Guard::new(move |host: &H| match non_blank(host.previous_value(&column)) {
            None => true,
            Some(was) => states.iter().any(|s| *s == was),
        })
    }

    /// Evaluate the guard against a host.
    pub fn check(&self, host: &H) -> Result<bool, ConfigError> {
        match self {
            Guard::Callable(predicate) => Ok(predicate(host)),
            Guard::Method(name) => host
                .call_guard(name)
                .ok_or_else(|| ConfigError::UnresolvedGuard { name: name.clone() }),
        }
    }
}

impl<H> Clone for Guard<H> {
    fn clone(&self) -> Self {
        match self {
            Guard::Callable(predicate) => Guard::Callable(Arc::clone(predicate)),
            Guard::Method(name) => Guard::Method(name.clone()),
        }
    }
}

impl<H> fmt::Debug for Guard<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Callable(_) => f.write_str("Guard::Callable(..)"),
            Guard::Method(name) => f.debug_tuple("Guard::Method").field(name).finish(),
        }
    }
}
