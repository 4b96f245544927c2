//! Builder API for declaring states.
//!
//! A state is declared with a name and a [`StateOptions`] value collected
//! through a fluent builder. Options are applied in the order they were
//! added, which fixes the declaration order of the triggers they generate.

pub mod error;
pub mod macros;

pub use error::ConfigError;

use crate::core::{Action, Guard, Host};

/// One option attached to a state declaration.
pub enum StateOption<H> {
    /// Make this state the machine's initial state.
    Initial,
    /// Only allow entry when the previous value is one of these (or absent).
    From(Vec<String>),
    /// Additional predicates that must all pass.
    Guard(Vec<Guard<H>>),
    /// Error token reported when entry is refused.
    Message(String),
    /// Stamp the current time into the named attribute on entry.
    Timestamp(String),
    OnEnter(Vec<Action<H>>),
    OnEnterDeferred(Vec<Action<H>>),
    OnExit(Vec<Action<H>>),
    OnExitDeferred(Vec<Action<H>>),
}

/// Fluent collection of [`StateOption`]s.
///
/// # Example
///
/// ```rust
/// use statekeeper::builder::StateOptions;
/// use statekeeper::core::{Action, Guard, Host};
///
/// struct Doc;
/// impl Host for Doc {
///     fn current_value(&self, _c: &str) -> Option<String> { None }
///     fn previous_value(&self, _c: &str) -> Option<String> { None }
///     fn set_value(&mut self, _c: &str, _s: &str) {}
/// }
///
/// let options: StateOptions<Doc> = StateOptions::new()
///     .from(["draft", "review"])
///     .require(Guard::method("approved"))
///     .message("needs_approval")
///     .on_enter(Action::method("notify"));
///
/// assert_eq!(options.len(), 4);
/// ```
pub struct StateOptions<H> {
    options: Vec<StateOption<H>>,
}

impl<H: Host> StateOptions<H> {
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
        }
    }

    pub fn initial(mut self) -> Self {
        self.options.push(StateOption::Initial);
        self
    }

    pub fn from<I>(mut self, states: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let states = states.into_iter().map(crate::core::state::canonical).collect();
        self.options.push(StateOption::From(states));
        self
    }

    pub fn guard(mut self, guard: Guard<H>) -> Self {
        self.options.push(StateOption::Guard(vec![guard]));
        self
    }

    /// Alias of [`StateOptions::guard`].
    pub fn require(self, guard: Guard<H>) -> Self {
        self.guard(guard)
    }

    pub fn guards(mut self, guards: Vec<Guard<H>>) -> Self {
        self.options.push(StateOption::Guard(guards));
        self
    }

    pub fn message(mut self, token: impl Into<String>) -> Self {
        self.options.push(StateOption::Message(token.into()));
        self
    }

    pub fn timestamp(mut self, attribute: impl Into<String>) -> Self {
        self.options.push(StateOption::Timestamp(attribute.into()));
        self
    }

    pub fn on_enter(self, action: Action<H>) -> Self {
        self.on_enter_all(vec![action])
    }

    /// One entering trigger running every action in order.
    pub fn on_enter_all(mut self, actions: Vec<Action<H>>) -> Self {
        self.options.push(StateOption::OnEnter(actions));
        self
    }

    pub fn on_enter_deferred(self, action: Action<H>) -> Self {
        self.on_enter_deferred_all(vec![action])
    }

    pub fn on_enter_deferred_all(mut self, actions: Vec<Action<H>>) -> Self {
        self.options.push(StateOption::OnEnterDeferred(actions));
        self
    }

    pub fn on_exit(self, action: Action<H>) -> Self {
        self.on_exit_all(vec![action])
    }

    /// One leaving trigger running every action in order.
    pub fn on_exit_all(mut self, actions: Vec<Action<H>>) -> Self {
        self.options.push(StateOption::OnExit(actions));
        self
    }

    pub fn on_exit_deferred(self, action: Action<H>) -> Self {
        self.on_exit_deferred_all(vec![action])
    }

    pub fn on_exit_deferred_all(mut self, actions: Vec<Action<H>>) -> Self {
        self.options.push(StateOption::OnExitDeferred(actions));
        self
    }

    /// Append a raw option.
    pub fn option(mut self, option: StateOption<H>) -> Self {
        self.options.push(option);
        self
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub(crate) fn into_options(self) -> Vec<StateOption<H>> {
        self.options
    }
}

impl<H: Host> Default for StateOptions<H> {
    fn default() -> Self {
        Self::new()
    }
}
