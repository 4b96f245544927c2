//! State machine definitions.
//!
//! A [`Definition`] governs one column of one host type: the states the
//! column may hold, the guards gating entry into each state, the error token
//! reported when entry is refused, and the triggers fired on transitions.

mod trigger;

pub use trigger::{Trigger, TriggerId, TriggerKind};

use crate::builder::{ConfigError, StateOption, StateOptions};
use crate::core::state::canonical;
use crate::core::{Action, Guard, Host, WILDCARD};
use chrono::Utc;
use std::fmt;

/// Error token used when a state declares no `message`.
pub const DEFAULT_MESSAGE: &str = "invalid_transition";

/// Guards and error token of one declared state.
pub struct StateSpec<H> {
    guards: Vec<Guard<H>>,
    message: String,
}

impl<H> StateSpec<H> {
    pub fn guards(&self) -> &[Guard<H>] {
        &self.guards
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<H> Clone for StateSpec<H> {
    fn clone(&self) -> Self {
        Self {
            guards: self.guards.clone(),
            message: self.message.clone(),
        }
    }
}

impl<H> fmt::Debug for StateSpec<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSpec")
            .field("guards", &self.guards)
            .field("message", &self.message)
            .finish()
    }
}

/// State machine for one column of a host type.
///
/// # Example
///
/// ```rust
/// use statekeeper::builder::StateOptions;
/// use statekeeper::core::Host;
/// use statekeeper::definition::Definition;
///
/// struct User;
/// impl Host for User {
///     fn current_value(&self, _c: &str) -> Option<String> { None }
///     fn previous_value(&self, _c: &str) -> Option<String> { None }
///     fn set_value(&mut self, _c: &str, _s: &str) {}
/// }
///
/// let mut machine = Definition::<User>::new("User", "state");
/// machine
///     .declare_state("awesome", StateOptions::new())?
///     .declare_state("fabulous", StateOptions::new().initial())?;
///
/// assert_eq!(machine.initial_state(), Some("fabulous"));
/// assert!(machine.known("awesome"));
/// assert!(!machine.allow(&User, "madeup")?);
/// # Ok::<(), statekeeper::builder::ConfigError>(())
/// ```
pub struct Definition<H> {
    owner: String,
    column: String,
    states: Vec<(String, StateSpec<H>)>,
    initial: Option<String>,
    triggers: Vec<Trigger<H>>,
}

impl<H: Host> Definition<H> {
    /// Create an empty definition for `column`, owned by the host type named `owner`.
    pub fn new(owner: impl Into<String>, column: impl AsRef<str>) -> Self {
        Self {
            owner: owner.into(),
            column: canonical(column),
            states: Vec::new(),
            initial: None,
            triggers: Vec::new(),
        }
    }

    /// Register a state, replacing any earlier declaration of the same name.
    ///
    /// Triggers generated by the options are appended in option order. The
    /// definition is left untouched when an option is rejected.
    pub fn declare_state(
        &mut self,
        name: impl AsRef<str>,
        options: StateOptions<H>,
    ) -> Result<&mut Self, ConfigError> {
        let name = canonical(name);
        let mut spec = StateSpec {
            guards: Vec::new(),
            message: DEFAULT_MESSAGE.to_string(),
        };
        let mut triggers = Vec::new();
        let mut initial = false;

        for option in options.into_options() {
            match option {
                StateOption::Initial => initial = true,
                StateOption::From(states) => {
                    spec.guards.push(Guard::from_states(&self.column, states));
                }
                StateOption::Guard(guards) => spec.guards.extend(guards),
                StateOption::Message(token) => spec.message = token,
                StateOption::Timestamp(attribute) => {
                    let stamp = Action::new(move |host: &mut H| {
                        host.set_timestamp(&attribute, Utc::now())
                    });
                    triggers.push(entering(&name, TriggerKind::Timestamp, false, vec![stamp])?);
                }
                StateOption::OnEnter(actions) => {
                    triggers.push(entering(&name, TriggerKind::OnEnter, false, actions)?);
                }
                StateOption::OnEnterDeferred(actions) => {
                    triggers.push(entering(&name, TriggerKind::OnEnter, true, actions)?);
                }
                StateOption::OnExit(actions) => {
                    triggers.push(leaving(&name, false, actions)?);
                }
                StateOption::OnExitDeferred(actions) => {
                    triggers.push(leaving(&name, true, actions)?);
                }
            }
        }

        for trigger in &triggers {
            self.check_deferred(trigger)?;
        }
        for trigger in triggers {
            self.push_trigger(trigger);
        }
        if initial {
            self.initial = Some(name.clone());
        }
        match self.states.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = spec,
            None => self.states.push((name, spec)),
        }
        Ok(self)
    }

    /// Declare generic triggers, one per `(from, to)` pair, sharing `actions`.
    ///
    /// Either side of a pair may be [`WILDCARD`].
    pub fn on<I, F, T>(
        &mut self,
        pairs: I,
        actions: Vec<Action<H>>,
        deferred: bool,
    ) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = (F, T)>,
        F: AsRef<str>,
        T: AsRef<str>,
    {
        let mut created = Vec::new();
        for (from, to) in pairs {
            let trigger = Trigger::new([from], [to], TriggerKind::Generic, deferred, actions.clone())?;
            self.check_deferred(&trigger)?;
            created.push(trigger);
        }
        for trigger in created {
            self.push_trigger(trigger);
        }
        Ok(self)
    }

    /// Append a pre-built trigger.
    pub fn add_trigger(&mut self, trigger: Trigger<H>) -> Result<&mut Self, ConfigError> {
        self.check_deferred(&trigger)?;
        self.push_trigger(trigger);
        Ok(self)
    }

    /// Whether `host` may enter `to`.
    ///
    /// Unknown states are never allowed. Otherwise every guard of the target
    /// state must pass; evaluation stops at the first refusal.
    pub fn allow(&self, host: &H, to: impl AsRef<str>) -> Result<bool, ConfigError> {
        let Some(spec) = self.state(to) else {
            return Ok(false);
        };
        for guard in &spec.guards {
            if !guard.check(host)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Triggers matching a transition, in declaration order.
    pub fn triggers_matching(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        deferred: bool,
    ) -> Vec<&Trigger<H>> {
        self.triggers
            .iter()
            .filter(|t| t.matches(from, to, deferred))
            .collect()
    }

    fn check_deferred(&self, trigger: &Trigger<H>) -> Result<(), ConfigError> {
        if trigger.deferred() && !H::supports_post_persistence_hook() {
            return Err(ConfigError::DeferredUnsupported {
                column: self.column.clone(),
            });
        }
        Ok(())
    }
}

impl<H> Definition<H> {
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Name of the host type that owns this definition.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Declared states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = (&str, &StateSpec<H>)> {
        self.states.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn state_names(&self) -> Vec<&str> {
        self.states.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn state(&self, name: impl AsRef<str>) -> Option<&StateSpec<H>> {
        let name = canonical(name);
        self.states
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn known(&self, name: impl AsRef<str>) -> bool {
        self.state(name).is_some()
    }

    /// State assigned to a blank column: the one marked initial, else the
    /// first declared. `None` when no state has been declared.
    pub fn initial_state(&self) -> Option<&str> {
        self.initial
            .as_deref()
            .or_else(|| self.states.first().map(|(name, _)| name.as_str()))
    }

    /// Error token for a refused transition into `to`.
    pub fn message_for(&self, to: impl AsRef<str>) -> &str {
        self.state(to).map_or(DEFAULT_MESSAGE, |spec| spec.message())
    }

    pub fn triggers(&self) -> &[Trigger<H>] {
        &self.triggers
    }

    /// Independent copy owned by another host type.
    ///
    /// States are deep-copied and every trigger is re-owned by the new
    /// owner, so mutating the copy never touches `self`.
    pub(crate) fn fork(&self, owner: &str) -> Self {
        let mut copy = self.clone();
        copy.owner = owner.to_string();
        for trigger in &mut copy.triggers {
            trigger.set_owner(owner);
        }
        copy
    }

    fn push_trigger(&mut self, mut trigger: Trigger<H>) {
        trigger.set_owner(&self.owner);
        self.triggers.push(trigger);
    }
}

fn entering<H: Host>(
    state: &str,
    kind: TriggerKind,
    deferred: bool,
    actions: Vec<Action<H>>,
) -> Result<Trigger<H>, ConfigError> {
    Trigger::new([WILDCARD], [state], kind, deferred, actions)
}

fn leaving<H: Host>(
    state: &str,
    deferred: bool,
    actions: Vec<Action<H>>,
) -> Result<Trigger<H>, ConfigError> {
    Trigger::new([state], [WILDCARD], TriggerKind::OnExit, deferred, actions)
}

impl<H> Clone for Definition<H> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            column: self.column.clone(),
            states: self.states.clone(),
            initial: self.initial.clone(),
            triggers: self.triggers.clone(),
        }
    }
}

impl<H> fmt::Debug for Definition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("owner", &self.owner)
            .field("column", &self.column)
            .field("states", &self.states)
            .field("initial", &self.initial)
            .field("triggers", &self.triggers)
            .finish()
    }
}
