//! Triggers: pattern-matched action lists fired on a transition.

use crate::builder::ConfigError;
use crate::core::state::canonical;
use crate::core::{Action, Host, WILDCARD};
use crate::lifecycle::MachineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a trigger.
///
/// Fired-trigger bookkeeping compares these ids, never the patterns, so two
/// triggers with identical patterns stay distinguishable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(Uuid);

impl TriggerId {
    fn new() -> Self {
        TriggerId(Uuid::new_v4())
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a trigger was declared. Matching ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Timestamp,
    OnEnter,
    OnExit,
    Generic,
}

/// One `from -> to` rule with the actions it runs.
pub struct Trigger<H> {
    id: TriggerId,
    owner: Option<String>,
    from: Vec<String>,
    to: Vec<String>,
    kind: TriggerKind,
    deferred: bool,
    actions: Vec<Action<H>>,
}

impl<H: Host> Trigger<H> {
    /// Create a trigger. Both pattern sets must be non-empty.
    pub fn new<F, T>(
        from: F,
        to: T,
        kind: TriggerKind,
        deferred: bool,
        actions: Vec<Action<H>>,
    ) -> Result<Self, ConfigError>
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let from: Vec<String> = from.into_iter().map(canonical).collect();
        let to: Vec<String> = to.into_iter().map(canonical).collect();
        if from.is_empty() || to.is_empty() {
            return Err(ConfigError::EmptyPattern {
                from: from.len(),
                to: to.len(),
            });
        }

        Ok(Self {
            id: TriggerId::new(),
            owner: None,
            from,
            to,
            kind,
            deferred,
            actions,
        })
    }

    /// Whether this trigger applies to a `from -> to` change.
    ///
    /// An absent `from` (a new object) only matches the wildcard.
    pub fn matches(&self, from: Option<&str>, to: Option<&str>, deferred: bool) -> bool {
        pattern_matches(&self.from, from)
            && pattern_matches(&self.to, to)
            && self.deferred == deferred
    }

    /// Run every action in order, stopping at the first error.
    pub(crate) fn fire(&self, host: &mut H, column: &str) -> Result<(), MachineError> {
        for action in &self.actions {
            action.invoke(host, column)?;
        }
        Ok(())
    }
}

impl<H> Trigger<H> {
    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// Host type owning the definition this trigger belongs to.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn from(&self) -> &[String] {
        &self.from
    }

    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    pub fn deferred(&self) -> bool {
        self.deferred
    }

    pub fn actions(&self) -> &[Action<H>] {
        &self.actions
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = Some(owner.to_string());
    }
}

fn pattern_matches(pattern: &[String], state: Option<&str>) -> bool {
    pattern
        .iter()
        .any(|p| p == WILDCARD || Some(p.as_str()) == state)
}

impl<H> Clone for Trigger<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            owner: self.owner.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            kind: self.kind,
            deferred: self.deferred,
            actions: self.actions.clone(),
        }
    }
}

impl<H> fmt::Debug for Trigger<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("kind", &self.kind)
            .field("deferred", &self.deferred)
            .field("actions", &self.actions)
            .finish()
    }
}
