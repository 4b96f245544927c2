//! Per-type registry of state machines and subtype extension.
//!
//! A [`MachineSet`] is the map from column name to [`Definition`] belonging
//! to one host type. Subtypes start from [`MachineSet::inherit`], which shares
//! the parent's definitions; the first [`MachineSet::extend`] of an inherited
//! column forks that definition so the parent never observes the change.

use crate::builder::ConfigError;
use crate::core::state::canonical;
use crate::core::Host;
use crate::definition::Definition;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// State machines declared on one host type, in declaration order.
///
/// # Example
///
/// ```rust
/// use statekeeper::builder::StateOptions;
/// use statekeeper::core::Host;
/// use statekeeper::registry::MachineSet;
///
/// struct User;
/// impl Host for User {
///     fn current_value(&self, _c: &str) -> Option<String> { None }
///     fn previous_value(&self, _c: &str) -> Option<String> { None }
///     fn set_value(&mut self, _c: &str, _s: &str) {}
/// }
///
/// let base = MachineSet::<User>::new("User").state_machine("state", |m| {
///     m.declare_state("awesome", StateOptions::new())?
///         .declare_state("fabulous", StateOptions::new().initial())?;
///     Ok(())
/// })?;
///
/// let extended = base.inherit("ExtendedUser").extend("state", |m| {
///     m.declare_state("incredible", StateOptions::new().initial())?;
///     Ok(())
/// })?;
///
/// assert_eq!(base.get("state").unwrap().state_names().len(), 2);
/// assert_eq!(extended.get("state").unwrap().state_names().len(), 3);
/// assert_eq!(extended.get("state").unwrap().initial_state(), Some("incredible"));
/// # Ok::<(), statekeeper::builder::ConfigError>(())
/// ```
pub struct MachineSet<H> {
    owner: String,
    machines: Vec<Arc<Definition<H>>>,
}

impl<H: Host> MachineSet<H> {
    /// Empty registry for the host type named `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            machines: Vec::new(),
        }
    }

    /// Registry for a subtype, sharing every definition with `self` until
    /// the subtype extends it.
    pub fn inherit(&self, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            machines: self.machines.clone(),
        }
    }

    /// Declare a new state machine on `column`.
    pub fn state_machine<F>(mut self, column: impl AsRef<str>, configure: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&mut Definition<H>) -> Result<(), ConfigError>,
    {
        let column = canonical(column);
        if self.position(&column).is_some() {
            return Err(ConfigError::DuplicateMachine(column));
        }

        let mut definition = Definition::new(self.owner.clone(), &column);
        configure(&mut definition)?;
        self.machines.push(Arc::new(definition));
        Ok(self)
    }

    /// Apply further declarations to an existing machine.
    ///
    /// A definition inherited from an ancestor is forked first and the copy
    /// registered for this owner; a definition this owner already holds is
    /// mutated in place.
    pub fn extend<F>(mut self, column: impl AsRef<str>, configure: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&mut Definition<H>) -> Result<(), ConfigError>,
    {
        let column = canonical(column);
        let index = self
            .position(&column)
            .ok_or_else(|| ConfigError::UnknownMachine(column.clone()))?;

        let slot = &mut self.machines[index];
        if slot.owner() != self.owner {
            debug!(
                column = %column,
                from = %slot.owner(),
                to = %self.owner,
                "forking inherited state machine"
            );
            *slot = Arc::new(slot.fork(&self.owner));
        }
        configure(Arc::make_mut(slot))?;
        Ok(self)
    }

    /// Whether `host` may move `column` into `to`.
    pub fn allow(&self, host: &H, column: &str, to: impl AsRef<str>) -> Result<bool, ConfigError> {
        let definition = self
            .get(column)
            .ok_or_else(|| ConfigError::UnknownMachine(column.to_string()))?;
        definition.allow(host, to)
    }
}

impl<H> MachineSet<H> {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn get(&self, column: impl AsRef<str>) -> Option<&Definition<H>> {
        self.position(&canonical(column))
            .map(|index| self.machines[index].as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition<H>> {
        self.machines.iter().map(|d| d.as_ref())
    }

    pub fn columns(&self) -> Vec<&str> {
        self.iter().map(|d| d.column()).collect()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Whether two registries hold the very same definition for `column`.
    pub fn shares_definition(&self, other: &MachineSet<H>, column: &str) -> bool {
        match (self.position(column), other.position(column)) {
            (Some(a), Some(b)) => Arc::ptr_eq(&self.machines[a], &other.machines[b]),
            _ => false,
        }
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.machines.iter().position(|d| d.column() == column)
    }
}

impl<H> Clone for MachineSet<H> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            machines: self.machines.clone(),
        }
    }
}

impl<H> fmt::Debug for MachineSet<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineSet")
            .field("owner", &self.owner)
            .field("machines", &self.machines)
            .finish()
    }
}
