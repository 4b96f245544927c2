//! Lifecycle orchestration: the immediate pass run before validation and
//! the deferred pass run after the host is persisted.
//!
//! # Immediate pass
//!
//! 1. Blank columns receive their machine's initial state.
//! 2. Every changed column is checked: unknown values and refused
//!    transitions become [`FieldError`]s, all collected in one go.
//! 3. Only when no column failed, triggers are fired to a fixed point:
//!    up to one round per machine, stopping early once a round fires
//!    nothing new. A trigger fires at most once per cycle.
//! 4. Columns are checked again, so a trigger that moves another column
//!    into an unknown state or a refused transition fails the cycle.
//!
//! The round bound is not a convergence proof. A chain of cross-column
//! triggers longer than the number of machines leaves its tail unfired; the
//! pass logs a warning when the last round still fired something.
//!
//! # Deferred pass
//!
//! Compares each column's value before the last save (or, for hosts that do
//! not track it, the value seen before validation) with the persisted value
//! and fires matching deferred triggers, with bookkeeping separate from
//! the immediate pass. A deferred action that saves the host again starts a
//! nested pass with its own bookkeeping; the outer pass keeps iterating over
//! the values it observed, so the host must make sure the nested save leaves
//! `previous_persisted_value` equal to the current value.

mod error;

pub use error::{FieldError, FieldErrorKind, MachineError};

use crate::core::state::non_blank;
use crate::core::{BoxError, Host};
use crate::definition::{Definition, TriggerId};
use crate::registry::MachineSet;
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, trace, warn};

/// Outcome of a validation cycle: success, or every field error found.
pub type ValidationOutcome = Validation<(), NonEmptyVec<FieldError>>;

/// Triggers fired during one pass, per column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FiredTriggers {
    fired: HashMap<String, HashSet<TriggerId>>,
    order: Vec<TriggerId>,
}

impl FiredTriggers {
    pub fn contains(&self, column: &str, id: TriggerId) -> bool {
        self.fired.get(column).is_some_and(|ids| ids.contains(&id))
    }

    /// Triggers in the order they fired.
    pub fn order(&self) -> &[TriggerId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn record(&mut self, column: &str, id: TriggerId) {
        self.fired.entry(column.to_string()).or_default().insert(id);
        self.order.push(id);
    }
}

/// Drives the lifecycle passes for one registry.
pub struct Lifecycle<'a, H> {
    machines: &'a MachineSet<H>,
}

impl<'a, H: Host> Lifecycle<'a, H> {
    pub fn new(machines: &'a MachineSet<H>) -> Self {
        Self { machines }
    }

    /// Run the full immediate pass.
    ///
    /// Field errors are forwarded to [`Host::report_error`] and returned; no
    /// trigger fires when there is at least one. Errors introduced by
    /// triggers are reported the same way.
    pub fn before_validation(&self, host: &mut H) -> Result<ValidationOutcome, MachineError> {
        self.fill_initial_states(host);

        let outcome = match self.collect_errors(host)? {
            Validation::Success(_) => {
                self.run_triggers(host)?;
                // columns moved by triggers pass the same checks
                self.collect_errors(host)?
            }
            failure => {
                debug!("skipping state triggers, validation failed");
                failure
            }
        };
        if let Validation::Failure(errors) = &outcome {
            for error in errors.iter() {
                host.report_error(error);
            }
            debug!(errors = errors.len(), "state validation failed");
        }
        Ok(outcome)
    }

    /// Set every blank column to its machine's initial state.
    ///
    /// A machine without states has no initial state and leaves its column
    /// blank.
    pub fn fill_initial_states(&self, host: &mut H) {
        for definition in self.machines.iter() {
            if non_blank(host.current_value(definition.column())).is_some() {
                continue;
            }
            if let Some(initial) = definition.initial_state() {
                host.set_value(definition.column(), initial);
            }
        }
    }

    /// Check every changed column, accumulating all failures.
    pub fn collect_errors(&self, host: &H) -> Result<ValidationOutcome, MachineError> {
        let mut checks: Vec<ValidationOutcome> = Vec::new();
        for definition in self.machines.iter() {
            let check = match check_column(definition, host)? {
                Some(error) => Validation::fail(error),
                None => Validation::success(()),
            };
            checks.push(check);
        }
        Ok(Validation::all_vec(checks).map(|_| ()))
    }

    /// Fire immediate triggers until a round fires nothing new.
    pub fn run_triggers(&self, host: &mut H) -> Result<FiredTriggers, MachineError> {
        let mut fired = FiredTriggers::default();
        let rounds = self.machines.len();

        for round in 0..rounds {
            let before = fired.len();
            for definition in self.machines.iter() {
                let from = non_blank(host.previous_value(definition.column()));
                fire_matching(definition, host, &mut fired, from, false)?;
            }

            let new = fired.len() - before;
            trace!(round, fired = new, "state trigger round complete");
            if new == 0 {
                break;
            }
            if round + 1 == rounds {
                warn!(
                    rounds,
                    "state trigger rounds exhausted while triggers were still firing"
                );
            }
        }
        Ok(fired)
    }

    /// Validate, persist through `persist`, then run the deferred pass.
    ///
    /// `persist` is not called when validation fails. The deferred pass
    /// compares against [`Host::previous_persisted_value`] when the host
    /// tracks it, and otherwise against the previous values seen before
    /// validation started.
    pub fn save<F>(&self, host: &mut H, persist: F) -> Result<ValidationOutcome, MachineError>
    where
        F: FnOnce(&mut H) -> Result<(), BoxError>,
    {
        let before: Snapshot = self
            .machines
            .iter()
            .map(|d| (d.column().to_string(), non_blank(host.previous_value(d.column()))))
            .collect();

        let outcome = self.before_validation(host)?;
        if outcome.is_failure() {
            return Ok(outcome);
        }
        persist(host).map_err(MachineError::PersistFailed)?;
        self.deferred_pass(host, Some(&before))?;
        Ok(outcome)
    }

    /// Fire deferred triggers for every column that changed in the last save.
    ///
    /// Compares against [`Host::previous_persisted_value`].
    pub fn after_save(&self, host: &mut H) -> Result<FiredTriggers, MachineError> {
        self.deferred_pass(host, None)
    }

    fn deferred_pass(
        &self,
        host: &mut H,
        before: Option<&Snapshot>,
    ) -> Result<FiredTriggers, MachineError> {
        let mut fired = FiredTriggers::default();
        for definition in self.machines.iter() {
            let column = definition.column();
            let from = match before.and_then(|s| s.get(column)) {
                Some(value) if !H::tracks_persisted_values() => value.clone(),
                _ => non_blank(host.previous_persisted_value(column)),
            };
            fire_matching(definition, host, &mut fired, from, true)?;
        }
        Ok(fired)
    }
}

/// Previous value per column, taken before a validation cycle.
type Snapshot = HashMap<String, Option<String>>;

fn check_column<H: Host>(
    definition: &Definition<H>,
    host: &H,
) -> Result<Option<FieldError>, MachineError> {
    let column = definition.column();
    let from = non_blank(host.previous_value(column));
    let to = non_blank(host.current_value(column));
    if from == to {
        return Ok(None);
    }

    let Some(to) = to else {
        return Ok(Some(FieldError::invalid_state(column)));
    };
    if !definition.known(&to) {
        return Ok(Some(FieldError::invalid_state(column)));
    }
    if !definition.allow(host, &to)? {
        return Ok(Some(FieldError::invalid_transition(
            column,
            definition.message_for(&to),
            from.as_deref(),
            &to,
        )));
    }
    Ok(None)
}

fn fire_matching<H: Host>(
    definition: &Definition<H>,
    host: &mut H,
    fired: &mut FiredTriggers,
    from: Option<String>,
    deferred: bool,
) -> Result<(), MachineError> {
    let column = definition.column();
    let to = non_blank(host.current_value(column));
    if from == to {
        return Ok(());
    }

    for trigger in definition.triggers_matching(from.as_deref(), to.as_deref(), deferred) {
        if fired.contains(column, trigger.id()) {
            continue;
        }
        debug!(
            column,
            trigger = %trigger.id(),
            kind = ?trigger.kind(),
            from = ?from,
            to = ?to,
            deferred,
            "firing state trigger"
        );
        trigger.fire(host, column)?;
        fired.record(column, trigger.id());
    }
    Ok(())
}

/// Host type with a type-level registry of state machines.
///
/// Provides the per-instance entry points a host's own lifecycle calls.
pub trait HasStateMachines: Host + Sized {
    fn state_machines() -> &'static MachineSet<Self>;

    /// Whether this object may move `column` into `to` right now.
    fn allow_state(&self, column: &str, to: impl AsRef<str>) -> Result<bool, MachineError> {
        Ok(Self::state_machines().allow(self, column, to)?)
    }

    /// Run the immediate pass.
    fn validate_states(&mut self) -> Result<ValidationOutcome, MachineError> {
        Lifecycle::new(Self::state_machines()).before_validation(self)
    }

    /// Validate, persist through `persist`, then run the deferred pass.
    fn save_states<F>(&mut self, persist: F) -> Result<ValidationOutcome, MachineError>
    where
        F: FnOnce(&mut Self) -> Result<(), BoxError>,
    {
        Lifecycle::new(Self::state_machines()).save(self, persist)
    }
}

impl<H: Host> MachineSet<H> {
    pub fn lifecycle(&self) -> Lifecycle<'_, H> {
        Lifecycle::new(self)
    }
}
