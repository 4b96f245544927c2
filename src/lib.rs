//! Statekeeper: per-column state machines evaluated in a host's save lifecycle.
//!
//! A host object declares one or more state columns. Each column is governed
//! by a [`Definition`](definition::Definition): the states it may hold, the
//! guards gating entry into each state, and the triggers fired when the
//! column changes. The engine runs as part of the host's lifecycle:
//!
//! - before validation it fills blank columns, collects field errors, and
//!   when there are none fires immediate triggers to a fixed point, letting
//!   a trigger on one column drive transitions on another;
//! - after the host is persisted it fires deferred triggers.
//!
//! # Core Concepts
//!
//! - **Host**: the object whose columns are governed ([`core::Host`])
//! - **Guards**: predicates gating entry into a state
//! - **Triggers**: pattern-matched action lists, immediate or deferred
//! - **MachineSet**: the per-type registry, forked on subtype extension
//!
//! # Example
//!
//! ```rust
//! use statekeeper::builder::StateOptions;
//! use statekeeper::core::{Action, Guard, Host};
//! use statekeeper::lifecycle::HasStateMachines;
//! use statekeeper::registry::MachineSet;
//! use statekeeper::tracking::TrackedColumns;
//! use std::sync::OnceLock;
//!
//! #[derive(Default)]
//! struct Ticket {
//!     columns: TrackedColumns,
//!     escalated: bool,
//! }
//!
//! impl Host for Ticket {
//!     fn current_value(&self, column: &str) -> Option<String> {
//!         self.columns.get(column).map(String::from)
//!     }
//!     fn previous_value(&self, column: &str) -> Option<String> {
//!         self.columns.was(column).map(String::from)
//!     }
//!     fn set_value(&mut self, column: &str, state: &str) {
//!         self.columns.set(column, state);
//!     }
//! }
//!
//! impl HasStateMachines for Ticket {
//!     fn state_machines() -> &'static MachineSet<Self> {
//!         static MACHINES: OnceLock<MachineSet<Ticket>> = OnceLock::new();
//!         MACHINES.get_or_init(|| {
//!             MachineSet::new("Ticket")
//!                 .state_machine("status", |m| {
//!                     m.declare_state("open", StateOptions::new())?
//!                         .declare_state(
//!                             "escalated",
//!                             StateOptions::new()
//!                                 .from(["open"])
//!                                 .on_enter(Action::infallible(|t: &mut Ticket| t.escalated = true)),
//!                         )?;
//!                     Ok(())
//!                 })
//!                 .expect("valid ticket machine")
//!         })
//!     }
//! }
//!
//! let mut ticket = Ticket::default();
//! assert!(ticket.validate_states()?.is_success());
//! assert_eq!(ticket.columns.get("status"), Some("open"));
//!
//! ticket.columns.changes_applied();
//! ticket.columns.set("status", "escalated");
//! assert!(ticket.validate_states()?.is_success());
//! assert!(ticket.escalated);
//! # Ok::<(), statekeeper::lifecycle::MachineError>(())
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod definition;
pub mod lifecycle;
pub mod registry;
pub mod tracking;

// Re-export commonly used types
pub use crate::builder::{ConfigError, StateOptions};
pub use crate::core::{Action, Guard, Host, WILDCARD};
pub use crate::definition::{Definition, Trigger, TriggerKind};
pub use crate::lifecycle::{FieldError, HasStateMachines, Lifecycle, MachineError, ValidationOutcome};
pub use crate::registry::MachineSet;
pub use crate::tracking::TrackedColumns;
