//! Core building blocks shared by definitions and the lifecycle passes.
//!
//! - The `Host` contract through which column values are read and written
//! - Guard predicates gating entry into a state
//! - Actions run when a trigger fires
//! - Canonical state-name handling

mod action;
mod guard;
mod host;
pub mod state;

pub use action::{Action, ActionFn, BoxError};
pub use guard::{Guard, Predicate};
pub use host::Host;
pub use state::WILDCARD;
