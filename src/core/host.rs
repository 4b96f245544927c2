//! Contract between the engine and the object whose columns it governs.

use crate::core::action::BoxError;
use crate::lifecycle::FieldError;
use chrono::{DateTime, Utc};

/// An object carrying one or more state columns.
///
/// The engine never stores column values itself. It reads the current and
/// previous values through this trait, writes initial states back through
/// [`Host::set_value`], and resolves named-method guards and actions through
/// [`Host::call_guard`] and [`Host::call_action`].
///
/// [`TrackedColumns`](crate::tracking::TrackedColumns) implements the value
/// bookkeeping most hosts need, so an implementation is usually a handful of
/// one-line delegations. Hosts own their data (`'static`) because guards and
/// actions are stored in type-level registries.
pub trait Host: 'static {
    /// Value of the column right now. Blank columns may return `None` or `""`.
    fn current_value(&self, column: &str) -> Option<String>;

    /// Value of the column as of the start of the current validation cycle.
    fn previous_value(&self, column: &str) -> Option<String>;

    /// Value of the column before the last successful save.
    ///
    /// Defaults to [`Host::previous_value`] for hosts that do not track it.
    fn previous_persisted_value(&self, column: &str) -> Option<String> {
        self.previous_value(column)
    }

    /// Whether [`Host::previous_persisted_value`] is tracked by this host.
    ///
    /// When `false`, [`Lifecycle::save`](crate::lifecycle::Lifecycle::save)
    /// compares deferred triggers against the previous values it saw before
    /// validation.
    fn tracks_persisted_values() -> bool
    where
        Self: Sized,
    {
        false
    }

    fn set_value(&mut self, column: &str, state: &str);

    /// Receive a field-scoped validation error.
    fn report_error(&mut self, _error: &FieldError) {}

    /// Whether this host type runs a post-persistence hook.
    ///
    /// Consulted when a deferred trigger is declared; declaring one on a host
    /// that answers `false` is a configuration error.
    fn supports_post_persistence_hook() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Evaluate a named guard. `None` means no such method exists.
    fn call_guard(&self, _name: &str) -> Option<bool> {
        None
    }

    /// Invoke a named action. `None` means no such method exists.
    fn call_action(&mut self, _name: &str) -> Option<Result<(), BoxError>> {
        None
    }

    /// Write a timestamp into the named attribute (used by `timestamp` states).
    fn set_timestamp(&mut self, attribute: &str, _at: DateTime<Utc>) -> Result<(), BoxError> {
        Err(format!("host has no timestamp attribute '{attribute}'").into())
    }
}
