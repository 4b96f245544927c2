//! Attribute change tracking for hosts.
//!
//! Keeps, per column, the current value, the value as of the last persist
//! (`was`) and the value before the last save. A host stores one
//! [`TrackedColumns`] and delegates the value half of [`Host`] to it.
//!
//! [`Host`]: crate::core::Host

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct TrackedValue {
    current: Option<String>,
    was: Option<String>,
    before_last_save: Option<String>,
}

/// One pending change of a column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub column: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Change-tracked string columns.
///
/// # Example
///
/// ```rust
/// use statekeeper::tracking::TrackedColumns;
///
/// let mut columns = TrackedColumns::new();
/// columns.set("account_state", "active");
/// columns.changes_applied();
///
/// columns.set("account_state", "inactive");
/// assert_eq!(columns.get("account_state"), Some("inactive"));
/// assert_eq!(columns.was("account_state"), Some("active"));
/// assert!(columns.changed("account_state"));
///
/// columns.changes_applied();
/// assert_eq!(columns.was("account_state"), Some("inactive"));
/// assert_eq!(columns.before_last_save("account_state"), Some("active"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedColumns {
    columns: BTreeMap<String, TrackedValue>,
}

impl TrackedColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column)?.current.as_deref()
    }

    /// Value as of the last persist.
    pub fn was(&self, column: &str) -> Option<&str> {
        self.columns.get(column)?.was.as_deref()
    }

    /// Value before the last persist.
    pub fn before_last_save(&self, column: &str) -> Option<&str> {
        self.columns.get(column)?.before_last_save.as_deref()
    }

    pub fn set(&mut self, column: &str, value: impl AsRef<str>) {
        self.entry(column).current = Some(value.as_ref().to_string());
    }

    pub fn clear(&mut self, column: &str) {
        self.entry(column).current = None;
    }

    /// Whether the column differs from its last persisted value. Setting a
    /// column back to that value clears the change.
    pub fn changed(&self, column: &str) -> bool {
        self.columns
            .get(column)
            .is_some_and(|v| v.current != v.was)
    }

    /// Pending changes in column-name order.
    pub fn changes(&self) -> Vec<Change> {
        self.columns
            .iter()
            .filter(|(_, v)| v.current != v.was)
            .map(|(column, v)| Change {
                column: column.clone(),
                from: v.was.clone(),
                to: v.current.clone(),
            })
            .collect()
    }

    /// Mark current values as persisted.
    pub fn changes_applied(&mut self) {
        for value in self.columns.values_mut() {
            value.before_last_save = value.was.take();
            value.was = value.current.clone();
        }
    }

    fn entry(&mut self, column: &str) -> &mut TrackedValue {
        self.columns.entry(column.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_columns_are_blank() {
        let columns = TrackedColumns::new();
        assert_eq!(columns.get("state"), None);
        assert_eq!(columns.was("state"), None);
        assert!(!columns.changed("state"));
    }

    #[test]
    fn setting_back_to_persisted_value_clears_change() {
        let mut columns = TrackedColumns::new();
        columns.set("state", "active");
        columns.changes_applied();

        columns.set("state", "inactive");
        assert!(columns.changed("state"));
        columns.set("state", "active");
        assert!(!columns.changed("state"));
        assert!(columns.changes().is_empty());
    }

    #[test]
    fn changes_lists_pending_transitions() {
        let mut columns = TrackedColumns::new();
        columns.set("b", "two");
        columns.set("a", "one");

        let changes = columns.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].column, "a");
        assert_eq!(changes[0].from, None);
        assert_eq!(changes[0].to.as_deref(), Some("one"));
    }

    #[test]
    fn changes_applied_shifts_history() {
        let mut columns = TrackedColumns::new();
        columns.set("state", "one");
        columns.changes_applied();
        assert_eq!(columns.before_last_save("state"), None);

        columns.set("state", "two");
        columns.changes_applied();
        assert_eq!(columns.before_last_save("state"), Some("one"));
        assert_eq!(columns.was("state"), Some("two"));

        columns.changes_applied();
        assert_eq!(columns.before_last_save("state"), Some("two"));
    }

    #[test]
    fn clear_blanks_current_value() {
        let mut columns = TrackedColumns::new();
        columns.set("state", "one");
        columns.clear("state");
        assert_eq!(columns.get("state"), None);
    }

    #[test]
    fn tracked_columns_serialize() {
        let mut columns = TrackedColumns::new();
        columns.set("state", "one");
        columns.changes_applied();
        columns.set("state", "two");

        let json = serde_json::to_string(&columns).unwrap();
        let restored: TrackedColumns = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, columns);
        assert!(restored.changed("state"));
    }
}
