//! Canonical state names.
//!
//! State columns store plain strings. Callers may hand in anything that
//! dereferences to a string (literals, owned strings, or enums generated by
//! [`state_enum!`](crate::state_enum)), and every lookup goes through the
//! same normalization so the two forms compare equal.

/// Pattern entry matching any state, including an absent previous value.
pub const WILDCARD: &str = "*";

/// Convert caller input into the canonical stored form.
pub fn canonical(name: impl AsRef<str>) -> String {
    name.as_ref().trim().to_string()
}

/// Treat an empty or whitespace-only column value as blank.
///
/// Hosts report blank columns either as `None` or as an empty string;
/// both collapse to `None` here.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.map(canonical).filter(|v| !v.is_empty())
}

/// Render an optional state the way error messages interpolate it.
pub fn display_or_empty(value: Option<&str>) -> &str {
    value.unwrap_or("")
}
