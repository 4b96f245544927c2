//! Declarative state machine definitions loaded from JSON.
//!
//! Guards and actions named in a document are always host method
//! references. State option keys are matched explicitly so a misspelled key
//! fails instead of being ignored. Options of one state are applied in the
//! order they appear in the document.

use crate::builder::{ConfigError, StateOptions};
use crate::core::{Action, Guard, Host};
use crate::definition::Definition;
use crate::registry::MachineSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One or more names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Names {
    One(String),
    Many(Vec<String>),
}

impl Names {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Names::One(name) => vec![name.clone()],
            Names::Many(names) => names.clone(),
        }
    }
}

impl Default for Names {
    fn default() -> Self {
        Names::Many(Vec::new())
    }
}

/// A state and its raw options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    pub name: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerConfig {
    pub from: Names,
    pub to: Names,
    #[serde(default)]
    pub actions: Names,
    #[serde(default)]
    pub deferred: bool,
}

/// A whole state machine as data.
///
/// # Example
///
/// ```rust
/// use statekeeper::config::MachineConfig;
///
/// let config = MachineConfig::from_json(r#"{
///     "column": "account_state",
///     "states": [
///         { "name": "active", "from": ["inactive"] },
///         { "name": "inactive" }
///     ],
///     "triggers": [ { "from": "*", "to": "inactive", "actions": "notify" } ]
/// }"#)?;
///
/// assert_eq!(config.column, "account_state");
/// assert_eq!(config.states.len(), 2);
/// # Ok::<(), statekeeper::builder::ConfigError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    pub column: String,
    #[serde(default)]
    pub states: Vec<StateConfig>,
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply every state and trigger to `definition`.
    pub fn apply<H: Host>(&self, definition: &mut Definition<H>) -> Result<(), ConfigError> {
        for state in &self.states {
            definition.declare_state(&state.name, state_options(&state.options)?)?;
        }
        for trigger in &self.triggers {
            let actions = trigger.actions.to_vec().into_iter().map(Action::method).collect::<Vec<_>>();
            for from in trigger.from.to_vec() {
                for to in trigger.to.to_vec() {
                    definition.on([(from.as_str(), to.as_str())], actions.clone(), trigger.deferred)?;
                }
            }
        }
        Ok(())
    }
}

fn state_options<H: Host>(options: &Map<String, Value>) -> Result<StateOptions<H>, ConfigError> {
    let mut built = StateOptions::new();
    for (key, value) in options {
        built = match key.as_str() {
            "initial" => match value.as_bool() {
                Some(true) => built.initial(),
                Some(false) => built,
                None => return Err(invalid(key, "expected a boolean")),
            },
            "from" => built.from(names(key, value)?),
            "guard" | "require" => {
                built.guards(names(key, value)?.into_iter().map(Guard::method).collect())
            }
            "message" => built.message(string(key, value)?),
            "timestamp" => built.timestamp(string(key, value)?),
            "on_enter" => built.on_enter_all(methods(key, value)?),
            "on_enter_deferred" => built.on_enter_deferred_all(methods(key, value)?),
            "on_exit" => built.on_exit_all(methods(key, value)?),
            "on_exit_deferred" => built.on_exit_deferred_all(methods(key, value)?),
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        };
    }
    Ok(built)
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidOption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn string(key: &str, value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| invalid(key, "expected a string"))
}

fn names(key: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    serde_json::from_value::<Names>(value.clone())
        .map(|n| n.to_vec())
        .map_err(|_| invalid(key, "expected a string or a list of strings"))
}

fn methods<H: Host>(key: &str, value: &Value) -> Result<Vec<Action<H>>, ConfigError> {
    Ok(names(key, value)?.into_iter().map(Action::method).collect())
}

impl<H: Host> MachineSet<H> {
    /// Declare a state machine from a JSON document.
    pub fn load_json(self, json: &str) -> Result<Self, ConfigError> {
        let config = MachineConfig::from_json(json)?;
        self.state_machine(&config.column, |m| config.apply(m))
    }

    /// Extend an existing state machine from a JSON document.
    pub fn extend_json(self, json: &str) -> Result<Self, ConfigError> {
        let config = MachineConfig::from_json(json)?;
        self.extend(&config.column, |m| config.apply(m))
    }
}
