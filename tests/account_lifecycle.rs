//! End-to-end lifecycle scenarios on an account host.

use chrono::{DateTime, Utc};
use statekeeper::builder::StateOptions;
use statekeeper::core::{Action, BoxError, Guard, Host, WILDCARD};
use statekeeper::lifecycle::{FieldError, FieldErrorKind, HasStateMachines, MachineError};
use statekeeper::registry::MachineSet;
use statekeeper::state_enum;
use statekeeper::tracking::TrackedColumns;
use std::sync::OnceLock;

state_enum! {
    enum AccountState {
        Active = "active",
        Special = "special",
        Inactive = "inactive",
        Deleted = "deleted",
    }
}

const COLUMN: &str = "account_state";

#[derive(Default)]
struct Account {
    columns: TrackedColumns,
    deleted_at: Option<DateTime<Utc>>,
    undeleted: bool,
    allow_special: bool,
    trigger_called: bool,
    errors: Vec<FieldError>,
}

impl Host for Account {
    fn current_value(&self, column: &str) -> Option<String> {
        self.columns.get(column).map(String::from)
    }

    fn previous_value(&self, column: &str) -> Option<String> {
        self.columns.was(column).map(String::from)
    }

    fn previous_persisted_value(&self, column: &str) -> Option<String> {
        self.columns.before_last_save(column).map(String::from)
    }

    fn tracks_persisted_values() -> bool {
        true
    }

    fn set_value(&mut self, column: &str, state: &str) {
        self.columns.set(column, state);
    }

    fn report_error(&mut self, error: &FieldError) {
        self.errors.push(error.clone());
    }

    fn supports_post_persistence_hook() -> bool {
        true
    }

    fn call_guard(&self, name: &str) -> Option<bool> {
        match name {
            "allow_special" => Some(self.allow_special),
            _ => None,
        }
    }

    fn call_action(&mut self, name: &str) -> Option<Result<(), BoxError>> {
        match name {
            "call_trigger" => {
                self.trigger_called = true;
                Some(Ok(()))
            }
            _ => None,
        }
    }

    fn set_timestamp(&mut self, attribute: &str, at: DateTime<Utc>) -> Result<(), BoxError> {
        match attribute {
            "deleted_at" => {
                self.deleted_at = Some(at);
                Ok(())
            }
            other => Err(format!("unknown timestamp attribute {other}").into()),
        }
    }
}

fn account_machines() -> &'static MachineSet<Account> {
    static MACHINES: OnceLock<MachineSet<Account>> = OnceLock::new();
    MACHINES.get_or_init(|| {
        MachineSet::new("Account")
            .state_machine(COLUMN, |m| {
                m.declare_state(
                    AccountState::Active,
                    StateOptions::new().from([AccountState::Inactive, AccountState::Special]),
                )?
                .declare_state(
                    AccountState::Special,
                    StateOptions::new().require(Guard::method("allow_special")),
                )?
                .declare_state(
                    AccountState::Inactive,
                    StateOptions::new().from(["active", "deleted", "special"]),
                )?
                .declare_state(
                    AccountState::Deleted,
                    StateOptions::new()
                        .from(["active", "inactive"])
                        .timestamp("deleted_at"),
                )?;
                m.on(
                    [(AccountState::Deleted.name(), WILDCARD)],
                    vec![Action::infallible(|a: &mut Account| a.undeleted = true)],
                    false,
                )?;
                Ok(())
            })
            .expect("account machine is valid")
    })
}

fn child_machines() -> &'static MachineSet<Account> {
    static MACHINES: OnceLock<MachineSet<Account>> = OnceLock::new();
    MACHINES.get_or_init(|| {
        account_machines()
            .inherit("ChildAccount")
            .extend(COLUMN, |m| {
                m.on([(WILDCARD, WILDCARD)], vec![Action::method("call_trigger")], false)?;
                Ok(())
            })
            .expect("child machine is valid")
    })
}

impl HasStateMachines for Account {
    fn state_machines() -> &'static MachineSet<Self> {
        account_machines()
    }
}

fn persist(account: &mut Account) -> Result<(), BoxError> {
    account.columns.changes_applied();
    Ok(())
}

impl Account {
    fn state(&self) -> Option<&str> {
        self.columns.get(COLUMN)
    }

    fn set_state(&mut self, state: impl AsRef<str>) {
        self.columns.set(COLUMN, state);
    }

    fn valid(&mut self) -> bool {
        self.errors.clear();
        self.validate_states().unwrap().is_success()
    }

    fn fake_persist(&mut self) -> bool {
        self.errors.clear();
        self.save_states(persist).unwrap().is_success()
    }

    fn fake_persist_with(&mut self, machines: &MachineSet<Account>) -> bool {
        self.errors.clear();
        machines.lifecycle().save(self, persist).unwrap().is_success()
    }

    fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[test]
fn new_account_gets_initial_state() {
    let mut account = Account::default();
    assert!(account.fake_persist());
    assert_eq!(account.state(), Some("active"));
    assert_eq!(account.columns.was(COLUMN), Some("active"));
}

#[test]
fn change_tracking_follows_persists() {
    let mut account = Account::default();
    account.fake_persist();

    account.set_state("inactive");
    assert_eq!(account.state(), Some("inactive"));
    assert_eq!(account.columns.was(COLUMN), Some("active"));

    account.fake_persist();
    assert_eq!(account.state(), Some("inactive"));
    assert_eq!(account.columns.was(COLUMN), Some("inactive"));
}

#[test]
fn symbolic_and_string_states_are_equivalent() {
    let mut account = Account::default();
    account.set_state(AccountState::Inactive);
    assert!(account.valid(), "errors: {:?}", account.messages());

    let mut account = Account::default();
    account.set_state("inactive");
    assert!(account.valid(), "errors: {:?}", account.messages());
}

#[test]
fn unknown_state_is_always_invalid() {
    let mut account = Account::default();
    account.set_state("madeup");
    assert!(!account.valid());
    assert_eq!(account.messages(), ["account_state is not in a known state"]);
    assert_eq!(account.errors[0].kind, FieldErrorKind::InvalidState);

    account.allow_special = true;
    assert!(!account.valid());
}

#[test]
fn timestamp_and_exit_triggers() {
    let mut account = Account::default();
    account.fake_persist();
    assert_eq!(account.state(), Some("active"));
    assert!(account.deleted_at.is_none());
    assert!(!account.undeleted);

    account.set_state("deleted");
    assert!(account.fake_persist());
    assert!(account.deleted_at.is_some());
    assert!(!account.undeleted);

    account.set_state("inactive");
    assert!(account.fake_persist(), "errors: {:?}", account.messages());
    assert!(account.undeleted, "expecting undeleted to be set");
}

#[test]
fn transition_message_from_nothing() {
    let mut account = Account::default();
    account.set_state("special");
    assert!(!account.valid());
    assert_eq!(
        account.messages(),
        ["account_state has an invalid transition from '' to 'special'"]
    );
    assert_eq!(account.errors[0].token(), "invalid_transition");
}

#[test]
fn guards_gate_transitions() {
    let mut account = Account::default();
    account.set_state("deleted");
    assert!(account.fake_persist());

    account.set_state("active");
    assert!(!account.valid());
    assert!(account.messages()[0].contains("invalid transition"));

    account.set_state("inactive");
    assert!(account.valid(), "errors: {:?}", account.messages());

    account.set_state("special");
    assert!(!account.valid());
    assert!(account.messages()[0].contains("invalid transition"));

    account.allow_special = true;
    assert!(account.valid(), "errors: {:?}", account.messages());
}

#[test]
fn failed_validation_fires_nothing() {
    let mut account = Account::default();
    account.set_state("deleted");
    assert!(account.fake_persist());
    let stamped = account.deleted_at;

    account.set_state("special");
    assert!(!account.fake_persist());
    assert!(!account.undeleted);
    assert_eq!(account.deleted_at, stamped);
    assert_eq!(account.columns.was(COLUMN), Some("deleted"));
}

#[test]
fn allow_state_checks_guards_without_validating() {
    let mut account = Account::default();
    account.fake_persist();

    assert!(!account.allow_state(COLUMN, AccountState::Special).unwrap());
    account.allow_special = true;
    assert!(account.allow_state(COLUMN, "special").unwrap());
    assert!(!account.allow_state(COLUMN, "madeup").unwrap());

    let err = account.allow_state("nope", "active").unwrap_err();
    assert!(matches!(err, MachineError::Config(_)));
}

#[test]
fn extending_child_does_not_affect_parent() {
    assert_eq!(account_machines().get(COLUMN).unwrap().triggers().len(), 2);
    assert_eq!(child_machines().get(COLUMN).unwrap().triggers().len(), 3);
    assert_eq!(account_machines().get(COLUMN).unwrap().owner(), "Account");
    assert_eq!(child_machines().get(COLUMN).unwrap().owner(), "ChildAccount");

    let mut account = Account::default();
    account.set_state("inactive");
    assert!(account.fake_persist_with(account_machines()));
    assert!(!account.trigger_called);

    let mut account = Account::default();
    account.set_state("inactive");
    assert!(account.fake_persist_with(child_machines()));
    assert!(account.trigger_called);
}

#[test]
fn method_reference_trigger_fires() {
    let mut account = Account::default();
    assert!(!account.trigger_called);

    account.set_state("inactive");
    assert!(account.fake_persist_with(child_machines()));
    assert!(account.trigger_called);
}

#[test]
fn unresolved_method_trigger_is_config_error() {
    let machines = account_machines()
        .inherit("Broken")
        .extend(COLUMN, |m| {
            m.on([(WILDCARD, "inactive")], vec![Action::method("missing")], false)?;
            Ok(())
        })
        .unwrap();

    let mut account = Account::default();
    account.set_state("inactive");
    let err = machines.lifecycle().save(&mut account, persist).unwrap_err();
    assert!(matches!(err, MachineError::Config(_)));
    assert_eq!(account.columns.was(COLUMN), None);
}
