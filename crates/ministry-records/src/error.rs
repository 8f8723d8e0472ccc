//! Error types for record handling
//!
//! - Workflow violations (illegal or read-only status changes)
//! - Payload normalization failures (malformed rows from the store)
//! - Form validation failures (creation forms)

use crate::kind::RecordKind;
use crate::status::Status;

/// Status change rejected before reaching the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// Edge not present in the status graph
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: Status, to: Status },

    /// Kind has no locally driven workflow
    #[error("{kind} status is read-only")]
    ReadOnly { kind: RecordKind },

    /// Target status belongs to another kind's vocabulary
    #[error("status vocabulary mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },

    /// Record kind has no status field at all
    #[error("{kind} records have no status")]
    NoStatus { kind: RecordKind },
}

/// Raw row could not be normalized into a [`Record`](crate::Record)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Row is not a JSON object of the expected shape
    #[error("malformed {kind} row: {reason}")]
    Malformed { kind: RecordKind, reason: String },

    /// Required field absent or empty
    #[error("{kind} row is missing required field `{field}`")]
    MissingField {
        kind: RecordKind,
        field: &'static str,
    },

    /// Field present but not interpretable
    #[error("{kind} row has invalid `{field}`: {value}")]
    InvalidValue {
        kind: RecordKind,
        field: &'static str,
        value: String,
    },
}

/// Creation form rejected before submission
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// Required input left blank
    #[error("{0} is required")]
    Required(&'static str),

    /// Email address not plausible
    #[error("enter a valid email address")]
    InvalidEmail,

    /// Amount not a positive decimal
    #[error("enter a valid amount")]
    InvalidAmount,

    /// URL not http(s)
    #[error("image URL must start with http:// or https://")]
    InvalidUrl,

    /// Partnership form submitted with no partnership kind ticked
    #[error("select at least one way to partner")]
    NoPartnershipKind,
}
