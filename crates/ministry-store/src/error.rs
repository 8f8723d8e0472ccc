//! Store error taxonomy
//!
//! Remote failures are reduced to an operation and a small set of kinds so
//! the console can render one short message per case. The transport detail
//! is kept for logs and never shown to the user.

use std::fmt;

/// Operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Fetch,
    Update,
    Delete,
    Create,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Create => "create",
        })
    }
}

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport failure, timeout or unexpected server response
    Network,
    /// Target record no longer exists
    NotFound,
    /// Record altered concurrently elsewhere
    Conflict,
    /// Session lacks permission
    Forbidden,
    /// Backend rejected the payload
    Invalid,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Network => "network",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::Invalid => "invalid",
        })
    }
}

/// Tagged store failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{op} failed ({kind}): {detail}")]
pub struct StoreError {
    pub op: StoreOp,
    pub kind: ErrorKind,
    /// Diagnostic detail, for logs only
    pub detail: String,
}

/// Listing failed
pub type FetchError = StoreError;
/// Status update rejected
pub type UpdateError = StoreError;
/// Deletion rejected
pub type DeleteError = StoreError;
/// Creation rejected
pub type CreateError = StoreError;

impl StoreError {
    #[inline]
    #[must_use]
    pub fn new(op: StoreOp, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            op,
            kind,
            detail: detail.into(),
        }
    }

    /// Check if retrying the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Network)
    }

    /// Short human-readable message for display next to the control
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match (self.op, self.kind) {
            (StoreOp::Fetch, ErrorKind::Forbidden) => "You are not allowed to view these records.",
            (StoreOp::Fetch, _) => "Could not load records. Showing the last loaded list.",
            (_, ErrorKind::NotFound) => "This record no longer exists. Refresh the list.",
            (_, ErrorKind::Conflict) => "This record was changed elsewhere. Refresh and try again.",
            (_, ErrorKind::Forbidden) => "You are not allowed to make this change.",
            (StoreOp::Create, ErrorKind::Invalid) => "The submission was rejected. Check the form.",
            (_, ErrorKind::Invalid) => "The change was rejected by the server.",
            (StoreOp::Update, ErrorKind::Network) => "Could not update the status. Try again.",
            (StoreOp::Delete, ErrorKind::Network) => "Could not delete the record. Try again.",
            (StoreOp::Create, ErrorKind::Network) => "Could not save the submission. Try again.",
        }
    }
}
