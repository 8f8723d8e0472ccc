//! Browser-level errors
//!
//! Every variant maps to a short message fit for the notice banner via
//! `user_message`.

use ministry_records::{FormError, RecordId, RecordKind, WorkflowError};
use ministry_store::{StoreError, UpdateError};

/// Status transition rejected locally or by the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Id not present in the loaded set
    #[error("record {0} is not loaded")]
    UnknownRecord(RecordId),

    /// Edge not in the workflow graph, or kind is read-only
    #[error(transparent)]
    Illegal(#[from] WorkflowError),

    /// A mutation on this record has not settled yet
    #[error("record {0} has a change in flight")]
    Busy(RecordId),

    /// Store refused or could not be reached; local state is unchanged
    #[error("store rejected the transition: {0}")]
    RemoteRejected(#[source] UpdateError),
}

impl TransitionError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownRecord(_) => "This record is no longer in the list.".to_string(),
            Self::Illegal(WorkflowError::ReadOnly { kind }) => {
                format!("The status of {kind} cannot be changed here.")
            }
            Self::Illegal(WorkflowError::IllegalTransition { from, to }) => {
                format!("A request that is {from} cannot be moved to {to}.")
            }
            Self::Illegal(_) => "That status change is not allowed.".to_string(),
            Self::Busy(_) => "A change to this record is already in progress.".to_string(),
            Self::RemoteRejected(e) => e.user_message().to_string(),
        }
    }
}

/// Delete or create rejected locally or by the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowserError {
    #[error("record {0} is not loaded")]
    UnknownRecord(RecordId),

    #[error("another change is already in progress")]
    Busy,

    /// Form failed local validation; nothing was sent
    #[error(transparent)]
    Form(#[from] FormError),

    /// Form belongs to a different browser
    #[error("cannot create {found} from the {expected} browser")]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },

    #[error(transparent)]
    Remote(#[from] StoreError),
}

impl BrowserError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownRecord(_) => "This record is no longer in the list.".to_string(),
            Self::Busy => "Please wait for the current change to finish.".to_string(),
            Self::Form(e) => e.to_string(),
            Self::KindMismatch { .. } => "This form cannot be submitted here.".to_string(),
            Self::Remote(e) => e.user_message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ministry_records::{PartnershipStatus, Status};
    use ministry_store::{ErrorKind, StoreOp};

    #[test]
    fn illegal_transition_message_names_both_statuses() {
        let err = TransitionError::from(WorkflowError::IllegalTransition {
            from: Status::Partnership(PartnershipStatus::Approved),
            to: Status::Partnership(PartnershipStatus::Pending),
        });
        let message = err.user_message();
        assert!(message.contains("approved"), "{message}");
        assert!(message.contains("pending"), "{message}");
    }

    #[test]
    fn remote_messages_come_from_the_store() {
        let store = StoreError::new(StoreOp::Update, ErrorKind::Conflict, "412");
        let err = TransitionError::RemoteRejected(store.clone());
        assert_eq!(err.user_message(), store.user_message());
        assert_eq!(BrowserError::from(store.clone()).user_message(), store.user_message());
    }
}
