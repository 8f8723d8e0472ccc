//! Review workflow graph
//!
//! Every legal status edge lives in [`StatusGraph::successors`]; nothing
//! else in the workspace compares status values to decide what is allowed.

use crate::error::WorkflowError;
use crate::status::{DonationStatus, PartnershipStatus, Status};

/// A status enumeration with a fixed directed transition graph
pub trait StatusGraph: Copy + Eq + Into<Status> + 'static {
    /// States reachable from `self` in one step
    fn successors(self) -> &'static [Self];

    /// No outgoing edges
    #[inline]
    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    #[inline]
    fn can_transition_to(self, to: Self) -> bool {
        self.successors().contains(&to)
    }
}

impl StatusGraph for PartnershipStatus {
    fn successors(self) -> &'static [Self] {
        use PartnershipStatus::*;
        match self {
            Pending => &[UnderReview, Approved, Rejected],
            UnderReview => &[Approved, Rejected],
            Approved | Rejected => &[],
        }
    }
}

impl StatusGraph for DonationStatus {
    fn successors(self) -> &'static [Self] {
        &[]
    }
}

/// Validates a single edge of a status graph
pub fn validate_transition<S: StatusGraph>(from: S, to: S) -> Result<(), WorkflowError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(WorkflowError::IllegalTransition {
            from: from.into(),
            to: to.into(),
        })
    }
}

/// Validates a status change requested by an admin
///
/// Donation statuses are externally owned and always rejected with
/// [`WorkflowError::ReadOnly`]; mixing vocabularies is rejected with
/// [`WorkflowError::KindMismatch`].
pub fn validate_status_change(from: Status, to: Status) -> Result<(), WorkflowError> {
    match (from, to) {
        (Status::Partnership(from), Status::Partnership(to)) => validate_transition(from, to),
        (Status::Donation(_), Status::Donation(_)) => Err(WorkflowError::ReadOnly {
            kind: from.kind(),
        }),
        _ => Err(WorkflowError::KindMismatch {
            expected: from.kind(),
            found: to.kind(),
        }),
    }
}
