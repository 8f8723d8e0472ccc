//! Closed status enumerations

use crate::kind::RecordKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Review status of a partnership request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnershipStatus {
    /// Newly submitted, not yet looked at
    Pending,
    /// Picked up by a reviewer
    UnderReview,
    /// Accepted (terminal)
    Approved,
    /// Declined (terminal)
    Rejected,
}

impl PartnershipStatus {
    pub const ALL: [PartnershipStatus; 4] =
        [Self::Pending, Self::UnderReview, Self::Approved, Self::Rejected];

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Payment status of a donation, owned by the payment gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Success,
    Pending,
    Failed,
}

impl DonationStatus {
    pub const ALL: [DonationStatus; 3] = [Self::Success, Self::Pending, Self::Failed];

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Status of any workflow-capable record
///
/// Serializes as the bare identifier; parsing needs the record kind, see
/// [`Status::parse_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Status {
    Donation(DonationStatus),
    Partnership(PartnershipStatus),
}

impl Status {
    /// Wire/display identifier (`"under_review"`, `"success"`, ...)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Donation(s) => s.as_str(),
            Self::Partnership(s) => s.as_str(),
        }
    }

    /// Kind of record this status belongs to
    #[inline]
    #[must_use]
    pub fn kind(self) -> RecordKind {
        match self {
            Self::Donation(_) => RecordKind::Donation,
            Self::Partnership(_) => RecordKind::Partnership,
        }
    }

    /// Parse a status identifier in the vocabulary of `kind`
    ///
    /// Returns `None` for kinds without status and for unknown identifiers.
    #[must_use]
    pub fn parse_for(kind: RecordKind, value: &str) -> Option<Self> {
        match kind {
            RecordKind::Donation => DonationStatus::parse(value).map(Self::Donation),
            RecordKind::Partnership => PartnershipStatus::parse(value).map(Self::Partnership),
            RecordKind::Gallery => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PartnershipStatus> for Status {
    fn from(value: PartnershipStatus) -> Self {
        Self::Partnership(value)
    }
}

impl From<DonationStatus> for Status {
    fn from(value: DonationStatus) -> Self {
        Self::Donation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partnership_status_spellings() {
        assert_eq!(PartnershipStatus::parse("under_review"), Some(PartnershipStatus::UnderReview));
        assert_eq!(PartnershipStatus::parse("Under Review"), Some(PartnershipStatus::UnderReview));
        assert_eq!(PartnershipStatus::parse("archived"), None);
    }

    #[test]
    fn status_vocabulary_is_per_kind() {
        assert_eq!(
            Status::parse_for(RecordKind::Donation, "success"),
            Some(Status::Donation(DonationStatus::Success))
        );
        assert_eq!(Status::parse_for(RecordKind::Partnership, "success"), None);
        assert_eq!(Status::parse_for(RecordKind::Gallery, "pending"), None);
    }
}
