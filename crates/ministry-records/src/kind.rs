//! Record kinds and their per-kind browsing configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three collections browsed by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Donations recorded by the payment integration
    Donation,
    /// Partnership requests submitted through the public form
    Partnership,
    /// Gallery images uploaded by admins
    Gallery,
}

impl RecordKind {
    /// All kinds, in display order
    pub const ALL: [RecordKind; 3] = [Self::Donation, Self::Partnership, Self::Gallery];

    /// Plural label used in file names and logs
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Donation => "donations",
            Self::Partnership => "partnerships",
            Self::Gallery => "gallery",
        }
    }

    /// Whether records of this kind carry a status field
    #[inline]
    #[must_use]
    pub fn has_status(self) -> bool {
        !matches!(self, Self::Gallery)
    }

    /// Whether admins may change status locally
    ///
    /// Donation status is written by the payment gateway callback, so
    /// donations are browsable but never transitioned from here.
    #[inline]
    #[must_use]
    pub fn is_workflow(self) -> bool {
        matches!(self, Self::Partnership)
    }

    /// Fields matched by the free-text query
    #[must_use]
    pub fn search_fields(self) -> &'static [&'static str] {
        match self {
            Self::Donation => &["donor_name", "email", "reference", "purpose", "message"],
            Self::Partnership => &["full_name", "email", "church", "city", "message"],
            Self::Gallery => &["title", "description", "category"],
        }
    }

    /// Field matched by the category predicate, if the kind has one
    #[inline]
    #[must_use]
    pub fn category_field(self) -> Option<&'static str> {
        match self {
            Self::Donation => Some("purpose"),
            Self::Partnership => None,
            Self::Gallery => Some("category"),
        }
    }

    /// Default export columns as `(header, field)` pairs
    #[must_use]
    pub fn default_columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Donation => &[
                ("Date", "created_at"),
                ("Donor", "donor_name"),
                ("Email", "email"),
                ("Amount", "amount"),
                ("Currency", "currency"),
                ("Purpose", "purpose"),
                ("Reference", "reference"),
                ("Status", "status"),
            ],
            Self::Partnership => &[
                ("Date", "created_at"),
                ("Name", "full_name"),
                ("Email", "email"),
                ("Phone", "phone"),
                ("Church", "church"),
                ("City", "city"),
                ("Partnership", "partnership_types"),
                ("Pledge", "pledge_amount"),
                ("Frequency", "pledge_frequency"),
                ("Skills", "volunteer_skills"),
                ("Availability", "availability"),
                ("Status", "status"),
                ("Message", "message"),
            ],
            Self::Gallery => &[
                ("Date", "created_at"),
                ("Title", "title"),
                ("Category", "category"),
                ("Description", "description"),
                ("Image URL", "image_url"),
            ],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "donation" | "donations" => Ok(Self::Donation),
            "partnership" | "partnerships" | "partnership_request" | "partnership_requests" => {
                Ok(Self::Partnership)
            }
            "gallery" | "image" | "images" | "gallery_images" => Ok(Self::Gallery),
            other => Err(format!("unknown record kind: {other}")),
        }
    }
}
