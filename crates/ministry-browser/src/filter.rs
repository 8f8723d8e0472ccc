//! Filter/search engine
//!
//! Pure and order-preserving: the visible subset is the input in input
//! order unless an explicit [`SortKey`] is requested. All matching goes
//! through [`select_indices`], so an index can be slotted in later without
//! touching callers.

use ministry_records::Record;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Categorical predicate: `"all"` or one exact value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Predicate {
    #[default]
    All,
    Equals(String),
}

impl Predicate {
    /// `""` and `"all"` (any case) mean no restriction
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Equals(trimmed.to_string())
        }
    }

    #[inline]
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// A record lacking the field never satisfies `Equals`
    #[inline]
    #[must_use]
    pub fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Equals(expected) => value == Some(expected.as_str()),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Equals(v) => f.write_str(v),
        }
    }
}

/// Explicit ordering of the visible subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Newest,
    Oldest,
    /// Case-insensitive by record title
    Title,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" | "new" | "desc" => Ok(Self::Newest),
            "oldest" | "old" | "asc" => Ok(Self::Oldest),
            "title" | "name" | "az" | "a-z" => Ok(Self::Title),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Current filter selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    /// Free-text query, matched case-insensitively as a substring
    pub query: String,
    pub category: Predicate,
    pub status: Predicate,
    pub sort: Option<SortKey>,
}

impl FilterSpec {
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Predicate) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: Predicate) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn sorted_by(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    /// Matches every record and keeps input order
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.query.trim().is_empty()
            && self.category.is_all()
            && self.status.is_all()
            && self.sort.is_none()
    }
}

fn needle(spec: &FilterSpec) -> String {
    spec.query.trim().to_lowercase()
}

fn matches_with(record: &Record, spec: &FilterSpec, needle: &str) -> bool {
    let status = record.status();
    if !spec.status.accepts(status.map(|s| s.as_str())) {
        return false;
    }
    if !spec.category.is_all() && !spec.category.accepts(record.category().as_deref()) {
        return false;
    }
    needle.is_empty()
        || record
            .kind()
            .search_fields()
            .iter()
            .filter_map(|field| record.field(field))
            .any(|value| value.to_lowercase().contains(needle))
}

/// Whether one record passes every active predicate
#[must_use]
pub fn matches(record: &Record, spec: &FilterSpec) -> bool {
    matches_with(record, spec, &needle(spec))
}

fn compare(a: &Record, b: &Record, key: SortKey) -> Ordering {
    match key {
        SortKey::Newest => b.created_at.cmp(&a.created_at),
        SortKey::Oldest => a.created_at.cmp(&b.created_at),
        SortKey::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
    }
}

/// Positions in `records` of the visible subset, in display order
///
/// O(n) without a sort key; explicit sorts are stable.
#[must_use]
pub fn select_indices(records: &[Record], spec: &FilterSpec) -> Vec<usize> {
    let needle = needle(spec);
    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| matches_with(r, spec, &needle))
        .map(|(i, _)| i)
        .collect();
    if let Some(key) = spec.sort {
        indices.sort_by(|&a, &b| compare(&records[a], &records[b], key));
    }
    indices
}

/// The visible subset, by value
#[must_use]
pub fn apply(records: &[Record], spec: &FilterSpec) -> Vec<Record> {
    select_indices(records, spec)
        .into_iter()
        .map(|i| records[i].clone())
        .collect()
}
