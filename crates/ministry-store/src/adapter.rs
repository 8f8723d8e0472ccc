//! The record store contract

use crate::error::{CreateError, DeleteError, FetchError, UpdateError};
use async_trait::async_trait;
use ministry_records::{NewRecord, Record, RecordId, RecordKind, Status};

/// Result of listing a collection
///
/// `skipped` counts rows the backend returned that could not be read as
/// records; they are left out of `records`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetched {
    pub records: Vec<Record>,
    pub skipped: usize,
}

impl Fetched {
    /// Every row was readable
    #[must_use]
    pub fn complete(records: Vec<Record>) -> Self {
        Self {
            records,
            skipped: 0,
        }
    }
}

/// One remote collection of records
///
/// All mutating operations are keyed by id and never need the full record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Kind of record held by this collection
    fn kind(&self) -> RecordKind;

    /// All records, newest first by `created_at`
    async fn fetch_all(&self) -> Result<Fetched, FetchError>;

    /// Set the status of one record
    async fn update_status(&self, id: &RecordId, status: Status) -> Result<(), UpdateError>;

    /// Delete one record
    async fn remove(&self, id: &RecordId) -> Result<(), DeleteError>;

    /// Insert a record built from a validated form
    async fn create(&self, new: NewRecord) -> Result<Record, CreateError>;
}

/// Restore newest-first order when a backend returned rows unordered
///
/// Stable, so rows sharing a timestamp keep their received order.
/// Returns `true` if the rows had to be reordered.
pub fn sort_newest_first(records: &mut [Record]) -> bool {
    let ordered = records
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at);
    if !ordered {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
    !ordered
}
