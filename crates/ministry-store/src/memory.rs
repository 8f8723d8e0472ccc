//! In-process record store
//!
//! Behaves like the hosted backend (newest-first listing, id-keyed
//! mutations, not-found on stale ids) without a network. Faults can be
//! queued per operation to exercise the error paths of callers.

use crate::adapter::{sort_newest_first, Fetched, RecordStore};
use crate::error::{
    CreateError, DeleteError, ErrorKind, FetchError, StoreError, StoreOp, UpdateError,
};
use async_trait::async_trait;
use chrono::Utc;
use ministry_records::{NewRecord, Record, RecordId, RecordKind, Status};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<Record>,
    faults: HashMap<StoreOp, VecDeque<ErrorKind>>,
    calls: HashMap<StoreOp, usize>,
}

impl Inner {
    /// Count the call and pop a queued fault, if any
    fn enter(&mut self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.entry(op).or_default() += 1;
        match self.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(kind) => Err(StoreError::new(op, kind, "injected fault")),
            None => Ok(()),
        }
    }
}

/// Record store kept in memory
#[derive(Debug)]
pub struct MemoryStore {
    kind: RecordKind,
    latency: Option<Duration>,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new(kind: RecordKind) -> Self {
        Self::with_records(kind, Vec::new())
    }

    /// Store seeded with records (kept newest first)
    #[must_use]
    pub fn with_records(kind: RecordKind, mut records: Vec<Record>) -> Self {
        records.retain(|r| r.kind() == kind);
        sort_newest_first(&mut records);
        Self {
            kind,
            latency: None,
            inner: Mutex::new(Inner {
                records,
                ..Inner::default()
            }),
        }
    }

    /// Delay every operation by `latency`
    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call of `op` fail with `kind`
    pub fn fail_next(&self, op: StoreOp, kind: ErrorKind) {
        self.inner.lock().faults.entry(op).or_default().push_back(kind);
    }

    /// Number of calls made for `op`, failed ones included
    #[must_use]
    pub fn call_count(&self, op: StoreOp) -> usize {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Snapshot of the stored records
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.inner.lock().records.clone()
    }

    /// Simulate a change made by another session
    pub fn insert(&self, record: Record) {
        let mut inner = self.inner.lock();
        inner.records.push(record);
        sort_newest_first(&mut inner.records);
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn not_found(op: StoreOp, id: &RecordId) -> StoreError {
        StoreError::new(op, ErrorKind::NotFound, format!("no record with id {id}"))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    async fn fetch_all(&self) -> Result<Fetched, FetchError> {
        self.pause().await;
        let mut inner = self.inner.lock();
        inner.enter(StoreOp::Fetch)?;
        Ok(Fetched::complete(inner.records.clone()))
    }

    async fn update_status(&self, id: &RecordId, status: Status) -> Result<(), UpdateError> {
        self.pause().await;
        let mut inner = self.inner.lock();
        inner.enter(StoreOp::Update)?;
        let record = inner
            .records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| Self::not_found(StoreOp::Update, id))?;
        if !record.set_status(status) {
            return Err(StoreError::new(
                StoreOp::Update,
                ErrorKind::Invalid,
                format!("{status} is not a {} status", self.kind),
            ));
        }
        Ok(())
    }

    async fn remove(&self, id: &RecordId) -> Result<(), DeleteError> {
        self.pause().await;
        let mut inner = self.inner.lock();
        inner.enter(StoreOp::Delete)?;
        let pos = inner
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| Self::not_found(StoreOp::Delete, id))?;
        inner.records.remove(pos);
        Ok(())
    }

    async fn create(&self, new: NewRecord) -> Result<Record, CreateError> {
        self.pause().await;
        let mut inner = self.inner.lock();
        inner.enter(StoreOp::Create)?;
        if new.kind() != self.kind {
            return Err(StoreError::new(
                StoreOp::Create,
                ErrorKind::Invalid,
                format!("cannot create {} in {} collection", new.kind(), self.kind),
            ));
        }
        let body = new
            .to_body()
            .map_err(|e| StoreError::new(StoreOp::Create, ErrorKind::Invalid, e.to_string()))?;
        let record = Record::new(RecordId::generate(), Utc::now(), body);
        inner.records.insert(0, record.clone());
        Ok(record)
    }
}
