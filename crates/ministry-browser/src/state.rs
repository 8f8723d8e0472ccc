//! Reducer-style state container
//!
//! All browser state lives in one [`BrowserState`] and changes only through
//! [`BrowserState::update`]. Derived views (visible subset, focus, stats)
//! are recomputed inside the reducer so they can never disagree with the
//! loaded records.
//!
//! Fetches carry a monotonically increasing sequence number. A result is
//! applied only when its sequence is newer than the last applied one, so a
//! slow early response cannot overwrite a faster later one.

use crate::export::{export_table, ColumnSpec};
use crate::filter::{select_indices, FilterSpec};
use crate::navigator::{Navigator, ScrollLock};
use crate::stats::{summarize, Stats};
use ministry_records::{Record, RecordId, RecordKind, Status};
use ministry_store::FetchError;
use std::collections::HashSet;
use tracing::debug;

/// Severity of a [`Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-visible banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Overlay focus change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusMove {
    Open(RecordId),
    Close,
    Next,
    Previous,
}

/// Every state change the browser knows about
#[derive(Debug, Clone)]
pub enum Action {
    FetchStarted { seq: u64 },
    /// `skipped` rows came back but could not be read
    FetchSucceeded {
        seq: u64,
        records: Vec<Record>,
        skipped: usize,
    },
    FetchFailed { seq: u64, error: FetchError },
    FilterChanged(FilterSpec),
    FocusChanged(FocusMove),
    /// Mark a record busy until its mutation settles
    MutationStarted { id: RecordId },
    TransitionSucceeded { id: RecordId, status: Status },
    TransitionFailed { id: RecordId, message: String },
    DeleteSucceeded { id: RecordId },
    DeleteFailed { id: RecordId, message: String },
    /// The call was dropped before the store answered
    MutationAbandoned { id: RecordId },
    CreateStarted,
    CreateSucceeded(Record),
    CreateFailed { message: String },
    CreateAbandoned,
    /// Rejected before reaching the store; nothing was in flight
    Rejected { message: String },
    NoticeDismissed,
}

/// Single source of truth for one browser
#[derive(Debug)]
pub struct BrowserState {
    kind: RecordKind,
    records: Vec<Record>,
    filter: FilterSpec,
    visible: Vec<usize>,
    visible_ids: Vec<RecordId>,
    navigator: Navigator,
    issued_seq: u64,
    applied_seq: u64,
    settled_seq: u64,
    loaded: bool,
    in_flight: HashSet<RecordId>,
    creating: bool,
    notice: Option<Notice>,
}

impl BrowserState {
    #[must_use]
    pub fn new(kind: RecordKind, scroll: ScrollLock) -> Self {
        Self {
            kind,
            records: Vec::new(),
            filter: FilterSpec::default(),
            visible: Vec::new(),
            visible_ids: Vec::new(),
            navigator: Navigator::new(scroll),
            issued_seq: 0,
            applied_seq: 0,
            settled_seq: 0,
            loaded: false,
            in_flight: HashSet::new(),
            creating: false,
            notice: None,
        }
    }

    /// Sequence number for the next fetch
    #[inline]
    #[must_use]
    pub fn next_fetch_seq(&self) -> u64 {
        self.issued_seq + 1
    }

    pub fn update(&mut self, action: Action) {
        match action {
            Action::FetchStarted { seq } => {
                self.issued_seq = self.issued_seq.max(seq);
            }
            Action::FetchSucceeded {
                seq,
                records,
                skipped,
            } => {
                self.settled_seq = self.settled_seq.max(seq);
                if seq <= self.applied_seq {
                    debug!(seq, applied = self.applied_seq, "discarding stale fetch result");
                    return;
                }
                self.applied_seq = seq;
                self.loaded = true;
                self.records = records;
                if skipped > 0 {
                    self.notice = Some(Notice::info(format!(
                        "{skipped} record(s) could not be read and are not shown."
                    )));
                }
                self.refresh_visible();
            }
            Action::FetchFailed { seq, error } => {
                self.settled_seq = self.settled_seq.max(seq);
                if seq <= self.applied_seq {
                    debug!(seq, applied = self.applied_seq, "ignoring stale fetch failure");
                    return;
                }
                self.notice = Some(Notice::error(error.user_message()));
            }
            Action::FilterChanged(spec) => {
                self.filter = spec;
                self.refresh_visible();
            }
            Action::FocusChanged(focus) => match focus {
                FocusMove::Open(id) => {
                    self.navigator.open(&id, &self.visible_ids);
                }
                FocusMove::Close => self.navigator.close(),
                FocusMove::Next => {
                    self.navigator.next(&self.visible_ids);
                }
                FocusMove::Previous => {
                    self.navigator.previous(&self.visible_ids);
                }
            },
            Action::MutationStarted { id } => {
                self.in_flight.insert(id);
            }
            Action::TransitionSucceeded { id, status } => {
                self.in_flight.remove(&id);
                if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
                    record.set_status(status);
                }
                self.notice = Some(Notice::info(format!("Status updated to {status}.")));
                self.refresh_visible();
            }
            Action::DeleteSucceeded { id } => {
                self.in_flight.remove(&id);
                self.records.retain(|r| r.id != id);
                self.notice = Some(Notice::info("Record deleted."));
                self.refresh_visible();
            }
            Action::TransitionFailed { id, message } | Action::DeleteFailed { id, message } => {
                self.in_flight.remove(&id);
                self.notice = Some(Notice::error(message));
            }
            Action::MutationAbandoned { id } => {
                self.in_flight.remove(&id);
            }
            Action::CreateStarted => self.creating = true,
            Action::CreateSucceeded(record) => {
                self.creating = false;
                if !self.records.iter().any(|r| r.id == record.id) {
                    self.records.insert(0, record);
                }
                self.notice = Some(Notice::info("Record added."));
                self.refresh_visible();
            }
            Action::CreateFailed { message } => {
                self.creating = false;
                self.notice = Some(Notice::error(message));
            }
            Action::CreateAbandoned => self.creating = false,
            Action::Rejected { message } => {
                self.notice = Some(Notice::error(message));
            }
            Action::NoticeDismissed => self.notice = None,
        }
    }

    fn refresh_visible(&mut self) {
        self.visible = if self.filter.is_identity() {
            (0..self.records.len()).collect()
        } else {
            select_indices(&self.records, &self.filter)
        };
        self.visible_ids = self
            .visible
            .iter()
            .map(|&i| self.records[i].id.clone())
            .collect();
        if self.navigator.reconcile(&self.visible_ids) {
            debug!("focused record left the visible set; overlay closed");
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Full loaded set, newest first as delivered by the store
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    #[inline]
    #[must_use]
    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn visible(&self) -> impl Iterator<Item = &Record> + '_ {
        self.visible.iter().map(|&i| &self.records[i])
    }

    #[inline]
    #[must_use]
    pub fn visible_ids(&self) -> &[RecordId] {
        &self.visible_ids
    }

    #[must_use]
    pub fn focused(&self) -> Option<&Record> {
        self.navigator.focused().and_then(|id| self.record(id))
    }

    /// Newest issued fetch has not settled
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.issued_seq > self.settled_seq
    }

    /// At least one fetch result has been applied
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    #[must_use]
    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    #[inline]
    #[must_use]
    pub fn is_busy(&self, id: &RecordId) -> bool {
        self.in_flight.contains(id)
    }

    #[must_use]
    pub fn busy_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.in_flight.iter().cloned().collect();
        ids.sort();
        ids
    }

    #[inline]
    #[must_use]
    pub fn is_creating(&self) -> bool {
        self.creating
    }

    #[inline]
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Stats over the full loaded set
    #[must_use]
    pub fn stats(&self) -> Stats {
        summarize(&self.records)
    }

    /// CSV of the visible subset in display order
    #[must_use]
    pub fn export_visible(&self, columns: &[ColumnSpec]) -> String {
        export_table(self.visible(), columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Predicate;
    use chrono::{TimeZone, Utc};
    use ministry_records::{PartnershipRequest, PartnershipStatus, RecordBody};
    use ministry_store::{ErrorKind, StoreError, StoreOp};

    fn request(id: &str, name: &str, status: PartnershipStatus) -> Record {
        Record::new(
            RecordId::new(id),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            RecordBody::Partnership(PartnershipRequest {
                full_name: name.to_string(),
                email: format!("{id}@example.org"),
                phone: None,
                church: None,
                city: None,
                kinds: Vec::new(),
                financial: None,
                volunteer: None,
                message: None,
                status,
            }),
        )
    }

    fn loaded(records: Vec<Record>) -> BrowserState {
        let mut state = BrowserState::new(RecordKind::Partnership, ScrollLock::new());
        state.update(Action::FetchStarted { seq: 1 });
        state.update(Action::FetchSucceeded {
            seq: 1,
            records,
            skipped: 0,
        });
        state
    }

    #[test]
    fn loading_tracks_newest_fetch() {
        let mut state = BrowserState::new(RecordKind::Partnership, ScrollLock::new());
        assert!(!state.is_loading());
        state.update(Action::FetchStarted { seq: 1 });
        state.update(Action::FetchStarted { seq: 2 });
        state.update(Action::FetchSucceeded {
            seq: 1,
            records: vec![],
            skipped: 0,
        });
        assert!(state.is_loading());
        state.update(Action::FetchSucceeded {
            seq: 2,
            records: vec![],
            skipped: 0,
        });
        assert!(!state.is_loading());
        assert_eq!(state.applied_seq(), 2);
    }

    #[test]
    fn stale_success_is_discarded() {
        let mut state = BrowserState::new(RecordKind::Partnership, ScrollLock::new());
        state.update(Action::FetchStarted { seq: 1 });
        state.update(Action::FetchStarted { seq: 2 });
        state.update(Action::FetchSucceeded {
            seq: 2,
            records: vec![request("new", "Ada", PartnershipStatus::Pending)],
            skipped: 0,
        });
        state.update(Action::FetchSucceeded {
            seq: 1,
            records: vec![request("old", "Ben", PartnershipStatus::Pending)],
            skipped: 0,
        });
        assert_eq!(state.records().len(), 1);
        assert_eq!(state.records()[0].id.as_str(), "new");
    }

    #[test]
    fn failed_fetch_keeps_records_and_sets_notice() {
        let mut state = loaded(vec![request("a", "Ada", PartnershipStatus::Pending)]);
        state.update(Action::FetchStarted { seq: 2 });
        state.update(Action::FetchFailed {
            seq: 2,
            error: StoreError::new(StoreOp::Fetch, ErrorKind::Network, "timeout"),
        });
        assert_eq!(state.records().len(), 1);
        assert!(state.notice().is_some_and(Notice::is_error));
        assert!(!state.is_loading());
    }

    #[test]
    fn status_filter_change_closes_overlay_on_hidden_focus() {
        let lock = ScrollLock::new();
        let mut state = BrowserState::new(RecordKind::Partnership, lock.clone());
        state.update(Action::FetchSucceeded {
            seq: 1,
            records: vec![
                request("a", "Ada", PartnershipStatus::Pending),
                request("b", "Ben", PartnershipStatus::Approved),
            ],
            skipped: 0,
        });
        state.update(Action::FocusChanged(FocusMove::Open(RecordId::new("b"))));
        assert!(lock.is_locked());

        state.update(Action::FilterChanged(
            FilterSpec::default().with_status(Predicate::parse("pending")),
        ));
        assert!(state.focused().is_none());
        assert!(!lock.is_locked());
    }

    #[test]
    fn transition_success_updates_record_and_clears_busy() {
        let mut state = loaded(vec![request("a", "Ada", PartnershipStatus::Pending)]);
        let id = RecordId::new("a");
        state.update(Action::MutationStarted { id: id.clone() });
        assert!(state.is_busy(&id));
        state.update(Action::TransitionSucceeded {
            id: id.clone(),
            status: PartnershipStatus::Approved.into(),
        });
        assert!(!state.is_busy(&id));
        assert_eq!(
            state.record(&id).and_then(Record::status),
            Some(Status::Partnership(PartnershipStatus::Approved))
        );
    }

    #[test]
    fn create_prepends_and_delete_removes() {
        let mut state = loaded(vec![request("a", "Ada", PartnershipStatus::Pending)]);
        state.update(Action::CreateStarted);
        assert!(state.is_creating());
        state.update(Action::CreateSucceeded(request("z", "Zed", PartnershipStatus::Pending)));
        assert!(!state.is_creating());
        assert_eq!(state.visible_ids()[0].as_str(), "z");

        state.update(Action::DeleteSucceeded { id: RecordId::new("a") });
        assert_eq!(state.records().len(), 1);
        assert_eq!(state.stats().total, 1);
    }

    #[test]
    fn skipped_rows_raise_info_notice() {
        let mut state = BrowserState::new(RecordKind::Partnership, ScrollLock::new());
        state.update(Action::FetchStarted { seq: 1 });
        state.update(Action::FetchSucceeded {
            seq: 1,
            records: vec![request("a", "Ada", PartnershipStatus::Pending)],
            skipped: 2,
        });
        let notice = state.notice().cloned().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(notice.message.starts_with('2'), "{}", notice.message);
        assert_eq!(state.records().len(), 1);

        state.update(Action::NoticeDismissed);
        assert!(state.notice().is_none());
    }

    #[test]
    fn abandoned_mutations_release_their_marks() {
        let mut state = loaded(vec![request("a", "Ada", PartnershipStatus::Pending)]);
        let id = RecordId::new("a");
        state.update(Action::MutationStarted { id: id.clone() });
        state.update(Action::CreateStarted);

        state.update(Action::MutationAbandoned { id: id.clone() });
        state.update(Action::CreateAbandoned);
        assert!(!state.is_busy(&id));
        assert!(!state.is_creating());
        assert_eq!(
            state.record(&id).and_then(Record::status),
            Some(Status::Partnership(PartnershipStatus::Pending))
        );
    }
}
