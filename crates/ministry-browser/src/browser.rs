//! Async driver around [`BrowserState`]
//!
//! Owns the store handle and serializes every state change through the
//! reducer. The state mutex is never held across an `.await`.

use crate::error::{BrowserError, TransitionError};
use crate::export::ColumnSpec;
use crate::filter::FilterSpec;
use crate::navigator::ScrollLock;
use crate::state::{Action, BrowserState, FocusMove, Notice};
use crate::stats::Stats;
use ministry_records::{
    validate_status_change, NewRecord, Record, RecordId, RecordKind, Status, WorkflowError,
};
use ministry_store::{FetchError, Fetched, RecordStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Snapshot handed to the presentation layer
#[derive(Debug, Clone)]
pub struct BrowserView {
    pub kind: RecordKind,
    pub visible: Vec<Record>,
    pub focused: Option<Record>,
    /// Size of the full loaded set
    pub total: usize,
    pub filter: FilterSpec,
    pub loading: bool,
    pub loaded: bool,
    /// Records whose controls should be disabled
    pub busy: Vec<RecordId>,
    pub creating: bool,
    pub notice: Option<Notice>,
}

/// Busy mark for one mutation that has reached the store
///
/// Dropping it unsettled (the call future was cancelled before the store
/// answered) dispatches the abandon action, so the control is re-enabled
/// whichever way the call ends.
struct InFlight<'a> {
    state: &'a Mutex<BrowserState>,
    abandon: Option<Action>,
}

impl<'a> InFlight<'a> {
    /// Arm `abandon` for a mark already dispatched under the same lock as
    /// its busy check; the caller must have released the lock
    fn arm(state: &'a Mutex<BrowserState>, abandon: Action) -> Self {
        Self {
            state,
            abandon: Some(abandon),
        }
    }

    fn settle(mut self, outcome: Action) {
        self.abandon = None;
        self.state.lock().update(outcome);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(action) = self.abandon.take() {
            debug!(?action, "mutation dropped before the store answered");
            self.state.lock().update(action);
        }
    }
}

/// One record browser bound to one store
pub struct RecordBrowser<S: ?Sized> {
    store: Arc<S>,
    state: Mutex<BrowserState>,
}

impl<S: RecordStore + ?Sized> RecordBrowser<S> {
    pub fn new(store: Arc<S>, scroll: ScrollLock) -> Self {
        let state = BrowserState::new(store.kind(), scroll);
        Self {
            store,
            state: Mutex::new(state),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.state.lock().kind()
    }

    fn dispatch(&self, action: Action) {
        self.state.lock().update(action);
    }

    /// Reload the full set
    ///
    /// Returns whether this fetch's result was applied. `Ok(false)` means a
    /// newer fetch already landed and this result was discarded.
    pub async fn refresh(&self) -> Result<bool, FetchError> {
        let seq = {
            let mut state = self.state.lock();
            let seq = state.next_fetch_seq();
            state.update(Action::FetchStarted { seq });
            seq
        };
        debug!(kind = %self.store.kind(), seq, "fetch started");

        match self.store.fetch_all().await {
            Ok(Fetched { records, skipped }) => {
                let count = records.len();
                let mut state = self.state.lock();
                state.update(Action::FetchSucceeded {
                    seq,
                    records,
                    skipped,
                });
                let applied = state.applied_seq() == seq;
                info!(kind = %state.kind(), seq, count, skipped, applied, "fetch settled");
                Ok(applied)
            }
            Err(error) => {
                let retryable = error.is_retryable();
                warn!(kind = %self.store.kind(), seq, %error, retryable, "fetch failed");
                self.dispatch(Action::FetchFailed {
                    seq,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    pub fn set_filter(&self, spec: FilterSpec) {
        self.dispatch(Action::FilterChanged(spec));
    }

    pub fn filter(&self) -> FilterSpec {
        self.state.lock().filter().clone()
    }

    /// Open the overlay on `id`; `false` when it is not visible
    pub fn open(&self, id: &RecordId) -> bool {
        let mut state = self.state.lock();
        state.update(Action::FocusChanged(FocusMove::Open(id.clone())));
        state.focused().is_some_and(|r| &r.id == id)
    }

    pub fn close(&self) {
        self.dispatch(Action::FocusChanged(FocusMove::Close));
    }

    pub fn next(&self) -> Option<Record> {
        let mut state = self.state.lock();
        state.update(Action::FocusChanged(FocusMove::Next));
        state.focused().cloned()
    }

    pub fn previous(&self) -> Option<Record> {
        let mut state = self.state.lock();
        state.update(Action::FocusChanged(FocusMove::Previous));
        state.focused().cloned()
    }

    pub fn focused(&self) -> Option<Record> {
        self.state.lock().focused().cloned()
    }

    /// Move a record to `target`
    ///
    /// Validated against the workflow graph before the store is called.
    /// Local state changes only after the store confirms; on any failure
    /// the record keeps its prior status and an error notice is raised.
    ///
    /// Cancelling the returned future releases the busy mark.
    pub async fn transition(
        &self,
        id: &RecordId,
        target: Status,
    ) -> Result<Record, TransitionError> {
        let mut updated = {
            let mut state = self.state.lock();
            let checked = match state.record(id) {
                None => Err(TransitionError::UnknownRecord(id.clone())),
                Some(_) if state.is_busy(id) => return Err(TransitionError::Busy(id.clone())),
                Some(record) => match record.status() {
                    None => Err(WorkflowError::NoStatus { kind: record.kind() }.into()),
                    Some(current) => validate_status_change(current, target)
                        .map(|()| record.clone())
                        .map_err(TransitionError::from),
                },
            };
            match checked {
                Ok(record) => {
                    state.update(Action::MutationStarted { id: id.clone() });
                    record
                }
                Err(error) => {
                    warn!(%id, %target, %error, "transition rejected");
                    state.update(Action::Rejected {
                        message: error.user_message(),
                    });
                    return Err(error);
                }
            }
        };

        let pending = InFlight::arm(&self.state, Action::MutationAbandoned { id: id.clone() });
        match self.store.update_status(id, target).await {
            Ok(()) => {
                info!(%id, %target, "status updated");
                pending.settle(Action::TransitionSucceeded {
                    id: id.clone(),
                    status: target,
                });
                updated.set_status(target);
                Ok(updated)
            }
            Err(error) => {
                let retryable = error.is_retryable();
                warn!(%id, %target, %error, retryable, "store rejected transition");
                pending.settle(Action::TransitionFailed {
                    id: id.clone(),
                    message: error.user_message().to_string(),
                });
                Err(TransitionError::RemoteRejected(error))
            }
        }
    }

    /// Delete a record after the store confirms
    pub async fn delete(&self, id: &RecordId) -> Result<(), BrowserError> {
        {
            let mut state = self.state.lock();
            if state.record(id).is_none() {
                let error = BrowserError::UnknownRecord(id.clone());
                state.update(Action::Rejected {
                    message: error.user_message(),
                });
                return Err(error);
            }
            if state.is_busy(id) {
                return Err(BrowserError::Busy);
            }
            state.update(Action::MutationStarted { id: id.clone() });
        }

        let pending = InFlight::arm(&self.state, Action::MutationAbandoned { id: id.clone() });
        match self.store.remove(id).await {
            Ok(()) => {
                info!(%id, "record deleted");
                pending.settle(Action::DeleteSucceeded { id: id.clone() });
                Ok(())
            }
            Err(error) => {
                warn!(%id, %error, "delete failed");
                pending.settle(Action::DeleteFailed {
                    id: id.clone(),
                    message: error.user_message().to_string(),
                });
                Err(error.into())
            }
        }
    }

    /// Submit a creation form; the stored record is prepended on success
    pub async fn create(&self, new: NewRecord) -> Result<Record, BrowserError> {
        {
            let mut state = self.state.lock();
            let checked = if new.kind() != state.kind() {
                Err(BrowserError::KindMismatch {
                    expected: state.kind(),
                    found: new.kind(),
                })
            } else {
                new.validate().map_err(BrowserError::from)
            };
            if let Err(error) = checked {
                debug!(%error, "creation form rejected");
                state.update(Action::Rejected {
                    message: error.user_message(),
                });
                return Err(error);
            }
            if state.is_creating() {
                return Err(BrowserError::Busy);
            }
            state.update(Action::CreateStarted);
        }

        let pending = InFlight::arm(&self.state, Action::CreateAbandoned);
        match self.store.create(new).await {
            Ok(record) => {
                info!(id = %record.id, kind = %record.kind(), "record created");
                pending.settle(Action::CreateSucceeded(record.clone()));
                Ok(record)
            }
            Err(error) => {
                warn!(%error, "create failed");
                pending.settle(Action::CreateFailed {
                    message: error.user_message().to_string(),
                });
                Err(error.into())
            }
        }
    }

    pub fn view(&self) -> BrowserView {
        let state = self.state.lock();
        BrowserView {
            kind: state.kind(),
            visible: state.visible().cloned().collect(),
            focused: state.focused().cloned(),
            total: state.records().len(),
            filter: state.filter().clone(),
            loading: state.is_loading(),
            loaded: state.is_loaded(),
            busy: state.busy_ids(),
            creating: state.is_creating(),
            notice: state.notice().cloned(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading()
    }

    pub fn is_busy(&self, id: &RecordId) -> bool {
        self.state.lock().is_busy(id)
    }

    pub fn notice(&self) -> Option<Notice> {
        self.state.lock().notice().cloned()
    }

    /// Full loaded set
    pub fn records(&self) -> Vec<Record> {
        self.state.lock().records().to_vec()
    }

    /// Stats over the full set; unaffected by the filter
    pub fn stats(&self) -> Stats {
        self.state.lock().stats()
    }

    /// CSV of the visible subset
    pub fn export_visible(&self, columns: &[ColumnSpec]) -> String {
        self.state.lock().export_visible(columns)
    }
}
