//! Ministry Browser - client-side record browser
//!
//! One parameterized component behind the donation tracker, the
//! partnership-request viewer and the gallery browser:
//! - Filter/search over the loaded record set ([`filter`])
//! - Review status transitions with commit-on-confirm ([`RecordBrowser::transition`])
//! - Detail overlay / lightbox navigation with a scoped scroll lock ([`navigator`])
//! - Totals over the full set and CSV export of the visible subset ([`stats`], [`export`])
//! - A single reducer-style state container ([`BrowserState`])
//!
//! # Example
//!
//! ```rust,ignore
//! use ministry_browser::{FilterSpec, RecordBrowser, ScrollLock};
//!
//! let browser = RecordBrowser::new(store, ScrollLock::new());
//! browser.refresh().await?;
//! browser.set_filter(FilterSpec::default().with_query("grace"));
//! let view = browser.view();
//! println!("{} of {} records", view.visible.len(), view.total);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod browser;
pub mod error;
pub mod export;
pub mod filter;
pub mod navigator;
pub mod state;
pub mod stats;

pub use browser::{BrowserView, RecordBrowser};
pub use error::{BrowserError, TransitionError};
pub use export::{export_file_name, export_table, ColumnSpec};
pub use filter::{apply, matches, FilterSpec, Predicate, SortKey};
pub use navigator::{Navigator, ScrollGuard, ScrollLock};
pub use state::{Action, BrowserState, FocusMove, Notice, NoticeLevel};
pub use stats::{summarize, Stats};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a record browser
    pub use crate::{
        BrowserView, ColumnSpec, FilterSpec, Predicate, RecordBrowser, ScrollLock, SortKey,
    };
    pub use ministry_records::{Record, RecordId, RecordKind, Status};
    pub use ministry_store::RecordStore;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
