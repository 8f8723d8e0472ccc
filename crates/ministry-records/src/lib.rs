//! Ministry Records
//!
//! Typed records browsed by the admin console and the rules that govern them.
//!
//! # Core Concepts
//!
//! - [`Record`]: a normalized row (donation, partnership request or gallery image)
//! - [`RecordBody`]: tagged union over the record subtypes
//! - [`Status`]: closed status enumerations for workflow-capable kinds
//! - [`StatusGraph`]: the review transition table, consulted by [`validate_status_change`]
//! - [`NewRecord`]: validated creation forms (partnership form, gallery upload)
//!
//! # Example
//!
//! ```rust,ignore
//! use ministry_records::{PartnershipStatus, StatusGraph};
//!
//! assert!(PartnershipStatus::Pending.can_transition_to(PartnershipStatus::UnderReview));
//! assert!(PartnershipStatus::Approved.is_terminal());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod form;
mod id;
mod kind;
mod money;
mod payload;
mod record;
mod status;
mod workflow;

pub use error::{FormError, PayloadError, WorkflowError};
pub use form::{FormStep, GalleryUpload, NewRecord, PartnershipForm};
pub use id::RecordId;
pub use kind::RecordKind;
pub use money::{format_minor, Money, DEFAULT_CURRENCY};
pub use payload::DEFAULT_GALLERY_CATEGORY;
pub use record::{
    Donation, FinancialPledge, GalleryImage, PartnershipKind, PartnershipRequest, PledgeFrequency,
    Record, RecordBody, VolunteerOffer,
};
pub use status::{DonationStatus, PartnershipStatus, Status};
pub use workflow::{validate_status_change, validate_transition, StatusGraph};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
