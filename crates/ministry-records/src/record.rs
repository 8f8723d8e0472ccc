//! Normalized record model
//!
//! Each subtype is a plain struct with explicit `Option` fields; the
//! duck-typed rows of the hosted backend are mapped onto these in
//! [`payload`](crate::payload) so call sites never check for key presence.

use crate::id::RecordId;
use crate::kind::RecordKind;
use crate::money::Money;
use crate::status::{DonationStatus, PartnershipStatus, Status};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A donation captured by the payment integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub donor_name: String,
    pub email: String,
    pub amount: Money,
    /// Giving purpose (tithe, offering, project ...), used as category
    pub purpose: String,
    /// Gateway transaction reference
    pub reference: Option<String>,
    pub message: Option<String>,
    pub status: DonationStatus,
}

/// Ways a supporter can partner with the ministry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnershipKind {
    Prayer,
    Financial,
    Volunteer,
    Media,
}

impl PartnershipKind {
    pub const ALL: [PartnershipKind; 4] =
        [Self::Prayer, Self::Financial, Self::Volunteer, Self::Media];

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prayer => "prayer",
            Self::Financial => "financial",
            Self::Volunteer => "volunteer",
            Self::Media => "media",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        let value = value.strip_suffix("_partner").unwrap_or(value.as_str());
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }
}

/// Giving cadence of a financial pledge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeFrequency {
    OneTime,
    Monthly,
    Quarterly,
    Yearly,
}

impl PledgeFrequency {
    pub const ALL: [PledgeFrequency; 4] =
        [Self::OneTime, Self::Monthly, Self::Quarterly, Self::Yearly];

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase().replace([' ', '-'], "_");
        match value.as_str() {
            "once" | "onetime" => Some(Self::OneTime),
            "annually" | "annual" => Some(Self::Yearly),
            _ => Self::ALL.into_iter().find(|f| f.as_str() == value),
        }
    }
}

/// Financial details, present only for financial partners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialPledge {
    pub amount: Money,
    pub frequency: PledgeFrequency,
}

/// Volunteer details, present only for volunteer partners
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolunteerOffer {
    pub skills: Vec<String>,
    pub availability: Option<String>,
}

/// A partnership request from the public form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub church: Option<String>,
    pub city: Option<String>,
    /// Selected partnership kinds, sorted and deduplicated
    pub kinds: Vec<PartnershipKind>,
    pub financial: Option<FinancialPledge>,
    pub volunteer: Option<VolunteerOffer>,
    pub message: Option<String>,
    pub status: PartnershipStatus,
}

/// An image shown in the public gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub image_url: String,
    pub alt_text: Option<String>,
}

/// Subtype payload of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    Donation(Donation),
    Partnership(PartnershipRequest),
    Gallery(GalleryImage),
}

/// The unit browsed by the console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub body: RecordBody,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn new(id: RecordId, created_at: DateTime<Utc>, body: RecordBody) -> Self {
        Self {
            id,
            created_at,
            body,
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self.body {
            RecordBody::Donation(_) => RecordKind::Donation,
            RecordBody::Partnership(_) => RecordKind::Partnership,
            RecordBody::Gallery(_) => RecordKind::Gallery,
        }
    }

    /// Current status; `None` for gallery images
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match &self.body {
            RecordBody::Donation(d) => Some(d.status.into()),
            RecordBody::Partnership(p) => Some(p.status.into()),
            RecordBody::Gallery(_) => None,
        }
    }

    /// Overwrite the status in place
    ///
    /// Returns `false` (and changes nothing) when the status belongs to a
    /// different kind's vocabulary.
    pub fn set_status(&mut self, status: Status) -> bool {
        match (&mut self.body, status) {
            (RecordBody::Donation(d), Status::Donation(s)) => d.status = s,
            (RecordBody::Partnership(p), Status::Partnership(s)) => p.status = s,
            _ => return false,
        }
        true
    }

    /// Value of the kind's category field
    #[must_use]
    pub fn category(&self) -> Option<String> {
        self.kind().category_field().and_then(|f| self.field(f))
    }

    /// Short label for list rows and headings
    #[must_use]
    pub fn title(&self) -> &str {
        match &self.body {
            RecordBody::Donation(d) => &d.donor_name,
            RecordBody::Partnership(p) => &p.full_name,
            RecordBody::Gallery(g) => &g.title,
        }
    }

    /// Amount carried by the record, if any
    #[must_use]
    pub fn amount(&self) -> Option<&Money> {
        match &self.body {
            RecordBody::Donation(d) => Some(&d.amount),
            RecordBody::Partnership(p) => p.financial.as_ref().map(|f| &f.amount),
            RecordBody::Gallery(_) => None,
        }
    }

    /// Uniform by-name access used by search and export
    ///
    /// Absent optional values yield `None`; unknown names yield `None`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => return Some(self.id.to_string()),
            "created_at" => {
                return Some(self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            "kind" => return Some(self.kind().as_str().to_string()),
            "status" => return self.status().map(|s| s.as_str().to_string()),
            _ => {}
        }
        match &self.body {
            RecordBody::Donation(d) => donation_field(d, name),
            RecordBody::Partnership(p) => partnership_field(p, name),
            RecordBody::Gallery(g) => gallery_field(g, name),
        }
    }
}

fn donation_field(d: &Donation, name: &str) -> Option<String> {
    match name {
        "donor_name" => Some(d.donor_name.clone()),
        "email" => Some(d.email.clone()),
        "amount" => Some(d.amount.to_decimal_string()),
        "currency" => Some(d.amount.currency.clone()),
        "purpose" => Some(d.purpose.clone()),
        "reference" => d.reference.clone(),
        "message" => d.message.clone(),
        _ => None,
    }
}

fn partnership_field(p: &PartnershipRequest, name: &str) -> Option<String> {
    match name {
        "full_name" => Some(p.full_name.clone()),
        "email" => Some(p.email.clone()),
        "phone" => p.phone.clone(),
        "church" => p.church.clone(),
        "city" => p.city.clone(),
        "partnership_types" => Some(
            p.kinds
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        "pledge_amount" => p.financial.as_ref().map(|f| f.amount.to_decimal_string()),
        "pledge_currency" => p.financial.as_ref().map(|f| f.amount.currency.clone()),
        "pledge_frequency" => p.financial.as_ref().map(|f| f.frequency.as_str().to_string()),
        "volunteer_skills" => p.volunteer.as_ref().map(|v| v.skills.join("; ")),
        "availability" => p.volunteer.as_ref().and_then(|v| v.availability.clone()),
        "message" => p.message.clone(),
        _ => None,
    }
}

fn gallery_field(g: &GalleryImage, name: &str) -> Option<String> {
    match name {
        "title" => Some(g.title.clone()),
        "description" => g.description.clone(),
        "category" => Some(g.category.clone()),
        "image_url" => Some(g.image_url.clone()),
        "alt_text" => g.alt_text.clone(),
        _ => None,
    }
}
