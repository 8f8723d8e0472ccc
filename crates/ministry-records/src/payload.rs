//! Normalization of raw backend rows
//!
//! The hosted backend returns loosely shaped JSON objects: identifiers may
//! be strings or integers, amounts may be minor-unit integers or decimal
//! strings, and older partnership rows encode the selected partnership
//! kinds as boolean flags instead of an array. Everything is mapped to the
//! typed [`RecordBody`] variants here, once, at the boundary.

use crate::error::PayloadError;
use crate::id::RecordId;
use crate::kind::RecordKind;
use crate::money::{Money, DEFAULT_CURRENCY};
use crate::record::{
    Donation, FinancialPledge, GalleryImage, PartnershipKind, PartnershipRequest,
    PledgeFrequency, Record, RecordBody, VolunteerOffer,
};
use crate::status::{DonationStatus, PartnershipStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Gallery category used when an upload row carries none
pub const DEFAULT_GALLERY_CATEGORY: &str = "general";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn to_text(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }

    /// Interpret as a major-unit amount
    #[allow(clippy::cast_possible_truncation)]
    fn to_minor(&self) -> Option<i64> {
        match self {
            Self::Int(i) => i.checked_mul(100),
            Self::Float(f) if f.is_finite() => Some((f * 100.0).round() as i64),
            Self::Float(_) => None,
            Self::Text(s) => Money::parse_major(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TextList {
    List(Vec<String>),
    Text(String),
}

impl TextList {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            Self::List(items) => items,
            Self::Text(text) => text.split([',', ';']).map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCommon {
    id: Option<Scalar>,
    created_at: Option<String>,
    status: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDonation {
    #[serde(alias = "name", alias = "full_name")]
    donor_name: Option<String>,
    email: Option<String>,
    amount: Option<Scalar>,
    amount_minor: Option<i64>,
    currency: Option<String>,
    #[serde(alias = "donation_type", alias = "category")]
    purpose: Option<String>,
    #[serde(alias = "payment_reference", alias = "tx_ref")]
    reference: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPartnership {
    #[serde(alias = "name")]
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    #[serde(alias = "church_name")]
    church: Option<String>,
    city: Option<String>,
    partnership_types: Option<TextList>,
    prayer_partner: Option<bool>,
    financial_partner: Option<bool>,
    volunteer: Option<bool>,
    media_partner: Option<bool>,
    #[serde(alias = "pledge_amount")]
    amount: Option<Scalar>,
    amount_minor: Option<i64>,
    currency: Option<String>,
    #[serde(alias = "pledge_frequency")]
    frequency: Option<String>,
    #[serde(alias = "volunteer_skills")]
    skills: Option<TextList>,
    availability: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGallery {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    #[serde(alias = "url", alias = "src")]
    image_url: Option<String>,
    #[serde(alias = "alt")]
    alt_text: Option<String>,
}

/// Trim, and treat empty strings as absent
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(
    kind: RecordKind,
    field: &'static str,
    value: Option<String>,
) -> Result<String, PayloadError> {
    clean(value).ok_or(PayloadError::MissingField { kind, field })
}

fn decode<T: for<'de> Deserialize<'de>>(kind: RecordKind, row: &Value) -> Result<T, PayloadError> {
    T::deserialize(row).map_err(|e| PayloadError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

fn parse_timestamp(kind: RecordKind, text: &str) -> Result<DateTime<Utc>, PayloadError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| PayloadError::InvalidValue {
            kind,
            field: "created_at",
            value: text.to_string(),
        })
}

fn minor_amount(
    kind: RecordKind,
    field: &'static str,
    minor: Option<i64>,
    major: Option<&Scalar>,
) -> Result<Option<i64>, PayloadError> {
    if let Some(minor) = minor {
        return Ok(Some(minor));
    }
    match major {
        None => Ok(None),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => value
            .to_minor()
            .map(Some)
            .ok_or_else(|| PayloadError::InvalidValue {
                kind,
                field,
                value: value.to_text(),
            }),
    }
}

fn currency(value: Option<String>) -> String {
    clean(value).map_or_else(|| DEFAULT_CURRENCY.to_string(), |c| c.to_uppercase())
}

fn normalize_donation(common: RawCommon, row: &Value) -> Result<RecordBody, PayloadError> {
    let kind = RecordKind::Donation;
    let raw: RawDonation = decode(kind, row)?;
    let amount_minor = minor_amount(kind, "amount", raw.amount_minor, raw.amount.as_ref())?
        .ok_or(PayloadError::MissingField {
            kind,
            field: "amount",
        })?;
    let status_text = required(kind, "status", common.status)?;
    let status = DonationStatus::parse(&status_text).ok_or(PayloadError::InvalidValue {
        kind,
        field: "status",
        value: status_text,
    })?;

    Ok(RecordBody::Donation(Donation {
        donor_name: required(kind, "donor_name", raw.donor_name)?,
        email: required(kind, "email", raw.email)?,
        amount: Money::new(amount_minor, currency(raw.currency)),
        purpose: clean(raw.purpose).unwrap_or_else(|| "general".to_string()),
        reference: clean(raw.reference),
        message: clean(common.message),
        status,
    }))
}

fn normalize_partnership(common: RawCommon, row: &Value) -> Result<RecordBody, PayloadError> {
    let kind = RecordKind::Partnership;
    let raw: RawPartnership = decode(kind, row)?;

    let mut kinds = Vec::new();
    for name in raw.partnership_types.map(TextList::into_vec).unwrap_or_default() {
        let parsed = PartnershipKind::parse(&name).ok_or(PayloadError::InvalidValue {
            kind,
            field: "partnership_types",
            value: name.clone(),
        })?;
        kinds.push(parsed);
    }
    let flags = [
        (raw.prayer_partner, PartnershipKind::Prayer),
        (raw.financial_partner, PartnershipKind::Financial),
        (raw.volunteer, PartnershipKind::Volunteer),
        (raw.media_partner, PartnershipKind::Media),
    ];
    kinds.extend(
        flags
            .into_iter()
            .filter(|(flag, _)| *flag == Some(true))
            .map(|(_, k)| k),
    );
    kinds.sort();
    kinds.dedup();

    let pledge_minor = minor_amount(kind, "amount", raw.amount_minor, raw.amount.as_ref())?;
    let financial = match (kinds.contains(&PartnershipKind::Financial), pledge_minor) {
        (true, Some(amount_minor)) => {
            let frequency = match clean(raw.frequency) {
                None => PledgeFrequency::OneTime,
                Some(text) => {
                    PledgeFrequency::parse(&text).ok_or(PayloadError::InvalidValue {
                        kind,
                        field: "frequency",
                        value: text,
                    })?
                }
            };
            Some(FinancialPledge {
                amount: Money::new(amount_minor, currency(raw.currency)),
                frequency,
            })
        }
        _ => None,
    };

    let volunteer = kinds
        .contains(&PartnershipKind::Volunteer)
        .then(|| VolunteerOffer {
            skills: raw.skills.map(TextList::into_vec).unwrap_or_default(),
            availability: clean(raw.availability),
        });

    let status = match clean(common.status) {
        None => PartnershipStatus::Pending,
        Some(text) => PartnershipStatus::parse(&text).ok_or(PayloadError::InvalidValue {
            kind,
            field: "status",
            value: text,
        })?,
    };

    Ok(RecordBody::Partnership(PartnershipRequest {
        full_name: required(kind, "full_name", raw.full_name)?,
        email: required(kind, "email", raw.email)?,
        phone: clean(raw.phone),
        church: clean(raw.church),
        city: clean(raw.city),
        kinds,
        financial,
        volunteer,
        message: clean(common.message),
        status,
    }))
}

fn normalize_gallery(row: &Value) -> Result<RecordBody, PayloadError> {
    let kind = RecordKind::Gallery;
    let raw: RawGallery = decode(kind, row)?;
    Ok(RecordBody::Gallery(GalleryImage {
        title: required(kind, "title", raw.title)?,
        description: clean(raw.description),
        category: clean(raw.category)
            .map_or_else(|| DEFAULT_GALLERY_CATEGORY.to_string(), |c| c.to_lowercase()),
        image_url: required(kind, "image_url", raw.image_url)?,
        alt_text: clean(raw.alt_text),
    }))
}

/// Canonical column map for a record body, used for create requests
pub(crate) fn body_row(body: &RecordBody) -> Map<String, Value> {
    let value = match body {
        RecordBody::Donation(d) => json!({
            "donor_name": d.donor_name,
            "email": d.email,
            "amount_minor": d.amount.amount_minor,
            "currency": d.amount.currency,
            "purpose": d.purpose,
            "reference": d.reference,
            "message": d.message,
            "status": d.status.as_str(),
        }),
        RecordBody::Partnership(p) => json!({
            "full_name": p.full_name,
            "email": p.email,
            "phone": p.phone,
            "church": p.church,
            "city": p.city,
            "partnership_types": p.kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "amount_minor": p.financial.as_ref().map(|f| f.amount.amount_minor),
            "currency": p.financial.as_ref().map(|f| f.amount.currency.clone()),
            "frequency": p.financial.as_ref().map(|f| f.frequency.as_str()),
            "skills": p.volunteer.as_ref().map(|v| v.skills.clone()),
            "availability": p.volunteer.as_ref().and_then(|v| v.availability.clone()),
            "message": p.message,
            "status": p.status.as_str(),
        }),
        RecordBody::Gallery(g) => json!({
            "title": g.title,
            "description": g.description,
            "category": g.category,
            "image_url": g.image_url,
            "alt_text": g.alt_text,
        }),
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Record {
    /// Normalize one backend row of the given kind
    ///
    /// # Errors
    /// - `PayloadError::Malformed` if the row is not an object of the expected shape
    /// - `PayloadError::MissingField` if a required field is absent or blank
    /// - `PayloadError::InvalidValue` for unparsable timestamps, amounts or statuses
    pub fn from_raw(kind: RecordKind, row: &Value) -> Result<Self, PayloadError> {
        if !row.is_object() {
            return Err(PayloadError::Malformed {
                kind,
                reason: "expected a JSON object".to_string(),
            });
        }
        let common: RawCommon = decode(kind, row)?;
        let id = common
            .id
            .as_ref()
            .map(Scalar::to_text)
            .filter(|s| !s.is_empty())
            .map(RecordId::new)
            .ok_or(PayloadError::MissingField { kind, field: "id" })?;
        let created_at = match clean(common.created_at.clone()) {
            Some(text) => parse_timestamp(kind, &text)?,
            None => {
                return Err(PayloadError::MissingField {
                    kind,
                    field: "created_at",
                })
            }
        };

        let body = match kind {
            RecordKind::Donation => normalize_donation(common, row)?,
            RecordKind::Partnership => normalize_partnership(common, row)?,
            RecordKind::Gallery => normalize_gallery(row)?,
        };
        Ok(Self::new(id, created_at, body))
    }

    /// Full row including `id` and `created_at`
    #[must_use]
    pub fn to_row(&self) -> Value {
        let mut map = body_row(&self.body);
        map.insert("id".to_string(), Value::String(self.id.to_string()));
        map.insert(
            "created_at".to_string(),
            Value::String(self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(map)
    }
}
