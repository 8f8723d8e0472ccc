//! Creation forms
//!
//! The partnership form is multi-step: the financial and volunteer steps
//! only appear when the matching partnership kind is ticked. Forms are
//! validated here, before anything is sent to the store.

use crate::error::FormError;
use crate::kind::RecordKind;
use crate::money::{Money, DEFAULT_CURRENCY};
use crate::payload::body_row;
use crate::record::{
    FinancialPledge, GalleryImage, PartnershipKind, PartnershipRequest, PledgeFrequency,
    RecordBody, VolunteerOffer,
};
use crate::status::PartnershipStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Steps of the partnership form, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    Contact,
    Partnership,
    Financial,
    Volunteer,
    Review,
}

impl FormStep {
    const ORDER: [FormStep; 5] = [
        Self::Contact,
        Self::Partnership,
        Self::Financial,
        Self::Volunteer,
        Self::Review,
    ];

    /// Whether this step is shown for the current selections
    #[must_use]
    pub fn applies(self, form: &PartnershipForm) -> bool {
        match self {
            Self::Financial => form.has_kind(PartnershipKind::Financial),
            Self::Volunteer => form.has_kind(PartnershipKind::Volunteer),
            _ => true,
        }
    }

    /// Next applicable step, `None` after review
    #[must_use]
    pub fn next(self, form: &PartnershipForm) -> Option<Self> {
        let pos = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER[pos + 1..].iter().copied().find(|s| s.applies(form))
    }

    /// Previous applicable step, `None` on the first step
    #[must_use]
    pub fn previous(self, form: &PartnershipForm) -> Option<Self> {
        let pos = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER[..pos].iter().rev().copied().find(|s| s.applies(form))
    }
}

/// Input state of the public partnership form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub church: String,
    pub city: String,
    pub kinds: Vec<PartnershipKind>,
    /// Pledge as typed by the user, major units
    pub pledge_amount: String,
    pub pledge_currency: String,
    pub pledge_frequency: Option<PledgeFrequency>,
    pub skills: Vec<String>,
    pub availability: String,
    pub message: String,
}

fn optional(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn plausible_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

impl PartnershipForm {
    #[inline]
    #[must_use]
    pub fn has_kind(&self, kind: PartnershipKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Tick or untick a partnership kind
    pub fn toggle_kind(&mut self, kind: PartnershipKind) {
        if let Some(pos) = self.kinds.iter().position(|k| *k == kind) {
            self.kinds.remove(pos);
        } else {
            self.kinds.push(kind);
            self.kinds.sort();
        }
    }

    /// Steps shown for the current selections
    #[must_use]
    pub fn steps(&self) -> Vec<FormStep> {
        FormStep::ORDER
            .iter()
            .copied()
            .filter(|s| s.applies(self))
            .collect()
    }

    /// Validate the inputs belonging to one step
    ///
    /// # Errors
    /// The first problem found on that step.
    pub fn validate_step(&self, step: FormStep) -> Result<(), FormError> {
        match step {
            FormStep::Contact => {
                if self.full_name.trim().is_empty() {
                    return Err(FormError::Required("full name"));
                }
                if self.email.trim().is_empty() {
                    return Err(FormError::Required("email"));
                }
                if !plausible_email(&self.email) {
                    return Err(FormError::InvalidEmail);
                }
                Ok(())
            }
            FormStep::Partnership => {
                if self.kinds.is_empty() {
                    Err(FormError::NoPartnershipKind)
                } else {
                    Ok(())
                }
            }
            FormStep::Financial => {
                if self.pledge_amount.trim().is_empty() {
                    return Err(FormError::Required("pledge amount"));
                }
                match Money::parse_major(&self.pledge_amount) {
                    Some(minor) if minor > 0 => {}
                    _ => return Err(FormError::InvalidAmount),
                }
                if self.pledge_frequency.is_none() {
                    return Err(FormError::Required("pledge frequency"));
                }
                Ok(())
            }
            FormStep::Volunteer => {
                if self.skills.iter().all(|s| s.trim().is_empty()) {
                    Err(FormError::Required("volunteer skills"))
                } else {
                    Ok(())
                }
            }
            FormStep::Review => Ok(()),
        }
    }

    /// Validate every applicable step
    ///
    /// # Errors
    /// The first problem found, in step order.
    pub fn validate(&self) -> Result<(), FormError> {
        self.steps()
            .into_iter()
            .try_for_each(|step| self.validate_step(step))
    }

    /// Build the record body submitted to the store
    ///
    /// # Errors
    /// Any validation failure; nothing is built from an invalid form.
    pub fn to_body(&self) -> Result<RecordBody, FormError> {
        self.validate()?;

        let financial = if self.has_kind(PartnershipKind::Financial) {
            let amount_minor =
                Money::parse_major(&self.pledge_amount).ok_or(FormError::InvalidAmount)?;
            let currency =
                optional(&self.pledge_currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
            Some(FinancialPledge {
                amount: Money::new(amount_minor, currency),
                frequency: self.pledge_frequency.unwrap_or(PledgeFrequency::OneTime),
            })
        } else {
            None
        };

        let volunteer = self.has_kind(PartnershipKind::Volunteer).then(|| VolunteerOffer {
            skills: self.skills.iter().filter_map(|s| optional(s)).collect(),
            availability: optional(&self.availability),
        });

        let mut kinds = self.kinds.clone();
        kinds.sort();
        kinds.dedup();

        Ok(RecordBody::Partnership(PartnershipRequest {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: optional(&self.phone),
            church: optional(&self.church),
            city: optional(&self.city),
            kinds,
            financial,
            volunteer,
            message: optional(&self.message),
            status: PartnershipStatus::Pending,
        }))
    }
}

/// Gallery upload form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryUpload {
    pub title: String,
    pub description: String,
    pub category: String,
    /// URL of the already-stored image object
    pub image_url: String,
    pub alt_text: String,
}

impl GalleryUpload {
    /// # Errors
    /// The first missing or invalid input.
    pub fn validate(&self) -> Result<(), FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::Required("title"));
        }
        if self.category.trim().is_empty() {
            return Err(FormError::Required("category"));
        }
        let url = self.image_url.trim();
        if url.is_empty() {
            return Err(FormError::Required("image URL"));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(FormError::InvalidUrl);
        }
        Ok(())
    }

    /// # Errors
    /// Any validation failure.
    pub fn to_body(&self) -> Result<RecordBody, FormError> {
        self.validate()?;
        Ok(RecordBody::Gallery(GalleryImage {
            title: self.title.trim().to_string(),
            description: optional(&self.description),
            category: self.category.trim().to_lowercase(),
            image_url: self.image_url.trim().to_string(),
            alt_text: optional(&self.alt_text),
        }))
    }
}

/// Payload for a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NewRecord {
    Partnership(PartnershipForm),
    Gallery(GalleryUpload),
}

impl NewRecord {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Partnership(_) => RecordKind::Partnership,
            Self::Gallery(_) => RecordKind::Gallery,
        }
    }

    /// # Errors
    /// Any validation failure of the underlying form.
    pub fn validate(&self) -> Result<(), FormError> {
        match self {
            Self::Partnership(form) => form.validate(),
            Self::Gallery(upload) => upload.validate(),
        }
    }

    /// Typed body of the record to create
    ///
    /// # Errors
    /// Any validation failure of the underlying form.
    pub fn to_body(&self) -> Result<RecordBody, FormError> {
        match self {
            Self::Partnership(form) => form.to_body(),
            Self::Gallery(upload) => upload.to_body(),
        }
    }

    /// Row sent to the backend's insert endpoint (no `id`, no `created_at`)
    ///
    /// # Errors
    /// Any validation failure of the underlying form.
    pub fn to_row(&self) -> Result<Value, FormError> {
        self.to_body().map(|body| Value::Object(body_row(&body)))
    }
}
