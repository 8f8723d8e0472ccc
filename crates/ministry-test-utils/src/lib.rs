//! Testing utilities for the ministry console workspace
//!
//! Shared fixtures, a CSV reader for export assertions and a store whose
//! fetches complete only when the test says so.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ministry_records::{
    Donation, DonationStatus, FinancialPledge, GalleryImage, Money, NewRecord, PartnershipKind,
    PartnershipRequest, PartnershipStatus, PledgeFrequency, Record, RecordBody, RecordId,
    RecordKind, Status, VolunteerOffer,
};
use ministry_store::{
    CreateError, DeleteError, ErrorKind, FetchError, Fetched, RecordStore, StoreError, StoreOp,
    UpdateError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Fixed instant `days` after 2024-01-01 09:00 UTC
pub fn at_day(days: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(days)
}

pub fn create_donation(
    id: &str,
    donor: &str,
    amount_minor: i64,
    purpose: &str,
    status: DonationStatus,
    day: i64,
) -> Record {
    Record::new(
        RecordId::new(id),
        at_day(day),
        RecordBody::Donation(Donation {
            donor_name: donor.to_string(),
            email: format!("{}@example.org", donor.to_lowercase().replace(' ', ".")),
            amount: Money::new(amount_minor, "NGN"),
            purpose: purpose.to_string(),
            reference: Some(format!("REF-{id}")),
            message: None,
            status,
        }),
    )
}

pub fn create_partnership(id: &str, name: &str, status: PartnershipStatus, day: i64) -> Record {
    Record::new(
        RecordId::new(id),
        at_day(day),
        RecordBody::Partnership(PartnershipRequest {
            full_name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase().replace(' ', ".")),
            phone: Some("+234 800 000 0000".to_string()),
            church: Some("Grace Assembly".to_string()),
            city: Some("Lagos".to_string()),
            kinds: vec![PartnershipKind::Prayer],
            financial: None,
            volunteer: None,
            message: None,
            status,
        }),
    )
}

/// Partnership with a monthly pledge and a volunteer offer
pub fn create_full_partnership(id: &str, name: &str, pledge_minor: i64, day: i64) -> Record {
    let mut record = create_partnership(id, name, PartnershipStatus::Pending, day);
    if let RecordBody::Partnership(p) = &mut record.body {
        p.kinds = vec![
            PartnershipKind::Financial,
            PartnershipKind::Volunteer,
        ];
        p.financial = Some(FinancialPledge {
            amount: Money::new(pledge_minor, "NGN"),
            frequency: PledgeFrequency::Monthly,
        });
        p.volunteer = Some(VolunteerOffer {
            skills: vec!["sound".to_string(), "ushering".to_string()],
            availability: Some("Sundays".to_string()),
        });
    }
    record
}

pub fn create_gallery_image(id: &str, title: &str, category: &str, day: i64) -> Record {
    Record::new(
        RecordId::new(id),
        at_day(day),
        RecordBody::Gallery(GalleryImage {
            title: title.to_string(),
            description: None,
            category: category.to_string(),
            image_url: format!("https://cdn.example.org/gallery/{id}.jpg"),
            alt_text: Some(title.to_string()),
        }),
    )
}

/// Four donations, newest first
pub fn sample_donations() -> Vec<Record> {
    vec![
        create_donation("d4", "Chidi Okafor", 1_500_000, "building", DonationStatus::Pending, 4),
        create_donation("d3", "Amaka Obi", 250_000, "tithe", DonationStatus::Success, 3),
        create_donation("d2", "Grace Bello", 100_000, "offering", DonationStatus::Failed, 2),
        create_donation("d1", "Tunde Ade", 500_000, "tithe", DonationStatus::Success, 1),
    ]
}

/// Five requests covering every status, newest first
pub fn sample_partnerships() -> Vec<Record> {
    vec![
        create_partnership("p5", "Ngozi Eze", PartnershipStatus::Pending, 5),
        create_full_partnership("p4", "Samuel Adeyemi", 2_000_000, 4),
        create_partnership("p3", "Ruth Danjuma", PartnershipStatus::UnderReview, 3),
        create_partnership("p2", "Peter Musa", PartnershipStatus::Approved, 2),
        create_partnership("p1", "Esther Nwosu", PartnershipStatus::Rejected, 1),
    ]
}

/// Four images across three categories, newest first
pub fn sample_gallery() -> Vec<Record> {
    vec![
        create_gallery_image("g4", "Choir rehearsal", "worship", 4),
        create_gallery_image("g3", "Event, \"Grand\" Opening", "events", 3),
        create_gallery_image("g2", "Street outreach", "outreach", 2),
        create_gallery_image("g1", "Easter cantata", "worship", 1),
    ]
}

pub fn sample_for(kind: RecordKind) -> Vec<Record> {
    match kind {
        RecordKind::Donation => sample_donations(),
        RecordKind::Partnership => sample_partnerships(),
        RecordKind::Gallery => sample_gallery(),
    }
}

/// Parse RFC 4180 text into rows of fields
///
/// Accepts CRLF or LF line endings and quoted fields spanning lines.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                other => field.push(other),
            }
            continue;
        }
        match c {
            '"' => quoted = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            other => field.push(other),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Store whose fetches each wait for a test-supplied response
///
/// Call [`GatedStore::gate`] once per expected fetch before issuing it;
/// fetches claim gates in call order. Mutations succeed immediately.
#[derive(Debug)]
pub struct GatedStore {
    kind: RecordKind,
    gates: Mutex<VecDeque<oneshot::Receiver<Result<Vec<Record>, ErrorKind>>>>,
}

impl GatedStore {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            gates: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a gate for the next unclaimed fetch
    pub fn gate(&self) -> oneshot::Sender<Result<Vec<Record>, ErrorKind>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().push_back(rx);
        tx
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    async fn fetch_all(&self) -> Result<Fetched, FetchError> {
        let gate = self.gates.lock().pop_front();
        let Some(gate) = gate else {
            return Ok(Fetched::default());
        };
        match gate.await {
            Ok(Ok(records)) => Ok(Fetched::complete(records)),
            Ok(Err(kind)) => Err(StoreError::new(StoreOp::Fetch, kind, "gated failure")),
            Err(_) => Err(StoreError::new(StoreOp::Fetch, ErrorKind::Network, "gate dropped")),
        }
    }

    async fn update_status(&self, _id: &RecordId, _status: Status) -> Result<(), UpdateError> {
        Ok(())
    }

    async fn remove(&self, _id: &RecordId) -> Result<(), DeleteError> {
        Ok(())
    }

    async fn create(&self, new: NewRecord) -> Result<Record, CreateError> {
        let body = new
            .to_body()
            .map_err(|e| StoreError::new(StoreOp::Create, ErrorKind::Invalid, e.to_string()))?;
        Ok(Record::new(RecordId::generate(), Utc::now(), body))
    }
}
