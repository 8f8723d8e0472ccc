//! Aggregate figures over a record set
//!
//! Always computed from the full loaded set, never the filtered subset.

use ministry_records::{DonationStatus, Record, RecordBody, RecordKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary counts and totals
///
/// Amounts are keyed by currency code and kept in minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub by_kind: BTreeMap<RecordKind, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    /// Donation amounts plus partnership pledges
    pub total_amount: BTreeMap<String, i64>,
    /// Successful donations only
    pub received_amount: BTreeMap<String, i64>,
}

impl Stats {
    #[must_use]
    pub fn count_status(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn count_category(&self, category: &str) -> usize {
        self.by_category.get(category).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn received(&self, currency: &str) -> i64 {
        self.received_amount.get(currency).copied().unwrap_or(0)
    }
}

/// Summarize `records`
#[must_use]
pub fn summarize(records: &[Record]) -> Stats {
    let mut stats = Stats {
        total: records.len(),
        ..Stats::default()
    };
    for record in records {
        *stats.by_kind.entry(record.kind()).or_default() += 1;
        if let Some(status) = record.status() {
            *stats.by_status.entry(status.as_str().to_string()).or_default() += 1;
        }
        if let Some(category) = record.category() {
            *stats.by_category.entry(category).or_default() += 1;
        }
        if let Some(money) = record.amount() {
            let total = stats.total_amount.entry(money.currency.clone()).or_default();
            *total = total.saturating_add(money.amount_minor);
        }
        if let RecordBody::Donation(d) = &record.body {
            if d.status == DonationStatus::Success {
                let received = stats
                    .received_amount
                    .entry(d.amount.currency.clone())
                    .or_default();
                *received = received.saturating_add(d.amount.amount_minor);
            }
        }
    }
    stats
}
