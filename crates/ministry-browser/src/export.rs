//! CSV export of the visible subset
//!
//! RFC 4180: comma separated, CRLF line endings, fields quoted when they
//! contain a comma, a double quote, CR or LF, or leading/trailing
//! whitespace; embedded quotes are doubled. Absent values export as empty
//! fields, except that a one-column row with an empty value is written as
//! `""` so it does not read as a blank line.

use chrono::NaiveDate;
use ministry_records::{Record, RecordKind};
use std::borrow::Cow;

const LINE_END: &str = "\r\n";

/// One export column: header label and record field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub header: String,
    pub field: String,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(header: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            field: field.into(),
        }
    }

    /// Default column set for a kind
    #[must_use]
    pub fn defaults_for(kind: RecordKind) -> Vec<Self> {
        kind.default_columns()
            .iter()
            .map(|(header, field)| Self::new(*header, *field))
            .collect()
    }
}

fn needs_quoting(value: &str) -> bool {
    value.contains([',', '"', '\r', '\n'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
}

fn escape_field(value: &str) -> Cow<'_, str> {
    if needs_quoting(value) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = Cow<'a, str>>) {
    let start = out.len();
    let mut width = 0;
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&cell));
        width += 1;
    }
    // Rows are never blank: a single empty cell is written as `""`.
    if width == 1 && out.len() == start {
        out.push_str("\"\"");
    }
    out.push_str(LINE_END);
}

/// Render `records` in the given order under `columns`
///
/// Headers and a row per record; every row has one cell per column.
#[must_use]
pub fn export_table<'r>(
    records: impl IntoIterator<Item = &'r Record>,
    columns: &[ColumnSpec],
) -> String {
    let mut out = String::new();
    push_row(&mut out, columns.iter().map(|c| Cow::Borrowed(c.header.as_str())));
    for record in records {
        push_row(
            &mut out,
            columns
                .iter()
                .map(|c| Cow::Owned(record.field(&c.field).unwrap_or_default())),
        );
    }
    out
}

/// `<kind>-YYYY-MM-DD.csv`
#[must_use]
pub fn export_file_name(kind: RecordKind, date: NaiveDate) -> String {
    format!("{}-{}.csv", kind.as_str(), date.format("%Y-%m-%d"))
}
