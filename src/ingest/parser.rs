//! Record parser: one CSV document to nodes, adjacency and per-call events
//!
//! The CSV handling is deliberately naive: lines are split on every comma and
//! each value loses at most one leading and one trailing quote. Embedded
//! commas inside quoted fields are not supported.

use super::types::{
    CallEvent, CallMeta, CallRecord, NodeData, ParentConflict, ParsedFile, RuleId, ROOT_PARENT,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::hash_map::Entry;
use thiserror::Error;

/// File-level parse failures. Row-level problems never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("document has no header line")]
    EmptyDocument,

    #[error("header is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Timestamp layouts tried before falling back to date-only layouts
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
];

/// Month-first layouts win over day-first ones for ambiguous dates
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%d/%m/%y",
    "%d-%m-%Y",
    "%m-%d-%Y",
];

/// Column positions resolved from the header line
#[derive(Debug, Clone, Copy, Default)]
struct ColumnMap {
    call_id: Option<usize>,
    call_date: Option<usize>,
    rule_id: usize,
    rule_parent_id: Option<usize>,
    rule_text: Option<usize>,
    url: Option<usize>,
}

impl ColumnMap {
    fn from_header(line: &str) -> Result<Self, ParseError> {
        let mut call_id = None;
        let mut call_date = None;
        let mut rule_id = None;
        let mut rule_parent_id = None;
        let mut rule_text = None;
        let mut url = None;

        for (idx, raw) in line.split(',').enumerate() {
            let name = raw.trim().replace('"', "").to_ascii_lowercase();
            let slot = match name.as_str() {
                "call_id" => &mut call_id,
                "call_date" => &mut call_date,
                "rule_id" => &mut rule_id,
                "rule_parent_id" => &mut rule_parent_id,
                "rule_text" => &mut rule_text,
                "popupurl" | "url" => &mut url,
                _ => continue,
            };
            // First column with a given name wins
            slot.get_or_insert(idx);
        }

        Ok(Self {
            call_id,
            call_date,
            rule_id: rule_id.ok_or(ParseError::MissingColumn("rule_id"))?,
            rule_parent_id,
            rule_text,
            url,
        })
    }
}

/// Parses call-center CSV exports
#[derive(Debug, Clone)]
pub struct RecordParser {
    first_seq: u64,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser {
    pub fn new() -> Self {
        Self { first_seq: 1 }
    }

    /// Start the row sequence at `seq` instead of 1
    pub fn with_first_seq(mut self, seq: u64) -> Self {
        self.first_seq = seq;
        self
    }

    /// Parse a whole document
    pub fn parse(&self, content: &str) -> Result<ParsedFile, ParseError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or(ParseError::EmptyDocument)?;
        let columns = ColumnMap::from_header(header)?;

        let mut parsed = ParsedFile::new();
        let mut seq = self.first_seq;

        for line in lines {
            let values: Vec<&str> = line.trim().split(',').map(clean_value).collect();
            let field = |idx: Option<usize>| idx.and_then(|i| values.get(i).copied());

            let this_seq = seq;
            seq += 1;
            parsed.rows_scanned += 1;

            let rule_id = match field(Some(columns.rule_id)).and_then(parse_id) {
                Some(id) if id != 0 => id,
                _ => {
                    parsed.rows_skipped += 1;
                    continue;
                }
            };
            // Absent parent means root; a malformed one drops the row
            let parent_id = match field(columns.rule_parent_id).and_then(coerce_null) {
                None => ROOT_PARENT,
                Some(raw) => match raw.parse() {
                    Ok(id) => id,
                    Err(_) => {
                        parsed.rows_skipped += 1;
                        continue;
                    }
                },
            };

            match parsed.nodes.entry(rule_id) {
                Entry::Vacant(slot) => {
                    slot.insert(NodeData {
                        rule_id,
                        parent_id,
                        text: field(columns.rule_text)
                            .and_then(coerce_null)
                            .unwrap_or_default()
                            .to_string(),
                        url: field(columns.url).and_then(coerce_null).map(str::to_string),
                    });
                }
                Entry::Occupied(existing) => {
                    if existing.get().parent_id != parent_id {
                        parsed.parent_conflicts.push(ParentConflict {
                            rule_id,
                            registered_parent: existing.get().parent_id,
                            seen_parent: parent_id,
                        });
                    }
                }
            }

            parsed.children.entry(parent_id).or_default().insert(rule_id);

            if let Some(call_id) = field(columns.call_id).and_then(coerce_null) {
                let call_date = field(columns.call_date);
                parsed
                    .calls
                    .entry(call_id.to_string())
                    .or_insert_with(|| CallRecord {
                        events: Vec::new(),
                        meta: call_meta(call_date),
                    })
                    .events
                    .push(CallEvent {
                        seq: this_seq,
                        rule_id,
                    });
            }
        }

        Ok(parsed)
    }
}

/// Parse a document with sequence numbers starting at 1
pub fn parse_document(content: &str) -> Result<ParsedFile, ParseError> {
    RecordParser::new().parse(content)
}

/// Trim a raw cell and drop one surrounding quote on each side
fn clean_value(raw: &str) -> &str {
    let v = raw.trim();
    let v = v.strip_prefix('"').unwrap_or(v);
    v.strip_suffix('"').unwrap_or(v)
}

/// Blank and `NULL` (any case) become absent
fn coerce_null(value: &str) -> Option<&str> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(v)
    }
}

fn parse_id(value: &str) -> Option<RuleId> {
    coerce_null(value)?.parse().ok()
}

fn call_meta(raw_date: Option<&str>) -> CallMeta {
    match raw_date.and_then(coerce_null) {
        Some(raw) => match parse_date(raw) {
            Some(date) => CallMeta {
                call_date: Some(raw.to_string()),
                weekday: Some(iso_weekday(date)),
            },
            None => CallMeta::default(),
        },
        None => CallMeta::default(),
    }
}

/// Parse the date part of a call timestamp in any supported layout
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // `%Y` happily reads "24" as year 24
    let four_digit_year = |d: &NaiveDate| d.year() >= 1000;
    DATETIME_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .find(four_digit_year)
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .find(four_digit_year)
        })
}

/// 1 = Monday .. 7 = Sunday
pub fn iso_weekday(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}
