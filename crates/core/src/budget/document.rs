//! Wire codec between budget years and persisted JSON documents.
//!
//! Remote documents may be hand-edited or written by older clients, so
//! decoding never fails on content: anything missing or malformed degrades to
//! a default, and each degradation is reported back as a [`DocumentIssue`] so
//! the caller can log it.

use desa_shared::types::{SectorId, SubItemId};
use serde_json::{Map, Value};

use super::error::BudgetError;
use super::percent::{amount_from_json, percent_from_json};
use super::types::{BudgetYear, Sector, SubItem, YearKey};

/// Field holding the server-assigned save timestamp.
pub const UPDATED_AT: &str = "updated_at";

/// Something a decoded document lacked or carried in the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentIssue {
    /// The document body is not a JSON object.
    NotAnObject,
    /// `year` is missing or blank; the document key was used.
    YearFromKey,
    /// `total` is missing; 0 was used.
    MissingTotal,
    /// `total` is not a number and was parsed leniently.
    LenientTotal,
    /// `sectors` is missing or not an array; no sectors were read.
    MissingSectors,
    /// A sector or sub-item had no id and received a fresh one.
    MissingId,
    /// A sector or sub-item entry is not an object and was skipped.
    SkippedEntry,
}

/// A decoded year plus whatever had to be patched up on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedYear {
    /// The year as it will enter the tree.
    pub year: BudgetYear,
    /// Degradations applied while decoding.
    pub issues: Vec<DocumentIssue>,
}

/// Decodes one persisted year document.
///
/// The `year` field wins over the document key when it is a non-blank string
/// or a number.
///
/// # Errors
///
/// Returns `BudgetError::MissingYear` only when both the `year` field and the
/// document key are blank.
pub fn decode_year(doc_key: &str, doc: &Value) -> Result<DecodedYear, BudgetError> {
    let mut issues = Vec::new();
    let empty = Map::new();
    let fields = if let Value::Object(map) = doc {
        map
    } else {
        issues.push(DocumentIssue::NotAnObject);
        &empty
    };

    let declared = match fields.get("year") {
        Some(Value::String(s)) => YearKey::parse(s).ok(),
        Some(Value::Number(n)) => YearKey::parse(&n.to_string()).ok(),
        _ => None,
    };
    let year = if let Some(key) = declared {
        key
    } else {
        issues.push(DocumentIssue::YearFromKey);
        YearKey::parse(doc_key)?
    };

    let total = match fields.get("total") {
        None | Some(Value::Null) => {
            issues.push(DocumentIssue::MissingTotal);
            0
        }
        Some(value @ Value::Number(_)) => amount_from_json(value),
        Some(value) => {
            issues.push(DocumentIssue::LenientTotal);
            amount_from_json(value)
        }
    };

    let sectors = if let Some(Value::Array(items)) = fields.get("sectors") {
        items
            .iter()
            .filter_map(|item| decode_sector(item, &mut issues))
            .collect()
    } else {
        issues.push(DocumentIssue::MissingSectors);
        Vec::new()
    };

    Ok(DecodedYear {
        year: BudgetYear {
            year,
            total,
            sectors,
        },
        issues,
    })
}

fn decode_sector(item: &Value, issues: &mut Vec<DocumentIssue>) -> Option<Sector> {
    let Value::Object(fields) = item else {
        issues.push(DocumentIssue::SkippedEntry);
        return None;
    };

    let subs = match fields.get("subs") {
        Some(Value::Array(subs)) => subs
            .iter()
            .filter_map(|sub| decode_sub(sub, issues))
            .collect(),
        _ => Vec::new(),
    };

    Some(Sector {
        id: id_field(fields, issues).map_or_else(SectorId::new, SectorId::from_raw),
        name: text_field(fields, "name"),
        percentage: percent_from_json(fields.get("percentage").unwrap_or(&Value::Null)),
        subs,
    })
}

fn decode_sub(item: &Value, issues: &mut Vec<DocumentIssue>) -> Option<SubItem> {
    let Value::Object(fields) = item else {
        issues.push(DocumentIssue::SkippedEntry);
        return None;
    };

    let note = text_field(fields, "note");
    Some(SubItem {
        id: id_field(fields, issues).map_or_else(SubItemId::new, SubItemId::from_raw),
        name: text_field(fields, "name"),
        percentage: percent_from_json(fields.get("percentage").unwrap_or(&Value::Null)),
        note: (!note.is_empty()).then_some(note),
    })
}

fn id_field(fields: &Map<String, Value>, issues: &mut Vec<DocumentIssue>) -> Option<String> {
    let id = match fields.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    if id.is_none() {
        issues.push(DocumentIssue::MissingId);
    }
    id
}

fn text_field(fields: &Map<String, Value>, name: &str) -> String {
    match fields.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Encodes a year as the top-level fields of its persisted document.
///
/// `updated_at` is left to the store, which stamps it on save.
#[must_use]
pub fn encode_year(year: &BudgetYear) -> Map<String, Value> {
    match serde_json::to_value(year) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
