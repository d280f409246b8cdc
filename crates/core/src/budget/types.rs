//! Budget tree data types.

use std::cmp::Ordering;
use std::fmt;

use desa_shared::types::{SectorId, SubItemId};
use serde::{Serialize, Serializer};

use super::error::BudgetError;
use super::percent::{Percent, Weighted};
use super::template;

/// Identity of one budget year (trimmed, never empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct YearKey(String);

impl YearKey {
    /// Parses a year key from free-form input.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::MissingYear` when the input is blank.
    pub fn parse(raw: &str) -> Result<Self, BudgetError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BudgetError::MissingYear);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the key, when it is one.
    #[must_use]
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Ordering for year listings: newest numeric year first, then
    /// non-numeric keys in descending lexical order.
    #[must_use]
    pub fn cmp_desc(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => other.0.cmp(&self.0),
        }
    }
}

impl fmt::Display for YearKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A line item owning a share of its sector's amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubItem {
    /// Stable id.
    pub id: SubItemId,
    /// Display name.
    pub name: String,
    /// Share of the sector amount.
    pub percentage: Percent,
    /// Optional remark; written as `""` when absent.
    #[serde(serialize_with = "serialize_note")]
    pub note: Option<String>,
}

impl SubItem {
    /// A fresh sub-item: new id, empty name and note, 0%.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            id: SubItemId::new(),
            name: String::new(),
            percentage: Percent::ZERO,
            note: None,
        }
    }
}

impl Weighted for SubItem {
    fn percent(&self) -> Percent {
        self.percentage
    }
}

/// A top-level budget category owning a share of the year total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sector {
    /// Stable id.
    pub id: SectorId,
    /// Display name.
    pub name: String,
    /// Share of the year total.
    pub percentage: Percent,
    /// Sub-items in display order.
    pub subs: Vec<SubItem>,
}

impl Sector {
    /// A fresh sector: new id, empty name, 0%, no sub-items.
    #[must_use]
    pub fn blank() -> Self {
        Self::named("", Percent::ZERO)
    }

    /// A new sector with the given name and share.
    #[must_use]
    pub fn named(name: impl Into<String>, percentage: Percent) -> Self {
        Self {
            id: SectorId::new(),
            name: name.into(),
            percentage,
            subs: Vec::new(),
        }
    }

    /// Looks up a sub-item by id.
    #[must_use]
    pub fn sub(&self, id: &SubItemId) -> Option<&SubItem> {
        self.subs.iter().find(|s| &s.id == id)
    }

    /// Looks up a sub-item by id for mutation.
    pub fn sub_mut(&mut self, id: &SubItemId) -> Option<&mut SubItem> {
        self.subs.iter_mut().find(|s| &s.id == id)
    }
}

impl Weighted for Sector {
    fn percent(&self) -> Percent {
        self.percentage
    }
}

/// One year's budget: total plus its sector tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetYear {
    /// Year key.
    pub year: YearKey,
    /// Total budget in whole currency units.
    pub total: u64,
    /// Sectors in display order.
    pub sectors: Vec<Sector>,
}

impl BudgetYear {
    /// An empty year with no sectors.
    #[must_use]
    pub fn empty(year: YearKey) -> Self {
        Self {
            year,
            total: 0,
            sectors: Vec::new(),
        }
    }

    /// A year seeded from the default sector template, total 0.
    #[must_use]
    pub fn seeded(year: YearKey) -> Self {
        Self {
            year,
            total: 0,
            sectors: template::default_sectors(),
        }
    }

    /// Looks up a sector by id.
    #[must_use]
    pub fn sector(&self, id: &SectorId) -> Option<&Sector> {
        self.sectors.iter().find(|s| &s.id == id)
    }

    /// Looks up a sector by id for mutation.
    pub fn sector_mut(&mut self, id: &SectorId) -> Option<&mut Sector> {
        self.sectors.iter_mut().find(|s| &s.id == id)
    }

    /// Finds the sector owning a sub-item.
    pub fn sector_of_sub_mut(&mut self, sub: &SubItemId) -> Option<&mut Sector> {
        self.sectors
            .iter_mut()
            .find(|s| s.subs.iter().any(|x| &x.id == sub))
    }
}

#[allow(clippy::ref_option)]
fn serialize_note<S: Serializer>(note: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(note.as_deref().unwrap_or_default())
}
