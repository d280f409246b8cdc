//! In-memory budget tree: year map plus id-addressed mutation primitives.
//!
//! Nodes are always located by id, never by position, so an edit aimed at a
//! node keeps hitting that node even if the list was reordered meanwhile.

use std::collections::BTreeMap;
use std::fmt;

use desa_shared::types::{SectorId, SubItemId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{BudgetError, Target};
use super::percent::{amount_from_json, percent_from_json};
use super::types::{BudgetYear, Sector, SubItem, YearKey};

/// Editable field of a budget node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Sector or sub-item name.
    Name,
    /// Sector or sub-item percentage.
    Percentage,
    /// Sub-item note.
    Note,
    /// Year total.
    Total,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Percentage => write!(f, "percentage"),
            Self::Note => write!(f, "note"),
            Self::Total => write!(f, "total"),
        }
    }
}

/// Address of a field inside one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Owning sector, if any.
    pub sector: Option<SectorId>,
    /// Sub-item, if any. Without `sector` the sub-item is searched in every sector.
    pub sub: Option<SubItemId>,
    /// Field to write.
    pub field: Field,
}

impl FieldPath {
    /// The year total.
    #[must_use]
    pub const fn total() -> Self {
        Self {
            sector: None,
            sub: None,
            field: Field::Total,
        }
    }

    /// A sector field.
    #[must_use]
    pub const fn sector(sector: SectorId, field: Field) -> Self {
        Self {
            sector: Some(sector),
            sub: None,
            field,
        }
    }

    /// A sub-item field.
    #[must_use]
    pub const fn sub(sector: SectorId, sub: SubItemId, field: Field) -> Self {
        Self {
            sector: Some(sector),
            sub: Some(sub),
            field,
        }
    }

    /// Kind of node this path resolves to.
    #[must_use]
    pub const fn target(&self) -> Target {
        match (&self.sector, &self.sub) {
            (None, None) => Target::Year,
            (Some(_), None) => Target::Sector,
            (_, Some(_)) => Target::SubItem,
        }
    }

    fn check(&self) -> Result<Target, BudgetError> {
        let target = self.target();
        match (target, self.field) {
            (Target::Year, Field::Total)
            | (Target::Sector, Field::Name | Field::Percentage)
            | (Target::SubItem, Field::Name | Field::Percentage | Field::Note) => Ok(target),
            (target, field) => Err(BudgetError::UnsupportedField { field, target }),
        }
    }
}

/// All known budget years keyed by year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetTree {
    years: BTreeMap<YearKey, BudgetYear>,
}

impl BudgetTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from years; a later duplicate key wins.
    #[must_use]
    pub fn from_years(years: impl IntoIterator<Item = BudgetYear>) -> Self {
        Self {
            years: years.into_iter().map(|y| (y.year.clone(), y)).collect(),
        }
    }

    /// Number of years held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Whether no year is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Looks up a year.
    #[must_use]
    pub fn get(&self, key: &YearKey) -> Option<&BudgetYear> {
        self.years.get(key)
    }

    /// Years sorted newest first (see [`YearKey::cmp_desc`]).
    #[must_use]
    pub fn years_desc(&self) -> Vec<&BudgetYear> {
        let mut years: Vec<&BudgetYear> = self.years.values().collect();
        years.sort_by(|a, b| a.year.cmp_desc(&b.year));
        years
    }

    /// Returns the year, seeding it from the default template on first access.
    pub fn ensure_year(&mut self, key: &YearKey) -> &mut BudgetYear {
        self.years
            .entry(key.clone())
            .or_insert_with(|| BudgetYear::seeded(key.clone()))
    }

    /// Replaces the year's total and sectors with a fresh template seed.
    pub fn reset_year(&mut self, key: &YearKey) -> &mut BudgetYear {
        let year = self.ensure_year(key);
        *year = BudgetYear::seeded(key.clone());
        year
    }

    /// Inserts or replaces one year.
    pub fn insert(&mut self, year: BudgetYear) {
        self.years.insert(year.year.clone(), year);
    }

    /// Swaps the whole year map.
    pub fn replace_all(&mut self, years: impl IntoIterator<Item = BudgetYear>) {
        *self = Self::from_years(years);
    }

    /// Appends a blank sector and returns its id.
    pub fn add_sector(&mut self, key: &YearKey) -> SectorId {
        let sector = Sector::blank();
        let id = sector.id.clone();
        self.ensure_year(key).sectors.push(sector);
        id
    }

    /// Removes a sector by id. Unknown year or id is a no-op returning `false`.
    pub fn remove_sector(&mut self, key: &YearKey, sector: &SectorId) -> bool {
        let Some(year) = self.years.get_mut(key) else {
            return false;
        };
        let before = year.sectors.len();
        year.sectors.retain(|s| &s.id != sector);
        year.sectors.len() != before
    }

    /// Appends a blank sub-item to a sector. Unknown sector is a no-op returning `None`.
    pub fn add_sub(&mut self, key: &YearKey, sector: &SectorId) -> Option<SubItemId> {
        let sector = self.ensure_year(key).sector_mut(sector)?;
        let sub = SubItem::blank();
        let id = sub.id.clone();
        sector.subs.push(sub);
        Some(id)
    }

    /// Removes a sub-item by id. Unknown ids are a no-op returning `false`.
    pub fn remove_sub(&mut self, key: &YearKey, sector: &SectorId, sub: &SubItemId) -> bool {
        let Some(sector) = self
            .years
            .get_mut(key)
            .and_then(|year| year.sector_mut(sector))
        else {
            return false;
        };
        let before = sector.subs.len();
        sector.subs.retain(|s| &s.id != sub);
        sector.subs.len() != before
    }

    /// Writes free-form text into the field addressed by `path`.
    ///
    /// Same as [`BudgetTree::set_field_value`] with a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::UnsupportedField` when the field does not exist on
    /// the addressed node kind.
    pub fn set_field(
        &mut self,
        key: &YearKey,
        path: &FieldPath,
        raw: &str,
    ) -> Result<bool, BudgetError> {
        self.set_field_value(key, path, &Value::String(raw.to_string()))
    }

    /// Writes a JSON input value into the field addressed by `path`.
    ///
    /// Numbers are taken at their numeric value: percentages clamp, totals
    /// round half-up and negatives become 0. Strings are tolerant-parsed.
    /// Returns `Ok(false)` when the addressed sector or sub-item does not exist.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::UnsupportedField` when the field does not exist on
    /// the addressed node kind; the tree is untouched in that case.
    pub fn set_field_value(
        &mut self,
        key: &YearKey,
        path: &FieldPath,
        value: &Value,
    ) -> Result<bool, BudgetError> {
        let target = path.check()?;
        let year = self.ensure_year(key);

        match target {
            Target::Year => {
                year.total = amount_from_json(value);
                Ok(true)
            }
            Target::Sector => {
                let Some(sector) = path.sector.as_ref().and_then(|id| year.sector_mut(id)) else {
                    return Ok(false);
                };
                match path.field {
                    Field::Name => sector.name = text_of(value),
                    Field::Percentage => sector.percentage = percent_from_json(value),
                    Field::Note | Field::Total => {}
                }
                Ok(true)
            }
            Target::SubItem => {
                let Some(sub_id) = path.sub.as_ref() else {
                    return Ok(false);
                };
                let sector = match path.sector.as_ref() {
                    Some(id) => year.sector_mut(id),
                    None => year.sector_of_sub_mut(sub_id),
                };
                let Some(sub) = sector.and_then(|s| s.sub_mut(sub_id)) else {
                    return Ok(false);
                };
                match path.field {
                    Field::Name => sub.name = text_of(value),
                    Field::Percentage => sub.percentage = percent_from_json(value),
                    Field::Note => {
                        let note = text_of(value);
                        sub.note = (!note.is_empty()).then_some(note);
                    }
                    Field::Total => {}
                }
                Ok(true)
            }
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
