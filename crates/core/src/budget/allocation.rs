//! Allocation of the year total down the sector tree.
//!
//! Two tiers of percentage-of-percentage: a sector owns a share of the year
//! total, a sub-item owns a share of its sector's *derived* amount. The
//! per-sector "used" figure caps the sub-item sum at 100%, while each sub-item
//! amount is computed from its own raw percentage. Sub-items summing past 100%
//! therefore itemize to more than the sector amount; that is kept as-is.

use desa_shared::types::{SectorId, SubItemId};
use rust_decimal::Decimal;
use serde::Serialize;

use super::percent::{Percent, amount_of, clamp_percent, sum_percent, unallocated_percent};
use super::types::{BudgetYear, Sector, YearKey};

/// Derived amounts for one sub-item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubAllocation {
    /// Sub-item id.
    pub id: SubItemId,
    /// Sub-item name.
    pub name: String,
    /// Share of the sector amount.
    pub percentage: Percent,
    /// Optional note.
    pub note: Option<String>,
    /// `amount_of(sector_amount, percentage)`, uncapped.
    pub amount: u64,
}

/// Derived amounts for one sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorAllocation {
    /// Sector id.
    pub id: SectorId,
    /// Sector name.
    pub name: String,
    /// Share of the year total.
    pub percentage: Percent,
    /// `amount_of(total, percentage)`.
    pub amount: u64,
    /// Raw sum of sub-item percentages (may exceed 100).
    #[serde(with = "rust_decimal::serde::float")]
    pub subs_percent_sum: Decimal,
    /// Sub-item sum capped at 100.
    pub used_percent: Percent,
    /// `amount_of(amount, used_percent)`.
    pub used_amount: u64,
    /// `100 - used_percent`.
    pub remaining_percent: Percent,
    /// `amount - used_amount`, never negative.
    pub remaining_amount: u64,
    /// Sub-items in display order.
    pub subs: Vec<SubAllocation>,
}

/// Derived amounts for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearAllocation {
    /// Year key.
    pub year: YearKey,
    /// Year total.
    pub total: u64,
    /// Sum of sector percentages (may exceed 100).
    #[serde(with = "rust_decimal::serde::float")]
    pub sector_percent_sum: Decimal,
    /// `max(0, 100 - sector_percent_sum)`.
    #[serde(with = "rust_decimal::serde::float")]
    pub unallocated_percent: Decimal,
    /// Sectors in display order.
    pub sectors: Vec<SectorAllocation>,
}

impl YearAllocation {
    /// Looks up a sector's allocation by id.
    #[must_use]
    pub fn sector(&self, id: &SectorId) -> Option<&SectorAllocation> {
        self.sectors.iter().find(|s| &s.id == id)
    }
}

/// Stateless calculator; every call derives fresh numbers from percentages and total.
pub struct AllocationCalculator;

impl AllocationCalculator {
    /// Allocates a sector's share of `total` and splits it across its sub-items.
    #[must_use]
    pub fn sector(total: u64, sector: &Sector) -> SectorAllocation {
        let amount = amount_of(total, sector.percentage);
        let subs_percent_sum = sum_percent(&sector.subs);
        let used_percent = clamp_percent(subs_percent_sum);
        let used_amount = amount_of(amount, used_percent);

        let subs = sector
            .subs
            .iter()
            .map(|sub| SubAllocation {
                id: sub.id.clone(),
                name: sub.name.clone(),
                percentage: sub.percentage,
                note: sub.note.clone(),
                amount: amount_of(amount, sub.percentage),
            })
            .collect();

        SectorAllocation {
            id: sector.id.clone(),
            name: sector.name.clone(),
            percentage: sector.percentage,
            amount,
            subs_percent_sum,
            used_percent,
            used_amount,
            remaining_percent: used_percent.complement(),
            remaining_amount: amount.saturating_sub(used_amount),
            subs,
        }
    }

    /// Allocates a whole year.
    #[must_use]
    pub fn year(year: &BudgetYear) -> YearAllocation {
        let sector_percent_sum = sum_percent(&year.sectors);

        YearAllocation {
            year: year.year.clone(),
            total: year.total,
            sector_percent_sum,
            unallocated_percent: unallocated_percent(sector_percent_sum),
            sectors: year
                .sectors
                .iter()
                .map(|sector| Self::sector(year.total, sector))
                .collect(),
        }
    }
}
