//! Display view-models for the public budget page and the admin summary.
//!
//! Pure functions of the tree and its allocation; no markup, just the
//! numbers and labels a template needs.

use desa_shared::types::{SectorId, SubItemId};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::allocation::{AllocationCalculator, SectorAllocation, SubAllocation, YearAllocation};
use super::tree::BudgetTree;
use super::types::{BudgetYear, YearKey};

/// Name shown for a sector without one.
pub const SECTOR_FALLBACK_NAME: &str = "Sektor";
/// Name shown for a sub-item without one.
pub const SUB_FALLBACK_NAME: &str = "Sub-kegiatan";

/// Which years the public page shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum YearFilter {
    /// Every year, newest first.
    #[default]
    All,
    /// One year only.
    Year(YearKey),
}

impl YearFilter {
    /// Reads a filter from a select value; blank or `"all"` means every year.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        YearKey::parse(raw).map_or(Self::All, Self::Year)
    }

    /// Falls back to [`YearFilter::All`] when the selected year no longer exists.
    #[must_use]
    pub fn resolve(self, tree: &BudgetTree) -> Self {
        match self {
            Self::Year(key) if tree.get(&key).is_some() => Self::Year(key),
            _ => Self::All,
        }
    }
}

/// One sub-item row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubView {
    /// Sub-item id.
    pub id: SubItemId,
    /// Display name.
    pub name: String,
    /// Note, when present.
    pub note: Option<String>,
    /// Share of the sector, one decimal.
    pub percent_label: String,
    /// Amount in currency units.
    pub amount: u64,
    /// Amount formatted as rupiah.
    pub amount_label: String,
}

/// One sector card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorView {
    /// Sector id.
    pub id: SectorId,
    /// Display name.
    pub name: String,
    /// Share of the year total, one decimal.
    pub percent_label: String,
    /// Sector amount.
    pub amount: u64,
    /// Sector amount formatted as rupiah.
    pub amount_label: String,
    /// Used share of the sector, one decimal.
    pub used_percent_label: String,
    /// Remaining share of the sector, one decimal.
    pub remaining_percent_label: String,
    /// Used amount formatted as rupiah.
    pub used_amount_label: String,
    /// Remaining amount formatted as rupiah.
    pub remaining_amount_label: String,
    /// Progress bar width in percent, one decimal.
    pub bar_width: String,
    /// Sub-item rows.
    pub subs: Vec<SubView>,
}

/// One year card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearView {
    /// Year key.
    pub year: YearKey,
    /// Year total.
    pub total: u64,
    /// Year total formatted as rupiah.
    pub total_label: String,
    /// Sum of sector shares, one decimal.
    pub sector_percent_label: String,
    /// Share not yet handed out, one decimal.
    pub unallocated_percent_label: String,
    /// Sector cards.
    pub sectors: Vec<SectorView>,
}

/// Renders one year from its allocation.
///
/// The allocation must have been computed from `year`; the identity and the
/// total come from the year, every derived figure from the allocation.
#[must_use]
pub fn render(year: &BudgetYear, allocation: &YearAllocation) -> YearView {
    YearView {
        year: year.year.clone(),
        total: year.total,
        total_label: format_rupiah(year.total),
        sector_percent_label: percent_label(allocation.sector_percent_sum),
        unallocated_percent_label: percent_label(allocation.unallocated_percent),
        sectors: allocation.sectors.iter().map(render_sector).collect(),
    }
}

/// Computes and renders one year.
#[must_use]
pub fn render_year(year: &BudgetYear) -> YearView {
    render(year, &AllocationCalculator::year(year))
}

/// Renders the years selected by `filter`, newest first.
#[must_use]
pub fn render_public(tree: &BudgetTree, filter: &YearFilter) -> Vec<YearView> {
    tree.years_desc()
        .into_iter()
        .filter(|y| match filter {
            YearFilter::All => true,
            YearFilter::Year(key) => &y.year == key,
        })
        .map(render_year)
        .collect()
}

/// Year keys for the year selector, newest first.
#[must_use]
pub fn year_options(tree: &BudgetTree) -> Vec<YearKey> {
    tree.years_desc().into_iter().map(|y| y.year.clone()).collect()
}

fn render_sector(sector: &SectorAllocation) -> SectorView {
    SectorView {
        id: sector.id.clone(),
        name: display_name(&sector.name, SECTOR_FALLBACK_NAME),
        percent_label: percent_label(sector.percentage.value()),
        amount: sector.amount,
        amount_label: format_rupiah(sector.amount),
        used_percent_label: percent_label(sector.used_percent.value()),
        remaining_percent_label: percent_label(sector.remaining_percent.value()),
        used_amount_label: format_rupiah(sector.used_amount),
        remaining_amount_label: format_rupiah(sector.remaining_amount),
        bar_width: percent_label(sector.percentage.value()),
        subs: sector.subs.iter().map(render_sub).collect(),
    }
}

fn render_sub(sub: &SubAllocation) -> SubView {
    SubView {
        id: sub.id.clone(),
        name: display_name(&sub.name, SUB_FALLBACK_NAME),
        note: sub.note.clone(),
        percent_label: percent_label(sub.percentage.value()),
        amount: sub.amount,
        amount_label: format_rupiah(sub.amount),
    }
}

fn display_name(name: &str, fallback: &str) -> String {
    if name.is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

/// Formats a percentage with exactly one decimal, rounding half-up.
#[must_use]
pub fn percent_label(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.1}")
}

/// Formats an amount as Indonesian rupiah: `Rp 1.234.567`.
#[must_use]
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp {grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::percent::Percent;
    use crate::budget::types::{Sector, SubItem};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn key(raw: &str) -> YearKey {
        YearKey::parse(raw).unwrap()
    }

    #[rstest]
    #[case(0, "Rp 0")]
    #[case(999, "Rp 999")]
    #[case(1_000, "Rp 1.000")]
    #[case(20_000_000, "Rp 20.000.000")]
    #[case(1_234_567_890, "Rp 1.234.567.890")]
    fn test_format_rupiah(#[case] amount: u64, #[case] expected: &str) {
        assert_eq!(format_rupiah(amount), expected);
    }

    #[rstest]
    #[case(dec!(20), "20.0")]
    #[case(dec!(12.25), "12.3")]
    #[case(dec!(33.333), "33.3")]
    #[case(dec!(0), "0.0")]
    fn test_percent_label(#[case] value: Decimal, #[case] expected: &str) {
        assert_eq!(percent_label(value), expected);
    }

    #[test]
    fn test_render_uses_fallback_names() {
        let mut sector = Sector::named("", Percent::new(dec!(20)));
        sector.subs.push(SubItem::blank());
        let year = BudgetYear {
            year: key("2025"),
            total: 100_000_000,
            sectors: vec![sector],
        };

        let view = render_year(&year);
        assert_eq!(view.total_label, "Rp 100.000.000");
        assert_eq!(view.sector_percent_label, "20.0");
        assert_eq!(view.unallocated_percent_label, "80.0");
        assert_eq!(view.sectors[0].name, SECTOR_FALLBACK_NAME);
        assert_eq!(view.sectors[0].bar_width, "20.0");
        assert_eq!(view.sectors[0].amount_label, "Rp 20.000.000");
        assert_eq!(view.sectors[0].remaining_percent_label, "100.0");
        assert_eq!(view.sectors[0].subs[0].name, SUB_FALLBACK_NAME);
    }

    #[test]
    fn test_render_public_filters_and_orders() {
        let tree = BudgetTree::from_years([
            BudgetYear::empty(key("2023")),
            BudgetYear::empty(key("2025")),
            BudgetYear::empty(key("2024")),
        ]);

        let all: Vec<String> = render_public(&tree, &YearFilter::All)
            .into_iter()
            .map(|v| v.year.to_string())
            .collect();
        assert_eq!(all, ["2025", "2024", "2023"]);

        let one = render_public(&tree, &YearFilter::Year(key("2024")));
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].year.as_str(), "2024");

        assert!(render_public(&BudgetTree::new(), &YearFilter::All).is_empty());
        assert_eq!(
            year_options(&tree)
                .iter()
                .map(YearKey::as_str)
                .collect::<Vec<_>>(),
            ["2025", "2024", "2023"]
        );
    }

    #[test]
    fn test_year_filter_parse_and_resolve() {
        assert_eq!(YearFilter::parse("all"), YearFilter::All);
        assert_eq!(YearFilter::parse(""), YearFilter::All);
        assert_eq!(YearFilter::parse(" 2025 "), YearFilter::Year(key("2025")));

        let tree = BudgetTree::from_years([BudgetYear::empty(key("2025"))]);
        assert_eq!(
            YearFilter::parse("2025").resolve(&tree),
            YearFilter::Year(key("2025"))
        );
        assert_eq!(YearFilter::parse("1999").resolve(&tree), YearFilter::All);
    }
}
