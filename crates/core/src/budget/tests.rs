//! Property-based tests for budget module.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::allocation::AllocationCalculator;
use super::document::{decode_year, encode_year};
use super::percent::{Percent, amount_of, clamp_percent, parse_percent};
use super::tree::BudgetTree;
use super::types::{BudgetYear, Sector, SubItem, YearKey};
use serde_json::Value;

/// Percentages with up to two decimals in [lo, hi].
fn percent_in(lo: i64, hi: i64) -> impl Strategy<Value = Decimal> {
    (lo * 100..=hi * 100).prop_map(|cents| Decimal::new(cents, 2))
}

fn sector_strategy() -> impl Strategy<Value = Sector> {
    (
        "[A-Za-z &]{0,20}",
        percent_in(0, 100),
        prop::collection::vec(("[a-z ]{0,12}", percent_in(0, 100)), 0..6),
    )
        .prop_map(|(name, pct, subs)| {
            let mut sector = Sector::named(name, Percent::new(pct));
            sector.subs = subs
                .into_iter()
                .map(|(name, pct)| SubItem {
                    name,
                    percentage: Percent::new(pct),
                    ..SubItem::blank()
                })
                .collect();
            sector
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Clamping lands in [0, 100] and clamping twice changes nothing.
    #[test]
    fn test_clamp_is_bounded_and_idempotent(pct in percent_in(-1000, 1000)) {
        let once = clamp_percent(pct);
        prop_assert!(once.value() >= Decimal::ZERO);
        prop_assert!(once.value() <= Decimal::ONE_HUNDRED);
        prop_assert_eq!(clamp_percent(once.value()), once);
    }

    /// A share never exceeds the whole, and 0%/100% are exact.
    #[test]
    fn test_amount_of_bounds(total in 0u64..=10_000_000_000_000, pct in percent_in(0, 100)) {
        let pct = Percent::new(pct);
        prop_assert!(amount_of(total, pct) <= total);
        prop_assert_eq!(amount_of(total, Percent::ZERO), 0);
        prop_assert_eq!(amount_of(total, Percent::HUNDRED), total);
    }

    /// Free-form input never escapes [0, 100].
    #[test]
    fn test_parse_percent_never_escapes_range(raw in ".{0,24}") {
        let pct = parse_percent(&raw);
        prop_assert!(pct >= Percent::ZERO && pct <= Percent::HUNDRED);
    }

    /// Used and remaining always add back up to the sector amount.
    #[test]
    fn test_used_plus_remaining_is_sector_amount(
        total in 0u64..=1_000_000_000_000,
        sector in sector_strategy(),
    ) {
        let alloc = AllocationCalculator::sector(total, &sector);
        prop_assert_eq!(alloc.used_amount + alloc.remaining_amount, alloc.amount);
        prop_assert!(alloc.amount <= total);
        prop_assert_eq!(alloc.used_percent.value() + alloc.remaining_percent.value(), Decimal::ONE_HUNDRED);
    }

    /// Adding then removing a sector by id restores the list.
    #[test]
    fn test_add_remove_sector_roundtrip(sectors in prop::collection::vec(sector_strategy(), 0..5)) {
        let key = YearKey::parse("2025").unwrap();
        let mut tree = BudgetTree::from_years([BudgetYear { year: key.clone(), total: 0, sectors }]);
        let before = tree.clone();

        let id = tree.add_sector(&key);
        prop_assert!(tree.remove_sector(&key, &id));
        prop_assert_eq!(tree, before);
    }

    /// Adding then removing a sub-item by id restores the sector.
    #[test]
    fn test_add_remove_sub_roundtrip(sector in sector_strategy()) {
        let key = YearKey::parse("2025").unwrap();
        let sector_id = sector.id.clone();
        let mut tree = BudgetTree::from_years([BudgetYear { year: key.clone(), total: 0, sectors: vec![sector] }]);
        let before = tree.clone();

        let sub = tree.add_sub(&key, &sector_id).unwrap();
        prop_assert!(tree.remove_sub(&key, &sector_id, &sub));
        prop_assert_eq!(tree, before);
    }

    /// A year written as a document decodes back to the same year.
    #[test]
    fn test_document_roundtrip(
        total in 0u64..=1_000_000_000_000,
        sectors in prop::collection::vec(sector_strategy(), 0..5),
    ) {
        let year = BudgetYear { year: YearKey::parse("2025").unwrap(), total, sectors };
        let decoded = decode_year("2025", &Value::Object(encode_year(&year))).unwrap();
        prop_assert_eq!(decoded.year, year);
    }
}
