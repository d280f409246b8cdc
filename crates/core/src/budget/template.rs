//! Default sector template for newly opened years.

use rust_decimal::Decimal;

use super::percent::Percent;
use super::types::Sector;

/// Sector names and starting shares (percent of the year total).
pub const DEFAULT_SECTORS: [(&str, u32); 7] = [
    ("Pendidikan", 20),
    ("Kesehatan", 15),
    ("Infrastruktur & Pekerjaan Umum", 25),
    ("Belanja Pegawai", 30),
    ("Pelayanan Publik & Sosial", 5),
    ("Ekonomi & Pembangunan Desa", 3),
    ("Operasional Pemerintahan", 2),
];

/// Fresh sectors for the template, each with a new id and no sub-items.
#[must_use]
pub fn default_sectors() -> Vec<Sector> {
    DEFAULT_SECTORS
        .iter()
        .map(|(name, pct)| Sector::named(*name, Percent::new(Decimal::from(*pct))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::percent::sum_percent;
    use rust_decimal_macros::dec;

    #[test]
    fn test_template_fully_allocates() {
        let sectors = default_sectors();
        assert_eq!(sectors.len(), DEFAULT_SECTORS.len());
        assert_eq!(sum_percent(&sectors), dec!(100));
        assert!(sectors.iter().all(|s| s.subs.is_empty()));
    }

    #[test]
    fn test_template_ids_are_fresh() {
        let first = default_sectors();
        let second = default_sectors();
        assert!(first.iter().zip(&second).all(|(a, b)| a.id != b.id));
    }
}
