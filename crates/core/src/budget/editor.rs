//! Admin-side budget editing.
//!
//! Every entry point asks the privilege gate first; an unprivileged call
//! returns `BudgetError::PermissionDenied` before touching the tree. Every
//! successful call returns the year's freshly recomputed allocation, so the
//! caller never renders a summary older than the last edit.

use desa_shared::types::{SectorId, SubItemId};
use serde::Serialize;
use serde_json::Value;

use super::allocation::{AllocationCalculator, YearAllocation};
use super::error::BudgetError;
use super::tree::{BudgetTree, FieldPath};
use super::types::YearKey;
use crate::privilege::PrivilegeGate;

/// Node created by a structural edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRef {
    /// A new sector.
    Sector {
        /// Sector id.
        id: SectorId,
    },
    /// A new sub-item.
    SubItem {
        /// Owning sector.
        sector: SectorId,
        /// Sub-item id.
        id: SubItemId,
    },
}

/// Result of an editor call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    /// Node created by the call, if any.
    pub created: Option<NodeRef>,
    /// Whether the tree was modified.
    pub changed: bool,
    /// Allocation recomputed after the edit.
    pub summary: YearAllocation,
}

/// Budget editor bound to a privilege gate.
pub struct BudgetEditor<G> {
    gate: G,
}

impl<G: PrivilegeGate> BudgetEditor<G> {
    /// Creates an editor consulting `gate` on every call.
    #[must_use]
    pub const fn new(gate: G) -> Self {
        Self { gate }
    }

    fn authorize(&self) -> Result<(), BudgetError> {
        if self.gate.is_privileged() {
            Ok(())
        } else {
            Err(BudgetError::PermissionDenied)
        }
    }

    fn outcome(
        tree: &mut BudgetTree,
        key: &YearKey,
        created: Option<NodeRef>,
        changed: bool,
    ) -> EditOutcome {
        EditOutcome {
            created,
            changed,
            summary: AllocationCalculator::year(tree.ensure_year(key)),
        }
    }

    /// Opens a year for editing, seeding it from the template on first access.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PermissionDenied` when the caller is not privileged.
    pub fn open_year(&self, tree: &mut BudgetTree, key: &YearKey) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        let existed = tree.get(key).is_some();
        Ok(Self::outcome(tree, key, None, !existed))
    }

    /// Writes a free-form value into a name, percentage, note or total field.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PermissionDenied` when the caller is not privileged,
    /// or `BudgetError::UnsupportedField` for a field the node does not have.
    pub fn set_field(
        &self,
        tree: &mut BudgetTree,
        key: &YearKey,
        path: &FieldPath,
        raw: &str,
    ) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        let changed = tree.set_field(key, path, raw)?;
        Ok(Self::outcome(tree, key, None, changed))
    }

    /// Writes a JSON input value; numbers keep their numeric value.
    ///
    /// # Errors
    ///
    /// Same as [`BudgetEditor::set_field`].
    pub fn set_field_value(
        &self,
        tree: &mut BudgetTree,
        key: &YearKey,
        path: &FieldPath,
        value: &Value,
    ) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        let changed = tree.set_field_value(key, path, value)?;
        Ok(Self::outcome(tree, key, None, changed))
    }

    /// Appends a blank sector.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PermissionDenied` when the caller is not privileged.
    pub fn add_sector(&self, tree: &mut BudgetTree, key: &YearKey) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        let id = tree.add_sector(key);
        Ok(Self::outcome(tree, key, Some(NodeRef::Sector { id }), true))
    }

    /// Removes a sector; an unknown id changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PermissionDenied` when the caller is not privileged.
    pub fn remove_sector(
        &self,
        tree: &mut BudgetTree,
        key: &YearKey,
        sector: &SectorId,
    ) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        tree.ensure_year(key);
        let changed = tree.remove_sector(key, sector);
        Ok(Self::outcome(tree, key, None, changed))
    }

    /// Appends a blank sub-item to a sector; an unknown sector changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PermissionDenied` when the caller is not privileged.
    pub fn add_sub(
        &self,
        tree: &mut BudgetTree,
        key: &YearKey,
        sector: &SectorId,
    ) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        let created = tree.add_sub(key, sector).map(|id| NodeRef::SubItem {
            sector: sector.clone(),
            id,
        });
        let changed = created.is_some();
        Ok(Self::outcome(tree, key, created, changed))
    }

    /// Removes a sub-item; unknown ids change nothing.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PermissionDenied` when the caller is not privileged.
    pub fn remove_sub(
        &self,
        tree: &mut BudgetTree,
        key: &YearKey,
        sector: &SectorId,
        sub: &SubItemId,
    ) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        tree.ensure_year(key);
        let changed = tree.remove_sub(key, sector, sub);
        Ok(Self::outcome(tree, key, None, changed))
    }

    /// Discards the year's sectors and total and reseeds from the template.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PermissionDenied` when the caller is not privileged.
    pub fn reset_year(&self, tree: &mut BudgetTree, key: &YearKey) -> Result<EditOutcome, BudgetError> {
        self.authorize()?;
        tree.reset_year(key);
        Ok(Self::outcome(tree, key, None, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::percent::Percent;
    use crate::budget::tree::Field;
    use crate::privilege::StaticPrivilege;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::cell::Cell;

    fn key() -> YearKey {
        YearKey::parse("2025").unwrap()
    }

    fn admin() -> BudgetEditor<StaticPrivilege> {
        BudgetEditor::new(StaticPrivilege(true))
    }

    #[test]
    fn test_open_year_seeds_once() {
        let mut tree = BudgetTree::new();
        let first = admin().open_year(&mut tree, &key()).unwrap();
        assert!(first.changed);
        assert_eq!(first.summary.sector_percent_sum, dec!(100));

        let second = admin().open_year(&mut tree, &key()).unwrap();
        assert!(!second.changed);
    }

    #[test]
    fn test_numeric_values_keep_their_value() {
        let mut tree = BudgetTree::new();
        let editor = admin();
        let year = key();
        let sector = editor.open_year(&mut tree, &year).unwrap().summary.sectors[0]
            .id
            .clone();

        let out = editor
            .set_field_value(&mut tree, &year, &FieldPath::total(), &json!(1.5e3))
            .unwrap();
        assert_eq!(out.summary.total, 1_500);

        let path = FieldPath::sector(sector.clone(), Field::Percentage);
        let out = editor
            .set_field_value(&mut tree, &year, &path, &json!(0.000_000_1))
            .unwrap();
        assert_eq!(out.summary.sector(&sector).unwrap().amount, 0);

        let out = editor
            .set_field_value(&mut tree, &year, &path, &json!(-12.5))
            .unwrap();
        assert_eq!(out.summary.sector(&sector).unwrap().percentage, Percent::ZERO);
    }

    #[test]
    fn test_set_field_value_requires_privilege() {
        let mut tree = BudgetTree::new();
        let err = BudgetEditor::new(StaticPrivilege(false))
            .set_field_value(&mut tree, &key(), &FieldPath::total(), &json!(10))
            .unwrap_err();
        assert_eq!(err, BudgetError::PermissionDenied);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_summary_follows_every_edit() {
        let mut tree = BudgetTree::new();
        let editor = admin();
        let year = key();
        let sector = editor.open_year(&mut tree, &year).unwrap().summary.sectors[0]
            .id
            .clone();

        let out = editor
            .set_field(&mut tree, &year, &FieldPath::total(), "100000000")
            .unwrap();
        assert_eq!(out.summary.sector(&sector).unwrap().amount, 20_000_000);

        let out = editor.add_sub(&mut tree, &year, &sector).unwrap();
        let Some(NodeRef::SubItem { id: sub, .. }) = out.created else {
            panic!("expected a new sub-item");
        };

        let out = editor
            .set_field(
                &mut tree,
                &year,
                &FieldPath::sub(sector.clone(), sub.clone(), Field::Percentage),
                "50",
            )
            .unwrap();
        let s = out.summary.sector(&sector).unwrap();
        assert_eq!(s.used_percent.value(), dec!(50));
        assert_eq!(s.used_amount, 10_000_000);
        assert_eq!(s.remaining_amount, 10_000_000);

        let out = editor
            .set_field(
                &mut tree,
                &year,
                &FieldPath::sector(sector.clone(), Field::Percentage),
                "10",
            )
            .unwrap();
        assert_eq!(out.summary.sector_percent_sum, dec!(90));
        assert_eq!(out.summary.unallocated_percent, dec!(10));
        assert_eq!(out.summary.sector(&sector).unwrap().used_amount, 5_000_000);
    }

    #[test]
    fn test_new_nodes_start_blank() {
        let mut tree = BudgetTree::new();
        let editor = admin();
        let year = key();

        let out = editor.add_sector(&mut tree, &year).unwrap();
        let Some(NodeRef::Sector { id }) = out.created else {
            panic!("expected a new sector");
        };
        let sector = tree.get(&year).unwrap().sector(&id).unwrap();
        assert_eq!(sector.name, "");
        assert_eq!(sector.percentage, Percent::ZERO);
        assert!(sector.subs.is_empty());

        let out = editor.add_sub(&mut tree, &year, &id).unwrap();
        let Some(NodeRef::SubItem { id: sub, .. }) = out.created else {
            panic!("expected a new sub-item");
        };
        let sub = tree.get(&year).unwrap().sector(&id).unwrap().sub(&sub).unwrap();
        assert_eq!(sub.name, "");
        assert!(sub.note.is_none());
        assert_eq!(sub.percentage, Percent::ZERO);
    }

    #[test]
    fn test_remove_unknown_is_unchanged() {
        let mut tree = BudgetTree::new();
        let editor = admin();
        let year = key();
        editor.open_year(&mut tree, &year).unwrap();

        let out = editor
            .remove_sector(&mut tree, &year, &SectorId::new())
            .unwrap();
        assert!(!out.changed);
        let out = editor
            .add_sub(&mut tree, &year, &SectorId::new())
            .unwrap();
        assert!(!out.changed);
        assert!(out.created.is_none());
    }

    #[test]
    fn test_reset_year_discards_edits() {
        let mut tree = BudgetTree::new();
        let editor = admin();
        let year = key();
        editor
            .set_field(&mut tree, &year, &FieldPath::total(), "42")
            .unwrap();
        editor.add_sector(&mut tree, &year).unwrap();

        let out = editor.reset_year(&mut tree, &year).unwrap();
        assert_eq!(out.summary.total, 0);
        assert_eq!(out.summary.sector_percent_sum, dec!(100));
    }

    #[test]
    fn test_unprivileged_calls_leave_tree_untouched() {
        let mut tree = BudgetTree::new();
        let year = key();
        let sector = admin().open_year(&mut tree, &year).unwrap().summary.sectors[0]
            .id
            .clone();
        let sub = match admin().add_sub(&mut tree, &year, &sector).unwrap().created {
            Some(NodeRef::SubItem { id, .. }) => id,
            other => panic!("unexpected {other:?}"),
        };
        let before = tree.clone();
        let guest = BudgetEditor::new(StaticPrivilege(false));
        let other_year = YearKey::parse("2030").unwrap();

        let results = [
            guest.open_year(&mut tree, &other_year).map(|_| ()),
            guest
                .set_field(&mut tree, &year, &FieldPath::total(), "1")
                .map(|_| ()),
            guest.add_sector(&mut tree, &year).map(|_| ()),
            guest.remove_sector(&mut tree, &year, &sector).map(|_| ()),
            guest.add_sub(&mut tree, &year, &sector).map(|_| ()),
            guest.remove_sub(&mut tree, &year, &sector, &sub).map(|_| ()),
            guest.reset_year(&mut tree, &year).map(|_| ()),
        ];

        for result in results {
            assert_eq!(result, Err(BudgetError::PermissionDenied));
        }
        assert_eq!(tree, before);
    }

    #[test]
    fn test_gate_is_asked_on_every_call() {
        let mut tree = BudgetTree::new();
        let year = key();
        let privileged = Cell::new(true);
        let asked = Cell::new(0_u32);
        let editor = BudgetEditor::new(|| {
            asked.set(asked.get() + 1);
            privileged.get()
        });

        assert!(editor.open_year(&mut tree, &year).is_ok());
        privileged.set(false);
        assert_eq!(
            editor.add_sector(&mut tree, &year).unwrap_err(),
            BudgetError::PermissionDenied
        );
        assert_eq!(asked.get(), 2);
    }
}
