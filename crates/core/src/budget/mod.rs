//! Village budget (APBDes) allocation: tree, percentage math, editing and views.

pub mod allocation;
pub mod document;
pub mod editor;
pub mod error;
pub mod percent;
pub mod template;
pub mod tree;
pub mod types;
pub mod view;

#[cfg(test)]
mod tests;

pub use allocation::{AllocationCalculator, SectorAllocation, SubAllocation, YearAllocation};
pub use document::{DecodedYear, DocumentIssue, decode_year, encode_year};
pub use editor::{BudgetEditor, EditOutcome, NodeRef};
pub use error::{BudgetError, Target};
pub use percent::Percent;
pub use tree::{BudgetTree, Field, FieldPath};
pub use types::{BudgetYear, Sector, SubItem, YearKey};
pub use view::{SectorView, SubView, YearFilter, YearView};
