//! Budget error types.
//!
//! Out-of-range or unparseable numbers are not errors: percentages are
//! clamped and totals coerced where they are read.

use std::fmt;

use desa_shared::AppError;
use thiserror::Error;

use super::tree::Field;

/// Kind of node a field path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The budget year itself.
    Year,
    /// A sector.
    Sector,
    /// A sub-item.
    SubItem,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year => write!(f, "year"),
            Self::Sector => write!(f, "sector"),
            Self::SubItem => write!(f, "sub-item"),
        }
    }
}

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// Caller is not privileged; nothing was changed.
    #[error("Permission denied: budget editing requires admin privilege")]
    PermissionDenied,

    /// No year selected.
    #[error("No budget year selected")]
    MissingYear,

    /// Year does not exist in the tree.
    #[error("Budget year not found: {0}")]
    YearNotFound(String),

    /// Field does not exist on the addressed node.
    #[error("Field {field} is not editable on a {target}")]
    UnsupportedField {
        /// Requested field.
        field: Field,
        /// Node kind the path resolved to.
        target: Target,
    },
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::PermissionDenied => Self::Forbidden(err.to_string()),
            BudgetError::YearNotFound(_) => Self::NotFound(err.to_string()),
            BudgetError::MissingYear | BudgetError::UnsupportedField { .. } => {
                Self::Validation(err.to_string())
            }
        }
    }
}
