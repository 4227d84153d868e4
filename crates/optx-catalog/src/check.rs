//! Check constraints, declared and synthesized.

use crate::column::Column;
use crate::descriptor::{CheckDescriptor, ConstraintValidity};
use crate::expr::Expr;
use crate::types::TypeFamily;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConstraint {
    /// Serialized SQL boolean expression.
    pub constraint: String,
    pub validated: bool,
    /// Name of the declared constraint; `None` when synthesized.
    pub name: Option<String>,
}

impl CheckConstraint {
    pub(crate) fn declared(check: &CheckDescriptor) -> Self {
        Self {
            constraint: check.expr.clone(),
            validated: check.validity == ConstraintValidity::Validated,
            name: Some(check.name.clone()),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.name.is_none()
    }
}

/// Synthesizes `col IN (members...)` for every non-mutation column of a
/// user-defined enum type. Other user-defined types get no check.
pub(crate) fn synthesize_type_checks(columns: &[Column]) -> Vec<CheckConstraint> {
    columns
        .iter()
        .filter(|col| !col.is_mutation() && col.datum_type().is_user_defined())
        .filter(|col| col.datum_type().family == TypeFamily::Enum)
        .map(|col| CheckConstraint {
            constraint: Expr::in_list(col.col_name(), col.datum_type().enum_datums()).serialize(),
            validated: true,
            name: None,
        })
        .collect()
}
