//! Foreign key constraints.
//!
//! A foreign key is an edge between an origin and a referenced table. Both
//! endpoints carry an identical [`ForeignKeyConstraint`] (outbound on the
//! origin, inbound on the referenced table), and column ordinals are resolved
//! against whichever endpoint table the caller passes in.

use crate::descriptor::{ColumnId, ConstraintValidity, ForeignKeyReference, MatchMethod, ReferenceAction};
use crate::object::StableId;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyConstraint {
    name: String,
    origin_table: StableId,
    origin_columns: Vec<ColumnId>,
    referenced_table: StableId,
    referenced_columns: Vec<ColumnId>,
    validity: ConstraintValidity,
    match_method: MatchMethod,
    delete_action: ReferenceAction,
    update_action: ReferenceAction,
}

impl ForeignKeyConstraint {
    /// Constraint for a reference whose origin is the table being built.
    pub(crate) fn outbound(table: StableId, fk: &ForeignKeyReference) -> Self {
        Self::new(fk, table, StableId::from(fk.referenced_table_id))
    }

    /// Constraint for a reference that points at the table being built.
    pub(crate) fn inbound(table: StableId, fk: &ForeignKeyReference) -> Self {
        Self::new(fk, StableId::from(fk.origin_table_id), table)
    }

    fn new(fk: &ForeignKeyReference, origin_table: StableId, referenced_table: StableId) -> Self {
        Self {
            name: fk.name.clone(),
            origin_table,
            origin_columns: fk.origin_column_ids.clone(),
            referenced_table,
            referenced_columns: fk.referenced_column_ids.clone(),
            validity: fk.validity,
            match_method: fk.match_method,
            delete_action: fk.on_delete,
            update_action: fk.on_update,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin_table_id(&self) -> StableId {
        self.origin_table
    }

    pub fn referenced_table_id(&self) -> StableId {
        self.referenced_table
    }

    pub fn column_count(&self) -> usize {
        self.origin_columns.len()
    }

    /// Ordinal within `origin_table` of the i-th origin column.
    ///
    /// # Panics
    ///
    /// If `origin_table` is not this constraint's origin table.
    pub fn origin_column_ordinal(&self, origin_table: &Table, i: usize) -> usize {
        if origin_table.id() != self.origin_table {
            panic!(
                "assertion failed: invalid table {} passed to origin_column_ordinal (expected {})",
                origin_table.id(),
                self.origin_table
            );
        }
        resolve(origin_table, self.origin_columns[i])
    }

    /// Ordinal within `referenced_table` of the i-th referenced column.
    ///
    /// # Panics
    ///
    /// If `referenced_table` is not this constraint's referenced table.
    pub fn referenced_column_ordinal(&self, referenced_table: &Table, i: usize) -> usize {
        if referenced_table.id() != self.referenced_table {
            panic!(
                "assertion failed: invalid table {} passed to referenced_column_ordinal (expected {})",
                referenced_table.id(),
                self.referenced_table
            );
        }
        resolve(referenced_table, self.referenced_columns[i])
    }

    pub fn validated(&self) -> bool {
        self.validity == ConstraintValidity::Validated
    }

    pub fn match_method(&self) -> MatchMethod {
        self.match_method
    }

    pub fn delete_reference_action(&self) -> ReferenceAction {
        self.delete_action
    }

    pub fn update_reference_action(&self) -> ReferenceAction {
        self.update_action
    }
}

fn resolve(table: &Table, col: ColumnId) -> usize {
    match table.lookup_column_ordinal(col) {
        Ok(ord) => ord,
        Err(err) => panic!("assertion failed: foreign key column of table {}: {}", table.id(), err),
    }
}
