//! Column families.

use crate::column::Column;
use crate::descriptor::{FamilyDescriptor, FamilyId};
use crate::object::StableId;

/// Name of a synthesized primary family.
pub const PRIMARY_FAMILY_NAME: &str = "primary";

/// A family as stored by its table: the descriptor's identity plus the
/// resolved ordinals of its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FamilyEntry {
    pub id: FamilyId,
    pub name: String,
    pub ordinals: Vec<usize>,
}

impl FamilyEntry {
    pub(crate) fn from_descriptor(desc: &FamilyDescriptor, ordinals: Vec<usize>) -> Self {
        Self {
            id: desc.id,
            name: desc.name.clone(),
            ordinals,
        }
    }

    /// Primary family holding the given columns.
    pub(crate) fn synthesized_primary(ordinals: Vec<usize>) -> Self {
        Self {
            id: 0,
            name: PRIMARY_FAMILY_NAME.to_string(),
            ordinals,
        }
    }
}

/// One column of a family, with its table ordinal.
#[derive(Debug, Clone, Copy)]
pub struct FamilyColumn<'a> {
    pub column: &'a Column,
    pub ordinal: usize,
}

/// Borrowed view of a column family. `columns` is the owning table's column
/// list.
#[derive(Debug, Clone, Copy)]
pub struct Family<'a> {
    pub(crate) entry: &'a FamilyEntry,
    pub(crate) columns: &'a [Column],
}

impl<'a> Family<'a> {
    pub fn id(&self) -> StableId {
        StableId::from(self.entry.id)
    }

    pub fn name(&self) -> &'a str {
        &self.entry.name
    }

    pub fn column_count(&self) -> usize {
        self.entry.ordinals.len()
    }

    pub fn column(&self, i: usize) -> FamilyColumn<'a> {
        let ordinal = self.entry.ordinals[i];
        FamilyColumn {
            column: &self.columns[ordinal],
            ordinal,
        }
    }
}
