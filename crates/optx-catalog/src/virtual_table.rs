//! # Virtual Tables
//!
//! Virtual tables are system-catalog tables whose rows are produced on demand
//! by generators. Their contents depend on the database they are resolved
//! under, so the same descriptor yields a different [`VirtualTable`] (with a
//! different stable ID) per database, and virtual tables are never cached.
//!
//! ## Stable IDs
//!
//! The low 32 bits hold the descriptor ID and the high 32 bits identify the
//! resolving database (see [`VirtualTableScope`]):
//!
//! | scope                 | high bits      |
//! |-----------------------|----------------|
//! | no database qualifier | 0              |
//! | existing database     | database ID    |
//! | missing database      | `u32::MAX`     |
//!
//! ## Synthesized Keys
//!
//! Generated rows have no natural key, so a hidden integer column at ordinal
//! 0 acts as one. The primary index spans every column. Each declared index
//! covers a single column and appends the hidden column to become a key,
//! which is why every secondary virtual index reports two key columns.

use crate::check::CheckConstraint;
use crate::codec::Span;
use crate::column::{Column, ColumnKind};
use crate::descriptor::{ColumnDescriptor, ColumnId, DescriptorId, IndexDescriptor, IndexId, TableDescriptor};
use crate::error::{CatalogError, Result};
use crate::expr::Datum;
use crate::family::{Family, FamilyEntry};
use crate::index::IndexColumn;
use crate::object::StableId;
use crate::schema::DataSourceName;
use crate::types::ColumnType;
use crate::zone::ZoneConfig;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::trace;

pub const VTABLE_PK_COLUMN_NAME: &str = "internal_vtable_pk";

/// Stable ID of the synthesized key column, shared by all virtual tables.
pub const VTABLE_PK_COLUMN_ID: StableId = StableId(i64::MAX as u64);

static VTABLE_PK_COLUMN_DESC: LazyLock<ColumnDescriptor> = LazyLock::new(|| ColumnDescriptor {
    id: 0,
    name: VTABLE_PK_COLUMN_NAME.to_string(),
    column_type: ColumnType::int(),
    nullable: false,
    hidden: true,
    default_expr: None,
    compute_expr: None,
});

static EMPTY_ZONE: LazyLock<ZoneConfig> = LazyLock::new(ZoneConfig::default);

/// High-bits sentinel for a database qualifier that names no database.
const MISSING_DATABASE: u64 = u32::MAX as u64;

/// The database context a virtual table was resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualTableScope {
    /// The name carried no database qualifier.
    AllDatabases,
    Database(DescriptorId),
    /// A database was named but does not exist.
    MissingDatabase,
}

impl VirtualTableScope {
    /// Stable ID of descriptor `id` resolved in this scope.
    pub fn stable_id(self, id: DescriptorId) -> StableId {
        let high = match self {
            VirtualTableScope::AllDatabases => 0,
            VirtualTableScope::Database(db) => db as u64,
            VirtualTableScope::MissingDatabase => MISSING_DATABASE,
        };
        StableId(id as u64 | (high << 32))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VirtualIndexEntry {
    ordinal: usize,
    id: IndexId,
    name: String,
    is_primary: bool,
    /// Column ordinals: key column, hidden key column, stored columns. All
    /// columns for the primary index.
    columns: Vec<usize>,
    stored_cols: Vec<ColumnId>,
}

impl VirtualIndexEntry {
    fn primary(num_cols: usize) -> Self {
        Self {
            ordinal: 0,
            id: 0,
            name: "primary".to_string(),
            is_primary: true,
            columns: (0..num_cols).collect(),
            stored_cols: Vec::new(),
        }
    }

    fn secondary(
        ordinal: usize,
        desc: &IndexDescriptor,
        lookup: &dyn Fn(ColumnId) -> Result<usize>,
    ) -> Result<Self> {
        if desc.column_ids.len() > 1 {
            return Err(CatalogError::assertion(format!(
                "virtual index {} has {} key columns; at most 1 is supported",
                desc.name,
                desc.column_ids.len()
            )));
        }
        let mut columns = Vec::with_capacity(desc.column_ids.len() + 1 + desc.store_column_ids.len());
        for id in &desc.column_ids {
            columns.push(lookup(*id)?);
        }
        columns.push(0);
        for id in &desc.store_column_ids {
            columns.push(lookup(*id)?);
        }
        Ok(Self {
            ordinal,
            id: desc.id,
            name: desc.name.clone(),
            is_primary: false,
            columns,
            stored_cols: desc.store_column_ids.clone(),
        })
    }
}

/// Borrowed view of a virtual table index.
///
/// Answers the same questions as [`Index`](crate::index::Index). Virtual rows
/// live outside the key space, so there is no predicate, no partitioning, no
/// interleaving, the zone is empty and the span is empty.
#[derive(Debug, Clone, Copy)]
pub struct VirtualIndex<'a> {
    pub(crate) table: &'a VirtualTable,
    pub(crate) entry: &'a VirtualIndexEntry,
}

impl<'a> VirtualIndex<'a> {
    pub fn id(&self) -> StableId {
        StableId::from(self.entry.id)
    }

    pub fn index_id(&self) -> IndexId {
        self.entry.id
    }

    pub fn name(&self) -> &'a str {
        &self.entry.name
    }

    pub fn ordinal(&self) -> usize {
        self.entry.ordinal
    }

    pub fn is_primary(&self) -> bool {
        self.entry.is_primary
    }

    pub fn is_unique(&self) -> bool {
        false
    }

    pub fn is_inverted(&self) -> bool {
        false
    }

    pub fn column_count(&self) -> usize {
        self.entry.columns.len()
    }

    /// Ordinal in the owning table of the i-th index column.
    pub fn column_ordinal(&self, i: usize) -> usize {
        self.entry.columns[i]
    }

    /// Virtual index columns are always ascending.
    pub fn column(&self, i: usize) -> IndexColumn<'a> {
        IndexColumn {
            column: self.table.column(self.entry.columns[i]),
            descending: false,
        }
    }

    /// The indexed column plus the hidden key column.
    pub fn key_column_count(&self) -> usize {
        2
    }

    /// Virtual indexes are never unique, so the lax key is the key.
    pub fn lax_key_column_count(&self) -> usize {
        2
    }

    pub fn stored_column_ids(&self) -> &'a [ColumnId] {
        &self.entry.stored_cols
    }

    pub fn inverted_column_ordinal(&self) -> Option<usize> {
        None
    }

    pub fn predicate(&self) -> Option<&'a str> {
        None
    }

    pub fn zone(&self) -> &'a ZoneConfig {
        &EMPTY_ZONE
    }

    pub fn span(&self) -> Span {
        Span {
            start: Vec::new(),
            end: Vec::new(),
        }
    }

    pub fn table(&self) -> &'a VirtualTable {
        self.table
    }

    pub fn partition_by_list_prefixes(&self) -> Vec<&'a [Datum]> {
        Vec::new()
    }

    pub fn interleave_ancestor_count(&self) -> usize {
        0
    }

    pub fn interleaved_by_count(&self) -> usize {
        0
    }
}

/// Optimizer-facing virtual table.
#[derive(Debug)]
pub struct VirtualTable {
    desc: Arc<TableDescriptor>,
    id: StableId,
    name: DataSourceName,
    columns: Vec<Column>,
    col_map: HashMap<StableId, usize>,
    indexes: Vec<VirtualIndexEntry>,
    family: FamilyEntry,
    checks: Vec<CheckConstraint>,
}

impl VirtualTable {
    /// Builds the virtual table for `desc` resolved as `name` in `scope`.
    pub fn new(desc: Arc<TableDescriptor>, scope: VirtualTableScope, name: &DataSourceName) -> Result<Self> {
        if !desc.is_virtual_table() {
            return Err(CatalogError::assertion(format!(
                "descriptor {} ({}) is not a virtual table",
                desc.id, desc.name
            )));
        }
        let id = scope.stable_id(desc.id);

        let mut columns = Vec::with_capacity(desc.columns.len() + 1);
        columns.push(Column::non_virtual(0, VTABLE_PK_COLUMN_ID, &VTABLE_PK_COLUMN_DESC, ColumnKind::Ordinary));
        for (i, col) in desc.columns.iter().enumerate() {
            columns.push(Column::non_virtual(i + 1, StableId::from(col.id), col, ColumnKind::Ordinary));
        }
        let col_map: HashMap<StableId, usize> = columns.iter().map(|c| (c.col_id(), c.ordinal())).collect();

        let lookup = |id: ColumnId| -> Result<usize> {
            col_map
                .get(&StableId::from(id))
                .copied()
                .ok_or(CatalogError::UndefinedColumn(id))
        };
        let mut indexes = Vec::with_capacity(1 + desc.indexes.len());
        indexes.push(VirtualIndexEntry::primary(columns.len()));
        for (i, idx) in desc.indexes.iter().enumerate() {
            indexes.push(VirtualIndexEntry::secondary(i + 1, idx, &lookup)?);
        }

        let family = FamilyEntry::synthesized_primary((0..columns.len()).collect());
        let checks = desc.active_checks().map(CheckConstraint::declared).collect();

        let mut name = name.clone();
        name.prefix.explicit_catalog = true;
        name.prefix.explicit_schema = true;

        trace!(
            "Built virtual table '{}' (id={}, scope={:?}): {} columns, {} indexes",
            desc.name,
            id,
            scope,
            columns.len(),
            indexes.len()
        );

        Ok(Self {
            desc,
            id,
            name,
            columns,
            col_map,
            indexes,
            family,
            checks,
        })
    }

    pub fn id(&self) -> StableId {
        self.id
    }

    /// The raw descriptor ID, without the database bits.
    pub fn postgres_descriptor_id(&self) -> StableId {
        StableId::from(self.desc.id)
    }

    pub fn equals(&self, other: &VirtualTable) -> bool {
        std::ptr::eq(self, other) || (self.id == other.id && self.desc.version == other.desc.version)
    }

    pub fn name(&self) -> &str {
        &self.name.object
    }

    /// The fully qualified name the table was resolved under.
    pub fn data_source_name(&self) -> &DataSourceName {
        &self.name
    }

    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        &self.desc
    }

    pub fn is_virtual_table(&self) -> bool {
        true
    }

    pub fn is_materialized_view(&self) -> bool {
        false
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &Column {
        &self.columns[i]
    }

    /// Backing descriptor of column `i`; `None` for the hidden key column.
    pub fn column_descriptor(&self, i: usize) -> Option<&ColumnDescriptor> {
        i.checked_sub(1).and_then(|i| self.desc.columns.get(i))
    }

    pub fn lookup_column_ordinal(&self, id: ColumnId) -> Result<usize> {
        self.col_map
            .get(&StableId::from(id))
            .copied()
            .ok_or(CatalogError::UndefinedColumn(id))
    }

    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    /// Virtual tables have no schema changes in flight.
    pub fn writable_index_count(&self) -> usize {
        self.indexes.len()
    }

    pub fn deletable_index_count(&self) -> usize {
        self.indexes.len()
    }

    pub fn index(&self, i: usize) -> VirtualIndex<'_> {
        VirtualIndex {
            table: self,
            entry: &self.indexes[i],
        }
    }

    pub fn statistic_count(&self) -> usize {
        0
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn check(&self, i: usize) -> &CheckConstraint {
        &self.checks[i]
    }

    pub fn family_count(&self) -> usize {
        1
    }

    pub fn family(&self, i: usize) -> Family<'_> {
        assert_eq!(i, 0, "virtual tables have a single family");
        Family {
            entry: &self.family,
            columns: &self.columns,
        }
    }

    pub fn outbound_foreign_key_count(&self) -> usize {
        0
    }

    pub fn inbound_foreign_key_count(&self) -> usize {
        0
    }
}
