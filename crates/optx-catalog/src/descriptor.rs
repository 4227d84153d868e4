//! # Raw Schema Descriptors
//!
//! Descriptors are the persisted, versioned records the metadata store hands
//! to the catalog. They are immutable once observed and shared by `Arc`
//! between sessions; the catalog never mutates them.
//!
//! A table descriptor lists its public columns and indexes directly. Columns
//! and indexes that are mid schema change live in `mutations`, tagged with the
//! state that decides who may see them:
//!
//! - **write-only**: maintained by writes but invisible to reads.
//! - **delete-only**: only removed by deletes.
//!
//! The "writable" set is public + write-only; the "deletable" set adds the
//! delete-only entries. Both orderings are stable and positional code in the
//! table builder depends on them.

use crate::expr::Datum;
use crate::types::ColumnType;
use serde::{Deserialize, Serialize};

pub type DescriptorId = u32;
pub type DescriptorVersion = u64;
pub type ColumnId = u32;
pub type IndexId = u32;
pub type FamilyId = u32;
pub type Oid = u32;

/// ID of the public schema, which has no descriptor of its own.
pub const PUBLIC_SCHEMA_ID: DescriptorId = 29;

/// Tables up to this ID live in the shared system-config key span.
pub const MAX_SYSTEM_CONFIG_DESC_ID: DescriptorId = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    pub id: DescriptorId,
    pub version: DescriptorVersion,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub id: DescriptorId,
    pub version: DescriptorVersion,
    pub name: String,
    pub parent_id: DescriptorId,
}

/// Lifecycle state of a descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorState {
    #[default]
    Public,
    Add,
    Drop,
    Offline,
}

/// What kind of relation a table descriptor describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    #[default]
    Table,
    View,
    MaterializedView,
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    #[serde(default)]
    pub hidden: bool,
    pub default_expr: Option<String>,
    pub compute_expr: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(id: ColumnId, name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            id,
            name: name.into(),
            column_type,
            nullable,
            hidden: false,
            default_expr: None,
            compute_expr: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    pub id: FamilyId,
    pub name: String,
    pub column_ids: Vec<ColumnId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    #[default]
    Forward,
    Inverted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One list partition; each value is an already-decoded partition tuple. An
/// empty tuple is the DEFAULT partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPartition {
    pub name: String,
    pub values: Vec<Vec<Datum>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterleaveAncestor {
    pub table_id: DescriptorId,
    pub index_id: IndexId,
    pub shared_prefix_len: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterleaveReference {
    pub table_id: DescriptorId,
    pub index_id: IndexId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexDescriptor {
    pub id: IndexId,
    pub name: String,
    pub unique: bool,
    pub index_type: IndexType,
    /// Declared key columns.
    pub column_ids: Vec<ColumnId>,
    /// Direction per declared key column.
    pub column_directions: Vec<Direction>,
    /// Implicit key columns (typically the primary key) appended to make
    /// secondary index keys unique.
    pub extra_column_ids: Vec<ColumnId>,
    pub store_column_ids: Vec<ColumnId>,
    /// Partial index predicate; `None` for full indexes.
    pub predicate: Option<String>,
    pub list_partitions: Vec<ListPartition>,
    pub interleave_ancestors: Vec<InterleaveAncestor>,
    pub interleaved_by: Vec<InterleaveReference>,
}

impl IndexDescriptor {
    pub fn is_inverted(&self) -> bool {
        self.index_type == IndexType::Inverted
    }

    pub fn column_direction(&self, i: usize) -> Direction {
        self.column_directions.get(i).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintValidity {
    #[default]
    Validated,
    Unvalidated,
    Validating,
    Dropping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDescriptor {
    pub name: String,
    pub expr: String,
    pub validity: ConstraintValidity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    #[default]
    Simple,
    Full,
    Partial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceAction {
    #[default]
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

/// A foreign key as recorded on one of its endpoint tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    pub name: String,
    pub origin_table_id: DescriptorId,
    pub origin_column_ids: Vec<ColumnId>,
    pub referenced_table_id: DescriptorId,
    pub referenced_column_ids: Vec<ColumnId>,
    pub validity: ConstraintValidity,
    pub match_method: MatchMethod,
    pub on_delete: ReferenceAction,
    pub on_update: ReferenceAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationState {
    WriteOnly,
    DeleteOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationTarget {
    Column(ColumnDescriptor),
    Index(IndexDescriptor),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub state: MutationState,
    pub target: MutationTarget,
}

/// Persisted descriptor of a table, view, sequence or virtual table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDescriptor {
    pub id: DescriptorId,
    pub version: DescriptorVersion,
    pub name: String,
    /// Parent database.
    pub parent_id: DescriptorId,
    pub parent_schema_id: DescriptorId,
    pub kind: RelationKind,
    /// Set for system-catalog tables whose rows are produced by generators.
    pub is_virtual: bool,
    pub state: DescriptorState,
    pub view_query: String,
    pub columns: Vec<ColumnDescriptor>,
    pub families: Vec<FamilyDescriptor>,
    pub primary_index: IndexDescriptor,
    pub indexes: Vec<IndexDescriptor>,
    pub mutations: Vec<Mutation>,
    pub checks: Vec<CheckDescriptor>,
    pub outbound_fks: Vec<ForeignKeyReference>,
    pub inbound_fks: Vec<ForeignKeyReference>,
}

impl TableDescriptor {
    /// True for anything that is neither a view nor a sequence. Virtual
    /// tables count as tables.
    pub fn is_table(&self) -> bool {
        self.kind == RelationKind::Table
    }

    /// True for plain and materialized views.
    pub fn is_view(&self) -> bool {
        matches!(self.kind, RelationKind::View | RelationKind::MaterializedView)
    }

    pub fn materialized_view(&self) -> bool {
        self.kind == RelationKind::MaterializedView
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == RelationKind::Sequence
    }

    pub fn is_virtual_table(&self) -> bool {
        self.is_virtual
    }

    fn mutation_columns(&self, state: MutationState) -> impl Iterator<Item = &ColumnDescriptor> {
        self.mutations.iter().filter_map(move |m| match &m.target {
            MutationTarget::Column(c) if m.state == state => Some(c),
            _ => None,
        })
    }

    fn mutation_indexes(&self, state: MutationState) -> impl Iterator<Item = &IndexDescriptor> {
        self.mutations.iter().filter_map(move |m| match &m.target {
            MutationTarget::Index(i) if m.state == state => Some(i),
            _ => None,
        })
    }

    /// Public columns followed by write-only mutation columns.
    pub fn writable_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .chain(self.mutation_columns(MutationState::WriteOnly))
            .collect()
    }

    /// Writable columns followed by delete-only mutation columns.
    pub fn deletable_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .chain(self.mutation_columns(MutationState::WriteOnly))
            .chain(self.mutation_columns(MutationState::DeleteOnly))
            .collect()
    }

    /// Public secondary indexes followed by write-only mutation indexes.
    pub fn writable_indexes(&self) -> Vec<&IndexDescriptor> {
        self.indexes
            .iter()
            .chain(self.mutation_indexes(MutationState::WriteOnly))
            .collect()
    }

    /// Writable secondary indexes followed by delete-only mutation indexes.
    pub fn deletable_indexes(&self) -> Vec<&IndexDescriptor> {
        self.indexes
            .iter()
            .chain(self.mutation_indexes(MutationState::WriteOnly))
            .chain(self.mutation_indexes(MutationState::DeleteOnly))
            .collect()
    }

    /// The i-th deletable column, without materializing the list.
    pub fn deletable_column(&self, i: usize) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .chain(self.mutation_columns(MutationState::WriteOnly))
            .chain(self.mutation_columns(MutationState::DeleteOnly))
            .nth(i)
    }

    /// The i-th deletable secondary index, without materializing the list.
    pub fn deletable_index(&self, i: usize) -> Option<&IndexDescriptor> {
        self.indexes
            .iter()
            .chain(self.mutation_indexes(MutationState::WriteOnly))
            .chain(self.mutation_indexes(MutationState::DeleteOnly))
            .nth(i)
    }

    pub fn find_column_by_name(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.deletable_columns().into_iter().find(|c| c.name == name)
    }

    /// Checks that must be enforced on writes, including ones still being
    /// validated.
    pub fn active_checks(&self) -> impl Iterator<Item = &CheckDescriptor> {
        self.checks
            .iter()
            .filter(|c| c.validity != ConstraintValidity::Dropping)
    }

    /// Type versions of the user-defined-typed columns, in column order.
    fn user_defined_type_versions(&self) -> Vec<DescriptorVersion> {
        self.deletable_columns()
            .into_iter()
            .filter_map(|col| col.column_type.user_defined_version())
            .collect()
    }

    /// Reports whether `self` and `other` have the same user-defined-typed
    /// columns at the same type versions. Symmetric: a user-defined-typed
    /// column present on only one side makes the answer false.
    pub fn user_defined_type_cols_have_same_version(&self, other: &TableDescriptor) -> bool {
        self.user_defined_type_versions() == other.user_defined_type_versions()
    }
}
