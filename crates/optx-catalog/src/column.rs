//! Optimizer-facing columns.

use crate::descriptor::{ColumnDescriptor, ColumnId};
use crate::object::StableId;
use crate::types::ColumnType;
use std::sync::LazyLock;

/// Name of the synthesized row-versioning system column.
pub const MVCC_TIMESTAMP_COLUMN_NAME: &str = "internal_mvcc_timestamp";
pub const MVCC_TIMESTAMP_COLUMN_ID: ColumnId = u32::MAX;

/// Descriptor backing the synthesized row-versioning column.
pub static MVCC_TIMESTAMP_COLUMN_DESC: LazyLock<ColumnDescriptor> = LazyLock::new(|| ColumnDescriptor {
    id: MVCC_TIMESTAMP_COLUMN_ID,
    name: MVCC_TIMESTAMP_COLUMN_NAME.to_string(),
    column_type: ColumnType::decimal(),
    nullable: false,
    hidden: true,
    default_expr: None,
    compute_expr: None,
});

/// How a column participates in reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Public column.
    Ordinary,
    /// Being added or dropped; maintained by writes but not readable.
    WriteOnly,
    /// Being dropped; only deletes touch it.
    DeleteOnly,
    /// Synthesized system column (row versioning).
    System,
    /// Synthesized virtual column holding an inverted index key.
    VirtualInverted,
}

/// A column of a table as presented to the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    ordinal: usize,
    stable_id: StableId,
    name: String,
    kind: ColumnKind,
    datum_type: ColumnType,
    nullable: bool,
    hidden: bool,
    default_expr: Option<String>,
    computed_expr: Option<String>,
    inverted_source_ordinal: Option<usize>,
}

impl Column {
    /// A column backed by a (possibly synthesized) column descriptor.
    pub(crate) fn non_virtual(
        ordinal: usize,
        stable_id: StableId,
        desc: &ColumnDescriptor,
        kind: ColumnKind,
    ) -> Self {
        Self {
            ordinal,
            stable_id,
            name: desc.name.clone(),
            kind,
            datum_type: desc.column_type.clone(),
            nullable: desc.nullable,
            hidden: desc.hidden,
            default_expr: desc.default_expr.clone(),
            computed_expr: desc.compute_expr.clone(),
            inverted_source_ordinal: None,
        }
    }

    /// A virtual column carrying the key of an inverted index built on
    /// `source`. It has no stable ID of its own.
    pub(crate) fn virtual_inverted(ordinal: usize, source: &Column) -> Self {
        Self {
            ordinal,
            stable_id: StableId(0),
            name: format!("{}_inverted_key", source.name),
            kind: ColumnKind::VirtualInverted,
            datum_type: source.datum_type.clone(),
            nullable: false,
            hidden: true,
            default_expr: None,
            computed_expr: None,
            inverted_source_ordinal: Some(source.ordinal),
        }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn col_id(&self) -> StableId {
        self.stable_id
    }

    pub fn col_name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn datum_type(&self) -> &ColumnType {
        &self.datum_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn default_expr(&self) -> Option<&str> {
        self.default_expr.as_deref()
    }

    pub fn computed_expr(&self) -> Option<&str> {
        self.computed_expr.as_deref()
    }

    pub fn is_computed(&self) -> bool {
        self.computed_expr.is_some()
    }

    /// Write-only and delete-only columns.
    pub fn is_mutation(&self) -> bool {
        matches!(self.kind, ColumnKind::WriteOnly | ColumnKind::DeleteOnly)
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == ColumnKind::VirtualInverted
    }

    /// Ordinal of the real column an inverted virtual column derives from.
    pub fn inverted_source_column_ordinal(&self) -> Option<usize> {
        self.inverted_source_ordinal
    }
}
