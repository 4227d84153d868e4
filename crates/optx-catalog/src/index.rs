//! # Table Indexes
//!
//! An index is stored inside its owning [`Table`] as an [`IndexEntry`] holding
//! everything derived at build time (resolved column ordinals, effective
//! zone, key-column counts). Callers see it through [`Index`], a borrowed view
//! that pairs the entry with its table and raw descriptor; the table alone owns
//! the index data.
//!
//! ## Column Layout
//!
//! Index columns are reported in this order:
//!
//! 1. declared key columns, with their directions (for an inverted index the
//!    first one is replaced by the table's virtual inverted-key column),
//! 2. extra (implicit) key columns,
//! 3. stored columns: every non-key table column for the primary index, the
//!    descriptor's store list otherwise.
//!
//! ## Key Columns
//!
//! See [`key_column_counts`]. A unique index over nullable columns is only a
//! *lax* key: two rows may both hold NULL, so the extra columns are needed to
//! make a true key.

use crate::codec::Span;
use crate::column::Column;
use crate::descriptor::{
    ColumnId, Direction, IndexDescriptor, IndexId, InterleaveAncestor, InterleaveReference,
    MAX_SYSTEM_CONFIG_DESC_ID,
};
use crate::error::Result;
use crate::expr::Datum;
use crate::object::StableId;
use crate::table::Table;
use crate::zone::ZoneConfig;
use std::collections::HashSet;
use std::sync::Arc;

/// Key and lax-key column counts of an index.
///
/// - unique, no nullable key column: `lax = key = declared`
/// - unique, some nullable key column: `lax = declared`, `key = declared + extra`
/// - not unique: `lax = key = declared + extra`
///
/// Returns `(key, lax_key)`.
pub fn key_column_counts(
    unique: bool,
    any_key_column_nullable: bool,
    num_declared: usize,
    num_extra: usize,
) -> (usize, usize) {
    match (unique, any_key_column_nullable) {
        (true, false) => (num_declared, num_declared),
        (true, true) => (num_declared + num_extra, num_declared),
        (false, _) => (num_declared + num_extra, num_declared + num_extra),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexColumnEntry {
    pub ordinal: usize,
    pub descending: bool,
}

/// Build-time state of one index, owned by its table.
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    pub ordinal: usize,
    /// Position among the descriptor's deletable secondary indexes; `None` for
    /// the primary index.
    pub secondary_position: Option<usize>,
    pub zone: Arc<ZoneConfig>,
    pub columns: Vec<IndexColumnEntry>,
    pub stored_cols: Vec<ColumnId>,
    pub num_key_cols: usize,
    pub num_lax_key_cols: usize,
    pub inverted_virtual_col: Option<usize>,
}

impl IndexEntry {
    /// Resolves the columns and key counts of `desc`.
    ///
    /// `columns` and `lookup` describe the table being built; only real and
    /// system columns count toward the primary index's stored columns.
    pub(crate) fn build(
        ordinal: usize,
        secondary_position: Option<usize>,
        desc: &IndexDescriptor,
        zone: Arc<ZoneConfig>,
        columns: &[Column],
        lookup: &dyn Fn(ColumnId) -> Result<usize>,
        inverted_virtual_col: Option<usize>,
    ) -> Result<Self> {
        let stored_cols: Vec<ColumnId> = if secondary_position.is_none() {
            let key: HashSet<ColumnId> = desc.column_ids.iter().copied().collect();
            columns
                .iter()
                .filter(|c| !c.is_virtual())
                .map(|c| c.col_id().0 as ColumnId)
                .filter(|id| !key.contains(id))
                .collect()
        } else {
            desc.store_column_ids.clone()
        };

        let mut entries =
            Vec::with_capacity(desc.column_ids.len() + desc.extra_column_ids.len() + stored_cols.len());
        let mut any_nullable = false;
        for (i, id) in desc.column_ids.iter().enumerate() {
            let source = lookup(*id)?;
            any_nullable |= columns[source].is_nullable();
            let ordinal = match (i, inverted_virtual_col) {
                (0, Some(virtual_col)) => virtual_col,
                _ => source,
            };
            entries.push(IndexColumnEntry {
                ordinal,
                descending: desc.column_direction(i) == Direction::Desc,
            });
        }
        for id in desc.extra_column_ids.iter().chain(stored_cols.iter()) {
            entries.push(IndexColumnEntry {
                ordinal: lookup(*id)?,
                descending: false,
            });
        }

        let (num_key_cols, num_lax_key_cols) = key_column_counts(
            desc.unique,
            any_nullable,
            desc.column_ids.len(),
            desc.extra_column_ids.len(),
        );

        Ok(Self {
            ordinal,
            secondary_position,
            zone,
            columns: entries,
            stored_cols,
            num_key_cols,
            num_lax_key_cols,
            inverted_virtual_col,
        })
    }
}

/// One column of an index.
#[derive(Debug, Clone, Copy)]
pub struct IndexColumn<'a> {
    pub column: &'a Column,
    pub descending: bool,
}

/// Borrowed view of an index of a [`Table`].
#[derive(Debug, Clone, Copy)]
pub struct Index<'a> {
    pub(crate) table: &'a Table,
    pub(crate) entry: &'a IndexEntry,
    pub(crate) desc: &'a IndexDescriptor,
}

impl<'a> Index<'a> {
    pub fn id(&self) -> StableId {
        StableId::from(self.desc.id)
    }

    pub fn index_id(&self) -> IndexId {
        self.desc.id
    }

    pub fn name(&self) -> &'a str {
        &self.desc.name
    }

    pub fn is_unique(&self) -> bool {
        self.desc.unique
    }

    pub fn is_inverted(&self) -> bool {
        self.desc.is_inverted()
    }

    pub fn column_count(&self) -> usize {
        self.entry.columns.len()
    }

    pub fn key_column_count(&self) -> usize {
        self.entry.num_key_cols
    }

    pub fn lax_key_column_count(&self) -> usize {
        self.entry.num_lax_key_cols
    }

    pub fn column(&self, i: usize) -> IndexColumn<'a> {
        let c = self.entry.columns[i];
        IndexColumn {
            column: self.table.column(c.ordinal),
            descending: c.descending,
        }
    }

    /// Column IDs stored (but not indexed) by this index.
    pub fn stored_column_ids(&self) -> &'a [ColumnId] {
        &self.entry.stored_cols
    }

    /// Ordinal of the virtual inverted-key column, for inverted indexes.
    pub fn inverted_column_ordinal(&self) -> Option<usize> {
        self.entry.inverted_virtual_col
    }

    /// The partial index predicate, if this is a partial index.
    pub fn predicate(&self) -> Option<&'a str> {
        self.desc.predicate.as_deref()
    }

    /// Effective zone: a whole-index override inherited from the table's zone,
    /// or the table's zone.
    pub fn zone(&self) -> &'a ZoneConfig {
        &self.entry.zone
    }

    pub fn span(&self) -> Span {
        let codec = self.table.codec();
        let table_id = self.table.descriptor().id;
        if table_id <= MAX_SYSTEM_CONFIG_DESC_ID {
            return codec.system_config_span();
        }
        codec.index_span(table_id, self.desc.id)
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn ordinal(&self) -> usize {
        self.entry.ordinal
    }

    /// Tuples of all list partitions, skipping DEFAULT partitions.
    pub fn partition_by_list_prefixes(&self) -> Vec<&'a [Datum]> {
        self.desc
            .list_partitions
            .iter()
            .flat_map(|p| p.values.iter())
            .filter(|tuple| !tuple.is_empty())
            .map(Vec::as_slice)
            .collect()
    }

    pub fn interleave_ancestor_count(&self) -> usize {
        self.desc.interleave_ancestors.len()
    }

    pub fn interleave_ancestor(&self, i: usize) -> InterleaveAncestor {
        self.desc.interleave_ancestors[i]
    }

    pub fn interleaved_by_count(&self) -> usize {
        self.desc.interleaved_by.len()
    }

    pub fn interleaved_by(&self, i: usize) -> InterleaveReference {
        self.desc.interleaved_by[i]
    }
}
