//! # Table Model
//!
//! [`Table`] is the optimizer's immutable view of a table or materialized
//! view. It is assembled once from a raw descriptor plus the statistics and
//! zone snapshots current at build time, and never mutated afterwards; a
//! change anywhere produces a new `Table`.
//!
//! ## Column Layout
//!
//! Columns are laid out by ordinal as:
//!
//! 1. the descriptor's deletable columns (public, then write-only, then
//!    delete-only mutation columns),
//! 2. the hidden MVCC timestamp system column, unless a real column already
//!    uses its name,
//! 3. one virtual column per inverted index, holding that index's key.
//!
//! Real and system columns are registered in a column-ID map that every later
//! ordinal lookup goes through. Virtual columns have no ID of their own and
//! are not registered.
//!
//! ## Indexes
//!
//! Index 0 is always the primary index. The remaining slots hold the
//! descriptor's deletable secondary indexes in order, so the public indexes
//! come first and [`Table::index_count`] only counts those.
//!
//! ## Statistics
//!
//! Statistics are bound last, once the column-ID map is final. A statistic
//! that covers a column the table no longer has is dropped silently.

use crate::check::{synthesize_type_checks, CheckConstraint};
use crate::codec::SqlCodec;
use crate::column::{
    Column, ColumnKind, MVCC_TIMESTAMP_COLUMN_DESC, MVCC_TIMESTAMP_COLUMN_ID,
    MVCC_TIMESTAMP_COLUMN_NAME,
};
use crate::descriptor::{ColumnDescriptor, ColumnId, IndexDescriptor, TableDescriptor};
use crate::error::{CatalogError, Result};
use crate::family::{Family, FamilyEntry};
use crate::fk::ForeignKeyConstraint;
use crate::index::{Index, IndexEntry};
use crate::object::StableId;
use crate::stats::StatisticsSnapshot;
use crate::table_stat::TableStat;
use crate::zone::ZoneConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Optimizer-facing table or materialized view.
#[derive(Debug)]
pub struct Table {
    desc: Arc<TableDescriptor>,
    codec: SqlCodec,

    /// Real, system and virtual columns, indexed by ordinal.
    columns: Vec<Column>,
    /// Column ID to ordinal, for real and system columns.
    col_map: HashMap<ColumnId, usize>,

    /// Primary index, then the deletable secondary indexes.
    indexes: Vec<IndexEntry>,
    num_public_indexes: usize,
    num_writable_indexes: usize,

    /// The snapshot the table was built from; staleness checks compare it by
    /// instance.
    raw_stats: StatisticsSnapshot,
    stats: Vec<TableStat>,

    zone: Arc<ZoneConfig>,
    families: Vec<FamilyEntry>,
    outbound_fks: Vec<ForeignKeyConstraint>,
    inbound_fks: Vec<ForeignKeyConstraint>,
    checks: Vec<CheckConstraint>,
}

impl Table {
    /// Builds the table model for `desc`.
    ///
    /// Fails only when the descriptor is not a table or materialized view, or
    /// when it is internally inconsistent (duplicate column IDs, an index or
    /// family naming a column the table does not have).
    pub fn new(
        desc: Arc<TableDescriptor>,
        codec: SqlCodec,
        stats: StatisticsSnapshot,
        zone: Arc<ZoneConfig>,
    ) -> Result<Table> {
        if desc.is_virtual_table() || !(desc.is_table() || desc.materialized_view()) {
            return Err(CatalogError::assertion(format!(
                "descriptor {} ({}) is not a table",
                desc.id, desc.name
            )));
        }
        let table_id = StableId::from(desc.id);

        // Real columns, tagged by mutation state.
        let num_public = desc.columns.len();
        let num_writable = desc.writable_columns().len();
        let deletable = desc.deletable_columns();
        let mut columns = Vec::with_capacity(deletable.len() + 1);
        let mut col_map = HashMap::with_capacity(deletable.len() + 1);
        for (ordinal, col) in deletable.iter().enumerate() {
            let kind = if ordinal < num_public {
                ColumnKind::Ordinary
            } else if ordinal < num_writable {
                ColumnKind::WriteOnly
            } else {
                ColumnKind::DeleteOnly
            };
            if col_map.insert(col.id, ordinal).is_some() {
                return Err(CatalogError::assertion(format!(
                    "table {} has duplicate column ID {}",
                    desc.name, col.id
                )));
            }
            columns.push(Column::non_virtual(ordinal, StableId::from(col.id), col, kind));
        }

        // System column, unless an old table already has a column by that name.
        if desc.find_column_by_name(MVCC_TIMESTAMP_COLUMN_NAME).is_none() {
            let ordinal = columns.len();
            col_map.insert(MVCC_TIMESTAMP_COLUMN_ID, ordinal);
            columns.push(Column::non_virtual(
                ordinal,
                StableId::from(MVCC_TIMESTAMP_COLUMN_ID),
                &MVCC_TIMESTAMP_COLUMN_DESC,
                ColumnKind::System,
            ));
        }

        let lookup = |id: ColumnId| -> Result<usize> {
            col_map.get(&id).copied().ok_or(CatalogError::UndefinedColumn(id))
        };

        // Virtual inverted-key columns, one per inverted secondary index.
        let secondary = desc.deletable_indexes();
        let mut inverted_cols = Vec::with_capacity(secondary.len());
        for idx in &secondary {
            if !idx.is_inverted() {
                inverted_cols.push(None);
                continue;
            }
            let source_id = idx.column_ids.first().copied().ok_or_else(|| {
                CatalogError::assertion(format!("inverted index {} has no key column", idx.name))
            })?;
            let source = lookup(source_id)?;
            let ordinal = columns.len();
            let virtual_col = Column::virtual_inverted(ordinal, &columns[source]);
            columns.push(virtual_col);
            inverted_cols.push(Some(ordinal));
        }

        let mut indexes = Vec::with_capacity(1 + secondary.len());
        indexes.push(IndexEntry::build(
            0,
            None,
            &desc.primary_index,
            ZoneConfig::for_index(&zone, desc.primary_index.id),
            &columns,
            &lookup,
            None,
        )?);
        for (pos, idx) in secondary.iter().enumerate() {
            indexes.push(IndexEntry::build(
                pos + 1,
                Some(pos),
                idx,
                ZoneConfig::for_index(&zone, idx.id),
                &columns,
                &lookup,
                inverted_cols[pos],
            )?);
        }

        let outbound_fks = desc
            .outbound_fks
            .iter()
            .map(|fk| ForeignKeyConstraint::outbound(table_id, fk))
            .collect();
        let inbound_fks = desc
            .inbound_fks
            .iter()
            .map(|fk| ForeignKeyConstraint::inbound(table_id, fk))
            .collect();

        let families = if desc.families.is_empty() {
            let real = columns
                .iter()
                .filter(|c| !c.is_virtual() && c.kind() != ColumnKind::System)
                .map(Column::ordinal)
                .collect();
            vec![FamilyEntry::synthesized_primary(real)]
        } else {
            desc.families
                .iter()
                .map(|f| {
                    let ordinals = f
                        .column_ids
                        .iter()
                        .map(|id| lookup(*id))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(FamilyEntry::from_descriptor(f, ordinals))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let mut checks: Vec<CheckConstraint> =
            desc.active_checks().map(CheckConstraint::declared).collect();
        checks.extend(synthesize_type_checks(&columns));

        let table_stats: Vec<TableStat> = (0..stats.len())
            .filter_map(|i| TableStat::bind(&stats, i, &col_map))
            .collect();

        let num_public_indexes = 1 + desc.indexes.len();
        let num_writable_indexes = 1 + desc.writable_indexes().len();

        trace!(
            "Built table '{}' (id={}, version={}): {} columns, {} indexes, {}/{} stats",
            desc.name,
            desc.id,
            desc.version,
            columns.len(),
            indexes.len(),
            table_stats.len(),
            stats.len()
        );

        Ok(Table {
            desc,
            codec,
            columns,
            col_map,
            indexes,
            num_public_indexes,
            num_writable_indexes,
            raw_stats: stats,
            stats: table_stats,
            zone,
            families,
            outbound_fks,
            inbound_fks,
            checks,
        })
    }

    pub fn id(&self) -> StableId {
        StableId::from(self.desc.id)
    }

    pub fn postgres_descriptor_id(&self) -> StableId {
        self.id()
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        &self.desc
    }

    pub fn codec(&self) -> &SqlCodec {
        &self.codec
    }

    pub fn is_virtual_table(&self) -> bool {
        false
    }

    pub fn is_materialized_view(&self) -> bool {
        self.desc.materialized_view()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, i: usize) -> &Column {
        &self.columns[i]
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The raw descriptor backing column `i`: a deletable column of the
    /// table, the synthesized system column descriptor, or `None` for a
    /// virtual column.
    pub fn column_descriptor(&self, i: usize) -> Option<&ColumnDescriptor> {
        match self.columns[i].kind() {
            ColumnKind::System => Some(&*MVCC_TIMESTAMP_COLUMN_DESC),
            ColumnKind::VirtualInverted => None,
            _ => self.desc.deletable_column(i),
        }
    }

    /// Ordinal of the column with the given ID.
    pub fn lookup_column_ordinal(&self, id: ColumnId) -> Result<usize> {
        self.col_map
            .get(&id)
            .copied()
            .ok_or(CatalogError::UndefinedColumn(id))
    }

    /// Number of public indexes, including the primary index.
    pub fn index_count(&self) -> usize {
        self.num_public_indexes
    }

    /// Public plus write-only indexes.
    pub fn writable_index_count(&self) -> usize {
        self.num_writable_indexes
    }

    /// All indexes, including delete-only ones.
    pub fn deletable_index_count(&self) -> usize {
        self.indexes.len()
    }

    pub fn index(&self, i: usize) -> Index<'_> {
        let entry = &self.indexes[i];
        Index {
            table: self,
            entry,
            desc: self.index_descriptor(entry),
        }
    }

    fn index_descriptor(&self, entry: &IndexEntry) -> &IndexDescriptor {
        match entry.secondary_position {
            None => &self.desc.primary_index,
            Some(pos) => match self.desc.deletable_index(pos) {
                Some(idx) => idx,
                None => panic!(
                    "assertion failed: index {} of table {} has no descriptor",
                    entry.ordinal, self.desc.name
                ),
            },
        }
    }

    pub fn statistic_count(&self) -> usize {
        self.stats.len()
    }

    pub fn statistic(&self, i: usize) -> &TableStat {
        &self.stats[i]
    }

    /// The statistics snapshot the table was built from, including
    /// statistics that could not be bound.
    pub fn raw_statistics(&self) -> &StatisticsSnapshot {
        &self.raw_stats
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn check(&self, i: usize) -> &CheckConstraint {
        &self.checks[i]
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn family(&self, i: usize) -> Family<'_> {
        Family {
            entry: &self.families[i],
            columns: &self.columns,
        }
    }

    pub fn outbound_foreign_key_count(&self) -> usize {
        self.outbound_fks.len()
    }

    pub fn outbound_foreign_key(&self, i: usize) -> &ForeignKeyConstraint {
        &self.outbound_fks[i]
    }

    pub fn inbound_foreign_key_count(&self) -> usize {
        self.inbound_fks.len()
    }

    pub fn inbound_foreign_key(&self, i: usize) -> &ForeignKeyConstraint {
        &self.inbound_fks[i]
    }

    /// The table's zone. Indexes may override it; see [`Index::zone`].
    pub fn zone(&self) -> &ZoneConfig {
        &self.zone
    }

    pub(crate) fn zone_arc(&self) -> &Arc<ZoneConfig> {
        &self.zone
    }

    pub(crate) fn index_zone_arc(&self, i: usize) -> &Arc<ZoneConfig> {
        &self.indexes[i].zone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{
        CheckDescriptor, ColumnDescriptor, ConstraintValidity, Direction, FamilyDescriptor,
        IndexType, Mutation, MutationState, MutationTarget,
    };
    use crate::stats::TableStatistic;
    use crate::types::{ColumnType, TypeFamily, UserDefinedType};
    use crate::zone::Subzone;
    use chrono::{TimeZone, Utc};

    fn col(id: ColumnId, name: &str, nullable: bool) -> ColumnDescriptor {
        ColumnDescriptor::new(id, name, ColumnType::int(), nullable)
    }

    fn primary(cols: Vec<ColumnId>) -> IndexDescriptor {
        IndexDescriptor {
            id: 1,
            name: "primary".into(),
            unique: true,
            column_ids: cols,
            ..Default::default()
        }
    }

    fn abc() -> TableDescriptor {
        TableDescriptor {
            id: 52,
            version: 1,
            name: "t".into(),
            parent_id: 50,
            parent_schema_id: 29,
            columns: vec![col(1, "a", false), col(2, "b", true), col(3, "c", false)],
            primary_index: primary(vec![1]),
            ..Default::default()
        }
    }

    fn build(desc: TableDescriptor) -> Table {
        Table::new(
            Arc::new(desc),
            SqlCodec::system(),
            StatisticsSnapshot::empty(),
            Arc::new(ZoneConfig::default()),
        )
        .unwrap()
    }

    fn stat(cols: Vec<ColumnId>) -> TableStatistic {
        TableStatistic {
            statistic_id: 1,
            table_id: 52,
            name: None,
            column_ids: cols,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            row_count: 100,
            distinct_count: 10,
            null_count: 0,
            histogram: None,
        }
    }

    #[test]
    fn test_system_column_appended() {
        let table = build(abc());
        assert_eq!(table.column_count(), 4);
        let sys = table.column(3);
        assert_eq!(sys.col_name(), MVCC_TIMESTAMP_COLUMN_NAME);
        assert_eq!(sys.kind(), ColumnKind::System);
        assert!(sys.is_hidden());
        assert!(!sys.is_nullable());
        assert_eq!(table.lookup_column_ordinal(MVCC_TIMESTAMP_COLUMN_ID).unwrap(), 3);
        assert_eq!(table.column_descriptor(3).unwrap().name, MVCC_TIMESTAMP_COLUMN_NAME);
    }

    #[test]
    fn test_system_column_name_collision() {
        let mut desc = abc();
        desc.columns.push(col(4, MVCC_TIMESTAMP_COLUMN_NAME, true));
        let table = build(desc);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.column(3).kind(), ColumnKind::Ordinary);
        assert!(table.lookup_column_ordinal(MVCC_TIMESTAMP_COLUMN_ID).is_err());
    }

    #[test]
    fn test_mutation_column_kinds() {
        let mut desc = abc();
        desc.mutations = vec![
            Mutation {
                state: MutationState::DeleteOnly,
                target: MutationTarget::Column(col(5, "e", true)),
            },
            Mutation {
                state: MutationState::WriteOnly,
                target: MutationTarget::Column(col(4, "d", true)),
            },
        ];
        let table = build(desc);
        assert_eq!(table.column(3).col_name(), "d");
        assert_eq!(table.column(3).kind(), ColumnKind::WriteOnly);
        assert_eq!(table.column(4).col_name(), "e");
        assert_eq!(table.column(4).kind(), ColumnKind::DeleteOnly);
        assert_eq!(table.column(5).kind(), ColumnKind::System);
        assert_eq!(table.column_descriptor(4).unwrap().name, "e");
    }

    #[test]
    fn test_primary_stored_columns() {
        let table = build(abc());
        let pk = table.index(0);
        assert_eq!(pk.key_column_count(), 1);
        assert_eq!(pk.stored_column_ids(), &[2, 3, MVCC_TIMESTAMP_COLUMN_ID]);
        assert_eq!(pk.column_count(), 4);
        assert_eq!(pk.column(1).column.col_name(), "b");
    }

    #[test]
    fn test_secondary_index_layout() {
        let mut desc = abc();
        desc.indexes.push(IndexDescriptor {
            id: 2,
            name: "t_c_idx".into(),
            column_ids: vec![3],
            column_directions: vec![Direction::Desc],
            extra_column_ids: vec![1],
            store_column_ids: vec![2],
            ..Default::default()
        });
        let table = build(desc);
        assert_eq!(table.index_count(), 2);
        let idx = table.index(1);
        assert_eq!(idx.name(), "t_c_idx");
        assert_eq!(idx.column_count(), 3);
        assert!(idx.column(0).descending);
        assert_eq!(idx.column(0).column.col_name(), "c");
        assert_eq!(idx.column(1).column.col_name(), "a");
        assert_eq!(idx.column(2).column.col_name(), "b");
        assert_eq!((idx.key_column_count(), idx.lax_key_column_count()), (2, 2));
    }

    #[test]
    fn test_inverted_virtual_column() {
        let mut desc = abc();
        desc.columns.push(ColumnDescriptor::new(4, "j", ColumnType::jsonb(), true));
        desc.indexes.push(IndexDescriptor {
            id: 2,
            name: "t_j_idx".into(),
            index_type: IndexType::Inverted,
            column_ids: vec![4],
            extra_column_ids: vec![1],
            ..Default::default()
        });
        let table = build(desc);
        // a, b, c, j, system, virtual
        assert_eq!(table.column_count(), 6);
        let virt = table.column(5);
        assert!(virt.is_virtual());
        assert!(!virt.is_nullable());
        assert_eq!(virt.datum_type(), &ColumnType::jsonb());
        assert_eq!(virt.inverted_source_column_ordinal(), Some(3));
        assert!(table.column_descriptor(5).is_none());

        let idx = table.index(1);
        assert_eq!(idx.column(0).column.ordinal(), 5);
        assert_eq!(idx.inverted_column_ordinal(), Some(5));
        // The primary index never stores virtual columns.
        assert_eq!(table.index(0).stored_column_ids(), &[2, 3, 4, MVCC_TIMESTAMP_COLUMN_ID]);
        assert_eq!(table.index(0).column_count(), 5);
    }

    #[test]
    fn test_mutation_indexes_counted() {
        let mut desc = abc();
        desc.indexes.push(IndexDescriptor {
            id: 2,
            name: "pub".into(),
            column_ids: vec![2],
            extra_column_ids: vec![1],
            ..Default::default()
        });
        desc.mutations.push(Mutation {
            state: MutationState::DeleteOnly,
            target: MutationTarget::Index(IndexDescriptor {
                id: 4,
                name: "del".into(),
                column_ids: vec![3],
                extra_column_ids: vec![1],
                ..Default::default()
            }),
        });
        desc.mutations.push(Mutation {
            state: MutationState::WriteOnly,
            target: MutationTarget::Index(IndexDescriptor {
                id: 3,
                name: "wr".into(),
                column_ids: vec![3],
                extra_column_ids: vec![1],
                ..Default::default()
            }),
        });
        let table = build(desc);
        assert_eq!(table.index_count(), 2);
        assert_eq!(table.writable_index_count(), 3);
        assert_eq!(table.deletable_index_count(), 4);
        assert_eq!(table.index(2).name(), "wr");
        assert_eq!(table.index(3).name(), "del");
    }

    #[test]
    fn test_synthesized_primary_family() {
        let table = build(abc());
        assert_eq!(table.family_count(), 1);
        let fam = table.family(0);
        assert_eq!(fam.name(), "primary");
        assert_eq!(fam.column_count(), 3);
        assert_eq!(fam.column(2).column.col_name(), "c");
    }

    #[test]
    fn test_declared_families() {
        let mut desc = abc();
        desc.families = vec![
            FamilyDescriptor {
                id: 0,
                name: "primary".into(),
                column_ids: vec![1, 2],
            },
            FamilyDescriptor {
                id: 1,
                name: "fam_c".into(),
                column_ids: vec![3],
            },
        ];
        let table = build(desc);
        assert_eq!(table.family_count(), 2);
        assert_eq!(table.family(1).name(), "fam_c");
        assert_eq!(table.family(1).column(0).ordinal, 2);
    }

    #[test]
    fn test_family_unknown_column() {
        let mut desc = abc();
        desc.families = vec![FamilyDescriptor {
            id: 0,
            name: "primary".into(),
            column_ids: vec![1, 99],
        }];
        let err = Table::new(
            Arc::new(desc),
            SqlCodec::system(),
            StatisticsSnapshot::empty(),
            Arc::new(ZoneConfig::default()),
        )
        .unwrap_err();
        assert_eq!(err, CatalogError::UndefinedColumn(99));
    }

    #[test]
    fn test_checks_declared_and_synthesized() {
        let mut desc = abc();
        desc.columns.push(ColumnDescriptor::new(
            4,
            "mood",
            ColumnType::enumeration(60, 1, "mood", ["x", "y"]),
            true,
        ));
        // A user-defined composite type has no member list to check against.
        desc.columns.push(ColumnDescriptor::new(
            5,
            "addr",
            ColumnType {
                family: TypeFamily::Tuple,
                oid: 100_061,
                user_defined: Some(UserDefinedType {
                    type_id: 61,
                    version: 1,
                    name: "address".into(),
                    enum_members: Vec::new(),
                }),
            },
            true,
        ));
        // Columns still being added are not constrained yet.
        desc.mutations.push(Mutation {
            state: MutationState::WriteOnly,
            target: MutationTarget::Column(ColumnDescriptor::new(
                6,
                "next_mood",
                ColumnType::enumeration(60, 1, "mood", ["x", "y"]),
                true,
            )),
        });
        desc.checks = vec![
            CheckDescriptor {
                name: "a_pos".into(),
                expr: "a > 0".into(),
                validity: ConstraintValidity::Unvalidated,
            },
            CheckDescriptor {
                name: "gone".into(),
                expr: "c > 0".into(),
                validity: ConstraintValidity::Dropping,
            },
        ];
        let table = build(desc);
        assert_eq!(table.column(5).col_name(), "next_mood");
        assert!(table.column(5).is_mutation());
        assert_eq!(table.check_count(), 2);
        assert_eq!(table.check(0).name.as_deref(), Some("a_pos"));
        assert!(!table.check(0).validated);
        assert!(table.check(1).is_synthesized());
        assert!(table.check(1).validated);
        assert_eq!(table.check(1).constraint, "mood IN ('x', 'y')");
    }

    #[test]
    fn test_stats_drop_missing_columns() {
        let desc = abc();
        let snapshot = StatisticsSnapshot::new(vec![stat(vec![1]), stat(vec![99]), stat(vec![2, 3])]);
        let table = Table::new(
            Arc::new(desc),
            SqlCodec::system(),
            snapshot.clone(),
            Arc::new(ZoneConfig::default()),
        )
        .unwrap();
        assert_eq!(table.statistic_count(), 2);
        assert_eq!(table.statistic(1).column_ordinal(1), 2);
        assert!(table.raw_statistics().same_instance(&snapshot));
    }

    #[test]
    fn test_index_zone_override() {
        let mut desc = abc();
        desc.indexes.push(IndexDescriptor {
            id: 2,
            name: "t_b_idx".into(),
            column_ids: vec![2],
            extra_column_ids: vec![1],
            ..Default::default()
        });
        let zone = Arc::new(ZoneConfig {
            num_replicas: Some(3),
            subzones: vec![Subzone {
                index_id: 2,
                partition_name: String::new(),
                config: ZoneConfig {
                    num_replicas: Some(5),
                    ..Default::default()
                },
            }],
            ..Default::default()
        });
        let table = Table::new(Arc::new(desc), SqlCodec::system(), StatisticsSnapshot::empty(), zone.clone())
            .unwrap();
        assert!(Arc::ptr_eq(table.index_zone_arc(0), &zone));
        assert_eq!(table.index(1).zone().num_replicas, Some(5));
    }

    #[test]
    fn test_rejects_views() {
        let mut desc = abc();
        desc.kind = crate::descriptor::RelationKind::View;
        let err = Table::new(
            Arc::new(desc),
            SqlCodec::system(),
            StatisticsSnapshot::empty(),
            Arc::new(ZoneConfig::default()),
        )
        .unwrap_err();
        assert_eq!(err.class(), crate::error::ErrorClass::Internal);
    }
}
