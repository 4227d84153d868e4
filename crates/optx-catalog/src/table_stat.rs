//! Statistics bound to a specific table instance.

use crate::descriptor::ColumnId;
use crate::stats::{Histogram, StatisticsSnapshot, TableStatistic};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A raw statistic whose column IDs have been translated to ordinals of the
/// table it was attached to.
#[derive(Debug, Clone)]
pub struct TableStat {
    snapshot: StatisticsSnapshot,
    position: usize,
    column_ordinals: Vec<usize>,
}

impl TableStat {
    /// Binds the statistic at `position` of `snapshot`. Returns `None` if it
    /// covers a column the table no longer has, which happens routinely when a
    /// column is dropped after the statistic was collected.
    pub(crate) fn bind(
        snapshot: &StatisticsSnapshot,
        position: usize,
        col_map: &HashMap<ColumnId, usize>,
    ) -> Option<Self> {
        let stat = snapshot.get(position)?;
        let column_ordinals = stat
            .column_ids
            .iter()
            .map(|id| col_map.get(id).copied())
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            snapshot: snapshot.clone(),
            position,
            column_ordinals,
        })
    }

    fn raw(&self) -> &TableStatistic {
        // The snapshot is immutable and `position` was validated in `bind`.
        match self.snapshot.get(self.position) {
            Some(stat) => stat,
            None => unreachable!("statistic position out of range"),
        }
    }

    /// Two statistics are equal if they were created at the same time on the
    /// same columns.
    pub fn equals(&self, other: &TableStat) -> bool {
        self.created_at() == other.created_at() && self.column_ordinals == other.column_ordinals
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.raw().created_at
    }

    pub fn column_count(&self) -> usize {
        self.column_ordinals.len()
    }

    pub fn column_ordinal(&self, i: usize) -> usize {
        self.column_ordinals[i]
    }

    pub fn row_count(&self) -> u64 {
        self.raw().row_count
    }

    pub fn distinct_count(&self) -> u64 {
        self.raw().distinct_count
    }

    pub fn null_count(&self) -> u64 {
        self.raw().null_count
    }

    pub fn histogram(&self) -> Option<&Histogram> {
        self.raw().histogram.as_ref()
    }
}
