//! # Table Statistics Snapshots
//!
//! Statistics are computed elsewhere (by a statistics job) and handed to the
//! catalog as an ordered, immutable [`StatisticsSnapshot`]. The provider
//! replaces a table's snapshot atomically when new statistics arrive, which is
//! what makes the snapshot's *instance identity* a sound and cheap proxy for
//! "unchanged" in staleness checks: two lookups that return the same `Arc`
//! saw the same statistics.
//!
//! ## Statistic Records
//!
//! Each [`TableStatistic`] covers one or more columns (by column ID) and
//! records row, distinct and null counts at its creation time, plus an
//! optional histogram for single-column statistics. The catalog translates the
//! column IDs to ordinals of a specific table instance; see
//! [`crate::table_stat`].

use crate::descriptor::{ColumnId, DescriptorId};
use crate::expr::Datum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single statistic over a set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatistic {
    pub statistic_id: u64,
    pub table_id: DescriptorId,
    pub name: Option<String>,
    pub column_ids: Vec<ColumnId>,
    pub created_at: DateTime<Utc>,
    pub row_count: u64,
    pub distinct_count: u64,
    pub null_count: u64,
    pub histogram: Option<Histogram>,
}

/// Equi-depth histogram over the first column of a statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub buckets: Vec<HistogramBucket>,
}

/// A single histogram bucket.
///
/// Buckets are ordered by `upper_bound`. `num_eq` rows equal the upper bound;
/// `num_range` rows fall strictly between the previous bucket's upper bound
/// and this one, spread over `distinct_range` distinct values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub num_eq: f64,
    pub num_range: f64,
    pub distinct_range: f64,
    pub upper_bound: Datum,
}

/// Immutable, ordered list of a table's statistics, shared by reference.
#[derive(Debug, Clone, Default)]
pub struct StatisticsSnapshot(Option<Arc<[TableStatistic]>>);

impl StatisticsSnapshot {
    /// The empty snapshot, used when statistics are disabled or unavailable.
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn new(stats: Vec<TableStatistic>) -> Self {
        if stats.is_empty() {
            return Self::empty();
        }
        Self(Some(stats.into()))
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<&TableStatistic> {
        self.0.as_ref().and_then(|s| s.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableStatistic> {
        self.0.iter().flat_map(|s| s.iter())
    }

    /// True if both snapshots are the same instance. Two empty snapshots are
    /// always the same.
    pub fn same_instance(&self, other: &StatisticsSnapshot) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Vec<TableStatistic>> for StatisticsSnapshot {
    fn from(stats: Vec<TableStatistic>) -> Self {
        Self::new(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stat(cols: Vec<ColumnId>) -> TableStatistic {
        TableStatistic {
            statistic_id: 1,
            table_id: 52,
            name: None,
            column_ids: cols,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            row_count: 1000,
            distinct_count: 10,
            null_count: 0,
            histogram: None,
        }
    }

    #[test]
    fn test_snapshot_identity() {
        let a = StatisticsSnapshot::new(vec![stat(vec![1])]);
        let a2 = a.clone();
        let b = StatisticsSnapshot::new(vec![stat(vec![1])]);
        assert!(a.same_instance(&a2));
        assert!(!a.same_instance(&b));
        assert!(StatisticsSnapshot::empty().same_instance(&StatisticsSnapshot::new(vec![])));
        assert_eq!(a.len(), 1);
        assert_eq!(a.iter().count(), 1);
    }
}
