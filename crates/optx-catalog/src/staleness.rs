//! # Staleness and Equality
//!
//! A built [`Table`] embeds statistics and zone snapshots that can change
//! without the table descriptor's version changing. Two predicates decide
//! whether such a table can still be used:
//!
//! - [`Table::is_stale`] runs on every cache hit. It may report a table stale
//!   when it is not (the cost is one rebuild) but must never miss a real
//!   change.
//! - [`Table::equals`] compares tables built in different transactions, e.g.
//!   to decide whether a cached plan is still valid.
//!
//! Statistics are compared by snapshot instance in `is_stale` and by content
//! in `equals`; zones are always compared deeply.

use crate::descriptor::TableDescriptor;
use crate::stats::StatisticsSnapshot;
use crate::table::Table;
use crate::zone::ZoneConfig;
use std::sync::Arc;

impl Table {
    /// Reports whether this table was built from data that differs from the
    /// given descriptor, statistics and zone.
    pub fn is_stale(&self, desc: &TableDescriptor, stats: &StatisticsSnapshot, zone: &ZoneConfig) -> bool {
        let raw = self.raw_statistics();
        if raw.len() != stats.len() {
            return true;
        }
        if !stats.is_empty() && !raw.same_instance(stats) {
            return true;
        }
        if self.zone_arc().as_ref() != zone {
            return true;
        }
        !self.descriptor().user_defined_type_cols_have_same_version(desc)
    }

    /// Reports whether both tables describe the same logical snapshot.
    pub fn equals(&self, other: &Table) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let (a, b) = (self.descriptor(), other.descriptor());
        if a.id != b.id || a.version != b.version {
            return false;
        }

        if self.statistic_count() != other.statistic_count() {
            return false;
        }
        for i in 0..self.statistic_count() {
            if !self.statistic(i).equals(other.statistic(i)) {
                return false;
            }
        }

        if !a.user_defined_type_cols_have_same_version(b) {
            return false;
        }

        // Same ID and version, so both have the same indexes. Consecutive
        // indexes usually share the table's zone, so only compare when either
        // side changes.
        if self.deletable_index_count() != other.deletable_index_count() {
            return false;
        }
        let mut prev: Option<(&Arc<ZoneConfig>, &Arc<ZoneConfig>)> = None;
        for i in 0..self.deletable_index_count() {
            let left = self.index_zone_arc(i);
            let right = other.index_zone_arc(i);
            if let Some((prev_left, prev_right)) = prev {
                if Arc::ptr_eq(left, prev_left) && Arc::ptr_eq(right, prev_right) {
                    continue;
                }
            }
            if left != right {
                return false;
            }
            prev = Some((left, right));
        }
        true
    }
}
