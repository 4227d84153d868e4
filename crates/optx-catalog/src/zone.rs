//! # Placement (Zone) Configuration
//!
//! Zone configs describe replication and locality policy. The catalog only
//! consumes them: the process-wide [`SystemConfig`] snapshot is gossiped and
//! replaced wholesale, never mutated, so sessions hold it by `Arc` and re-read
//! it only when their catalog is reset.
//!
//! A table's zone may carry *subzones*. A subzone that names an index but no
//! partition applies to the whole index and overrides the table's settings
//! for it; partition-scoped subzones cover only part of an index and are
//! ignored by the optimizer.

use crate::codec::SqlCodec;
use crate::descriptor::{DescriptorId, IndexId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Zone lookups from secondary tenants resolve to this object's zone.
pub const TENANTS_RANGES_ID: DescriptorId = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Required,
    Prohibited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaConstraint {
    pub kind: ConstraintKind,
    pub key: String,
    pub value: String,
}

/// Constraints that must hold for `num_replicas` replicas (0 means all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintsConjunction {
    pub num_replicas: i32,
    pub constraints: Vec<ReplicaConstraint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeasePreference {
    pub constraints: Vec<ReplicaConstraint>,
}

/// Replication policy for a table or index. `None` fields are inherited from
/// the parent zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub num_replicas: Option<i32>,
    pub num_voters: Option<i32>,
    pub range_min_bytes: Option<i64>,
    pub range_max_bytes: Option<i64>,
    pub gc_ttl_seconds: Option<i32>,
    pub global_reads: Option<bool>,
    pub constraints: Option<Vec<ConstraintsConjunction>>,
    pub voter_constraints: Option<Vec<ConstraintsConjunction>>,
    pub lease_preferences: Option<Vec<LeasePreference>>,
    pub subzones: Vec<Subzone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subzone {
    pub index_id: IndexId,
    /// Empty when the subzone applies to the whole index.
    pub partition_name: String,
    pub config: ZoneConfig,
}

impl ZoneConfig {
    /// Fills every unset field from `parent`. Subzones are never inherited.
    pub fn inherit_from_parent(&mut self, parent: &ZoneConfig) {
        fn fill<T: Clone>(slot: &mut Option<T>, parent: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(parent);
            }
        }
        fill(&mut self.num_replicas, &parent.num_replicas);
        fill(&mut self.num_voters, &parent.num_voters);
        fill(&mut self.range_min_bytes, &parent.range_min_bytes);
        fill(&mut self.range_max_bytes, &parent.range_max_bytes);
        fill(&mut self.gc_ttl_seconds, &parent.gc_ttl_seconds);
        fill(&mut self.global_reads, &parent.global_reads);
        fill(&mut self.constraints, &parent.constraints);
        fill(&mut self.voter_constraints, &parent.voter_constraints);
        fill(&mut self.lease_preferences, &parent.lease_preferences);
    }

    /// The subzone that applies to an entire index, if any. When several
    /// match, the last one wins.
    pub fn index_subzone(&self, index_id: IndexId) -> Option<&Subzone> {
        self.subzones
            .iter()
            .filter(|s| s.index_id == index_id && s.partition_name.is_empty())
            .last()
    }

    /// Effective zone of an index of a table whose zone is `table_zone`.
    ///
    /// Returns the table zone itself (same `Arc`) when no whole-index subzone
    /// applies, so consecutive indexes share one allocation.
    pub fn for_index(table_zone: &Arc<ZoneConfig>, index_id: IndexId) -> Arc<ZoneConfig> {
        match table_zone.index_subzone(index_id) {
            Some(subzone) => {
                let mut zone = subzone.config.clone();
                zone.inherit_from_parent(table_zone);
                Arc::new(zone)
            }
            None => Arc::clone(table_zone),
        }
    }
}

/// Gossiped snapshot of the cluster's zone configs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub version: u64,
    pub zones: HashMap<DescriptorId, Arc<ZoneConfig>>,
}

impl SystemConfig {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            zones: HashMap::new(),
        }
    }

    pub fn with_zone(mut self, id: DescriptorId, zone: ZoneConfig) -> Self {
        self.zones.insert(id, Arc::new(zone));
        self
    }

    /// Zone config for the object, or `None` when the object has none of its
    /// own (callers then use an empty, constraint-free zone). Secondary
    /// tenants all read the tenant-ranges zone.
    pub fn zone_config_for_object(&self, codec: &SqlCodec, id: DescriptorId) -> Option<Arc<ZoneConfig>> {
        let key = if codec.for_system_tenant() {
            id
        } else {
            TENANTS_RANGES_ID
        };
        self.zones.get(&key).cloned()
    }
}

/// Process-wide source of the latest gossiped [`SystemConfig`].
pub trait SystemConfigSource: Send + Sync {
    /// The latest snapshot, or `None` when the process has not received one
    /// yet (e.g. during startup).
    fn system_config(&self) -> Option<Arc<SystemConfig>>;
}

/// Copy-on-write holder for the gossiped config. Publishing swaps the whole
/// snapshot; readers keep whatever `Arc` they already took.
#[derive(Debug, Default)]
pub struct GossipedSystemConfig {
    current: RwLock<Option<Arc<SystemConfig>>>,
}

impl GossipedSystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, config: SystemConfig) {
        *self.current.write() = Some(Arc::new(config));
    }
}

impl SystemConfigSource for GossipedSystemConfig {
    fn system_config(&self) -> Option<Arc<SystemConfig>> {
        self.current.read().clone()
    }
}
