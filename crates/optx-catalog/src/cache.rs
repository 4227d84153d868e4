//! # Session Data-Source Cache
//!
//! Maps a raw table descriptor, by instance, to the data source built from
//! it. The descriptor provider hands out the same `Arc` for as long as a
//! descriptor version is current, so a new version (or a re-fetch) naturally
//! misses. Tables additionally go through a staleness check on every hit; that
//! check lives in the facade because it needs fresh statistics and zones.
//!
//! The cache is owned by one session and never shared. It is bounded only at
//! reset points: [`DataSourceCache::reset_if_oversized`] discards everything
//! once the map has grown past the configured threshold.

use crate::descriptor::TableDescriptor;
use crate::object::DataSource;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Descriptor identity used as the cache key. Holding the `Arc` keeps the
/// address from being reused while the entry is alive.
#[derive(Debug, Clone)]
struct DescriptorKey(Arc<TableDescriptor>);

impl PartialEq for DescriptorKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DescriptorKey {}

impl Hash for DescriptorKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

#[derive(Debug, Default)]
pub struct DataSourceCache {
    entries: HashMap<DescriptorKey, DataSource>,
}

impl DataSourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, desc: &Arc<TableDescriptor>) -> Option<&DataSource> {
        self.entries.get(&DescriptorKey(Arc::clone(desc)))
    }

    /// Caches `ds` for `desc`, replacing any previous entry.
    pub fn put(&mut self, desc: &Arc<TableDescriptor>, ds: DataSource) {
        self.entries.insert(DescriptorKey(Arc::clone(desc)), ds);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards every entry if there are more than `threshold`. Returns
    /// whether the cache was cleared.
    pub fn reset_if_oversized(&mut self, threshold: usize) -> bool {
        if self.entries.len() <= threshold {
            return false;
        }
        debug!(
            "Discarding data source cache: {} entries exceeds threshold {}",
            self.entries.len(),
            threshold
        );
        self.entries = HashMap::new();
        true
    }
}
