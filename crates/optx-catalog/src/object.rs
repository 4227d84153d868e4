//! # Catalog Objects
//!
//! Everything the optimizer resolves is either a [`Schema`] or a
//! [`DataSource`]. Data sources are a closed set of variants (tables, views,
//! sequences, virtual tables); every operation that depends on the variant
//! matches on it exhaustively.
//!
//! All objects expose a stable ID, a Postgres descriptor ID (which differs
//! from the stable ID only for virtual tables) and an equality predicate that
//! says whether two instances, possibly built in different transactions,
//! describe the same logical snapshot.

use crate::descriptor::{DatabaseDescriptor, DescriptorId, SchemaDescriptor, TableDescriptor};
use crate::schema::Schema;
use crate::table::Table;
use crate::virtual_table::VirtualTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier the optimizer uses to refer to a catalog object. Usually the
/// descriptor ID; synthesized for virtual tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StableId(pub u64);

impl From<DescriptorId> for StableId {
    fn from(id: DescriptorId) -> Self {
        StableId(id as u64)
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (non-materialized) view.
#[derive(Debug, Clone)]
pub struct View {
    desc: Arc<TableDescriptor>,
}

impl View {
    pub fn new(desc: Arc<TableDescriptor>) -> Self {
        Self { desc }
    }

    pub fn id(&self) -> StableId {
        StableId::from(self.desc.id)
    }

    pub fn postgres_descriptor_id(&self) -> StableId {
        self.id()
    }

    pub fn equals(&self, other: &View) -> bool {
        self.desc.id == other.desc.id && self.desc.version == other.desc.version
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn is_system_view(&self) -> bool {
        self.desc.is_virtual_table()
    }

    pub fn query(&self) -> &str {
        &self.desc.view_query
    }

    pub fn column_name_count(&self) -> usize {
        self.desc.columns.len()
    }

    pub fn column_name(&self, i: usize) -> &str {
        &self.desc.columns[i].name
    }

    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        &self.desc
    }
}

#[derive(Debug, Clone)]
pub struct Sequence {
    desc: Arc<TableDescriptor>,
}

impl Sequence {
    pub fn new(desc: Arc<TableDescriptor>) -> Self {
        Self { desc }
    }

    pub fn id(&self) -> StableId {
        StableId::from(self.desc.id)
    }

    pub fn postgres_descriptor_id(&self) -> StableId {
        self.id()
    }

    pub fn equals(&self, other: &Sequence) -> bool {
        self.desc.id == other.desc.id && self.desc.version == other.desc.version
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        &self.desc
    }
}

/// A resolved table-like object. Cloning is cheap.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A table or materialized view.
    Table(Arc<Table>),
    View(Arc<View>),
    Sequence(Arc<Sequence>),
    VirtualTable(Arc<VirtualTable>),
}

impl DataSource {
    pub fn id(&self) -> StableId {
        match self {
            DataSource::Table(t) => t.id(),
            DataSource::View(v) => v.id(),
            DataSource::Sequence(s) => s.id(),
            DataSource::VirtualTable(vt) => vt.id(),
        }
    }

    pub fn postgres_descriptor_id(&self) -> StableId {
        match self {
            DataSource::Table(t) => t.postgres_descriptor_id(),
            DataSource::View(v) => v.postgres_descriptor_id(),
            DataSource::Sequence(s) => s.postgres_descriptor_id(),
            DataSource::VirtualTable(vt) => vt.postgres_descriptor_id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DataSource::Table(t) => t.name(),
            DataSource::View(v) => v.name(),
            DataSource::Sequence(s) => s.name(),
            DataSource::VirtualTable(vt) => vt.name(),
        }
    }

    /// Same-variant equality; objects of different variants are never equal.
    pub fn equals(&self, other: &DataSource) -> bool {
        match (self, other) {
            (DataSource::Table(a), DataSource::Table(b)) => a.equals(b),
            (DataSource::View(a), DataSource::View(b)) => a.equals(b),
            (DataSource::Sequence(a), DataSource::Sequence(b)) => a.equals(b),
            (DataSource::VirtualTable(a), DataSource::VirtualTable(b)) => a.equals(b),
            _ => false,
        }
    }

    /// The raw descriptor backing this data source.
    pub fn descriptor(&self) -> &Arc<TableDescriptor> {
        match self {
            DataSource::Table(t) => t.descriptor(),
            DataSource::View(v) => v.descriptor(),
            DataSource::Sequence(s) => s.descriptor(),
            DataSource::VirtualTable(vt) => vt.descriptor(),
        }
    }

    pub fn as_table(&self) -> Option<&Arc<Table>> {
        match self {
            DataSource::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_view(&self) -> Option<&Arc<View>> {
        match self {
            DataSource::View(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Arc<Sequence>> {
        match self {
            DataSource::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_virtual_table(&self) -> Option<&Arc<VirtualTable>> {
        match self {
            DataSource::VirtualTable(vt) => Some(vt),
            _ => None,
        }
    }
}

/// Any object privileges can be checked against.
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    Schema(&'a Schema),
    DataSource(&'a DataSource),
}

impl<'a> From<&'a Schema> for ObjectRef<'a> {
    fn from(s: &'a Schema) -> Self {
        ObjectRef::Schema(s)
    }
}

impl<'a> From<&'a DataSource> for ObjectRef<'a> {
    fn from(ds: &'a DataSource) -> Self {
        ObjectRef::DataSource(ds)
    }
}

/// The descriptor whose privileges govern access to an object.
#[derive(Debug, Clone, Copy)]
pub enum PrivilegeTarget<'a> {
    Database(&'a DatabaseDescriptor),
    Schema(&'a SchemaDescriptor),
    Table(&'a TableDescriptor),
}

impl PrivilegeTarget<'_> {
    pub fn id(&self) -> DescriptorId {
        match self {
            PrivilegeTarget::Database(d) => d.id,
            PrivilegeTarget::Schema(s) => s.id,
            PrivilegeTarget::Table(t) => t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PrivilegeTarget::Database(d) => &d.name,
            PrivilegeTarget::Schema(s) => &s.name,
            PrivilegeTarget::Table(t) => &t.name,
        }
    }
}

impl<'a> ObjectRef<'a> {
    /// Maps the object to the descriptor its privileges are recorded on.
    pub fn privilege_target(&self) -> PrivilegeTarget<'a> {
        match *self {
            ObjectRef::Schema(s) => s.descriptor_for_permissions_check(),
            ObjectRef::DataSource(ds) => PrivilegeTarget::Table(ds.descriptor().as_ref()),
        }
    }
}
