//! # Catalog Collaborators
//!
//! The catalog adapter does not own any metadata. Descriptors, statistics,
//! privileges, types and zone configs all come from collaborators reached
//! through the traits in this module, each behind a trait object so that
//! production backends and test fixtures are interchangeable.
//!
//! ## Trait Design
//!
//! - [`NameResolver`]: turns partially qualified names into descriptors using
//!   the session's current database and search path.
//! - [`DescriptorProvider`]: fetches descriptors by ID. Returns the same `Arc`
//!   for as long as a descriptor version is current, which is what the
//!   session cache keys on.
//! - [`StatisticsProvider`]: returns a table's current statistics snapshot.
//! - [`PrivilegeChecker`]: enforces access. The adapter only asks; it never
//!   interprets privileges itself.
//! - [`TypeResolver`]: resolves type OIDs.
//! - [`SystemConfigSource`]: the gossiped zone configuration.
//!
//! Every call takes the request [`Context`] and, where an upstream descriptor
//! cache could be involved, the [`LookupFlags`] in effect.
//!
//! ## In-Memory Backend
//!
//! [`InMemoryCatalog`] implements every trait over `HashMap`s behind a
//! `parking_lot::RwLock`. It is populated programmatically and is what the
//! tests use. Replacing a table descriptor installs a new `Arc`, exactly like
//! a descriptor version bump in a real store.

use crate::config::SessionData;
use crate::context::Context;
use crate::descriptor::{
    DatabaseDescriptor, DescriptorId, DescriptorState, Oid, SchemaDescriptor, TableDescriptor,
};
use crate::error::{CatalogError, Result};
use crate::object::PrivilegeTarget;
use crate::schema::{DataSourceName, ResolvedSchema, SchemaKind, SchemaName, PUBLIC_SCHEMA_NAME};
use crate::stats::{StatisticsSnapshot, TableStatistic};
use crate::types::ColumnType;
use crate::zone::{GossipedSystemConfig, SystemConfig, SystemConfigSource};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Options forwarded to descriptor lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupFlags {
    /// Read through any descriptor cache instead of serving from it.
    pub avoid_cached: bool,
}

/// Privileges the optimizer may check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Privilege {
    All,
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Usage,
    Connect,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Privilege::All => "ALL",
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
            Privilege::Create => "CREATE",
            Privilege::Drop => "DROP",
            Privilege::Usage => "USAGE",
            Privilege::Connect => "CONNECT",
        };
        f.write_str(name)
    }
}

/// A resolved `database.schema` prefix.
#[derive(Debug, Clone)]
pub struct ResolvedPrefix {
    pub database: Arc<DatabaseDescriptor>,
    pub schema: ResolvedSchema,
    /// The input name with missing parts filled in. Explicit flags are kept
    /// as the user wrote them.
    pub name: SchemaName,
}

pub trait NameResolver: Send + Sync {
    /// Resolves a schema prefix against the session. `Ok(None)` when the
    /// database or schema does not exist, or when no database is known.
    fn resolve_prefix(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        session: &SessionData,
        name: &SchemaName,
    ) -> Result<Option<ResolvedPrefix>>;

    /// Looks up `database.schema` by name. `Ok(None)` when either is missing.
    fn lookup_schema(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        database: &str,
        schema: &str,
    ) -> Result<Option<ResolvedPrefix>>;

    /// Resolves a table-like object, returning its descriptor and the name
    /// with the prefix filled in. Fails with `UndefinedRelation` when no
    /// public object has that name.
    fn resolve_existing_table(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        session: &SessionData,
        name: &DataSourceName,
    ) -> Result<(Arc<TableDescriptor>, DataSourceName)>;

    /// Names of the objects in a schema, fully qualified.
    fn object_names(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        database: &DatabaseDescriptor,
        schema: &str,
    ) -> Result<Vec<DataSourceName>>;
}

pub trait DescriptorProvider: Send + Sync {
    /// Fails with `DescriptorNotFound` for unknown or dropped tables and with
    /// `TableBeingAdded` for tables that are still being created.
    fn table_by_id(&self, ctx: &Context, flags: LookupFlags, id: DescriptorId) -> Result<Arc<TableDescriptor>>;

    fn database_by_id(&self, ctx: &Context, flags: LookupFlags, id: DescriptorId) -> Result<Arc<DatabaseDescriptor>>;
}

pub trait StatisticsProvider: Send + Sync {
    fn table_statistics(&self, ctx: &Context, table: DescriptorId) -> Result<StatisticsSnapshot>;
}

pub trait PrivilegeChecker: Send + Sync {
    fn check_privilege(
        &self,
        ctx: &Context,
        user: &str,
        target: PrivilegeTarget<'_>,
        privilege: Privilege,
    ) -> Result<()>;

    /// Succeeds if the user holds any privilege on the target.
    fn check_any_privilege(&self, ctx: &Context, user: &str, target: PrivilegeTarget<'_>) -> Result<()>;

    fn has_admin_role(&self, ctx: &Context, user: &str) -> Result<bool>;

    /// Succeeds if the user may see objects in the schema `desc` lives in.
    fn can_resolve_under_schema(&self, ctx: &Context, user: &str, desc: &TableDescriptor) -> Result<()>;
}

pub trait TypeResolver: Send + Sync {
    fn resolve_type_by_oid(&self, ctx: &Context, flags: LookupFlags, oid: Oid) -> Result<ColumnType>;
}

/// The collaborators a catalog session talks to.
#[derive(Clone)]
pub struct Providers {
    pub names: Arc<dyn NameResolver>,
    pub descriptors: Arc<dyn DescriptorProvider>,
    pub statistics: Arc<dyn StatisticsProvider>,
    pub privileges: Arc<dyn PrivilegeChecker>,
    pub types: Arc<dyn TypeResolver>,
    pub system_config: Arc<dyn SystemConfigSource>,
}

impl Providers {
    /// Every collaborator served by one in-memory catalog.
    pub fn in_memory(catalog: Arc<InMemoryCatalog>) -> Self {
        Self {
            names: catalog.clone(),
            descriptors: catalog.clone(),
            statistics: catalog.clone(),
            privileges: catalog.clone(),
            types: catalog.clone(),
            system_config: catalog,
        }
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

/// User that holds every privilege.
pub const ROOT_USER: &str = "root";

#[derive(Debug, Default)]
struct State {
    databases: HashMap<DescriptorId, Arc<DatabaseDescriptor>>,
    schemas: HashMap<DescriptorId, Arc<SchemaDescriptor>>,
    /// Virtual schema name to ID.
    virtual_schemas: HashMap<String, DescriptorId>,
    tables: HashMap<DescriptorId, Arc<TableDescriptor>>,
    statistics: HashMap<DescriptorId, StatisticsSnapshot>,
    failing_statistics: HashSet<DescriptorId>,
    types: HashMap<Oid, ColumnType>,
    grants: HashMap<(String, DescriptorId), HashSet<Privilege>>,
    admins: HashSet<String>,
}

impl State {
    fn database_by_name(&self, name: &str) -> Option<&Arc<DatabaseDescriptor>> {
        self.databases.values().find(|db| db.name == name)
    }

    fn schema_in(&self, db: &DatabaseDescriptor, name: &str) -> Option<ResolvedSchema> {
        if name == PUBLIC_SCHEMA_NAME {
            return Some(ResolvedSchema::public());
        }
        if let Some(id) = self.virtual_schemas.get(name) {
            return Some(ResolvedSchema {
                kind: SchemaKind::Virtual,
                id: *id,
                name: name.to_string(),
                desc: None,
            });
        }
        self.schemas
            .values()
            .find(|s| s.parent_id == db.id && s.name == name)
            .map(|s| ResolvedSchema::user_defined(Arc::clone(s)))
    }

    fn lookup(&self, database: &str, schema: &str, name: SchemaName) -> Option<ResolvedPrefix> {
        let db = self.database_by_name(database)?;
        let schema = self.schema_in(db, schema)?;
        Some(ResolvedPrefix {
            database: Arc::clone(db),
            schema,
            name,
        })
    }

    /// A public table, view or sequence named `object` in the given schema.
    /// Virtual schemas are shared by every database.
    fn find_object(
        &self,
        db: Option<&DatabaseDescriptor>,
        schema: &ResolvedSchema,
        object: &str,
    ) -> Option<&Arc<TableDescriptor>> {
        self.tables.values().find(|t| {
            t.name == object
                && t.state == DescriptorState::Public
                && t.parent_schema_id == schema.id
                && (schema.kind == SchemaKind::Virtual || db.is_some_and(|db| db.id == t.parent_id))
        })
    }

    fn has_privilege(&self, user: &str, id: DescriptorId, privilege: Option<Privilege>) -> bool {
        if user == ROOT_USER || self.admins.contains(user) {
            return true;
        }
        match self.grants.get(&(user.to_string(), id)) {
            None => false,
            Some(held) => match privilege {
                None => !held.is_empty(),
                Some(p) => held.contains(&p) || held.contains(&Privilege::All),
            },
        }
    }
}

/// In-memory implementation of every catalog collaborator.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<State>,
    gossip: GossipedSystemConfig,
    last_lookup_flags: Mutex<Option<LookupFlags>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_database(&self, id: DescriptorId, name: &str) -> Arc<DatabaseDescriptor> {
        let db = Arc::new(DatabaseDescriptor {
            id,
            version: 1,
            name: name.to_string(),
        });
        self.state.write().databases.insert(id, Arc::clone(&db));
        db
    }

    pub fn add_schema(&self, desc: SchemaDescriptor) -> Arc<SchemaDescriptor> {
        let desc = Arc::new(desc);
        self.state.write().schemas.insert(desc.id, Arc::clone(&desc));
        desc
    }

    pub fn add_virtual_schema(&self, id: DescriptorId, name: &str) {
        self.state.write().virtual_schemas.insert(name.to_string(), id);
    }

    /// Installs (or replaces) a table-like descriptor. Each call produces a
    /// new descriptor instance.
    pub fn put_table(&self, desc: TableDescriptor) -> Arc<TableDescriptor> {
        let desc = Arc::new(desc);
        self.state.write().tables.insert(desc.id, Arc::clone(&desc));
        desc
    }

    pub fn table(&self, id: DescriptorId) -> Option<Arc<TableDescriptor>> {
        self.state.read().tables.get(&id).cloned()
    }

    /// Publishes a new statistics snapshot for the table and returns it.
    pub fn set_statistics(&self, table: DescriptorId, stats: Vec<TableStatistic>) -> StatisticsSnapshot {
        let snapshot = StatisticsSnapshot::new(stats);
        let mut state = self.state.write();
        state.failing_statistics.remove(&table);
        state.statistics.insert(table, snapshot.clone());
        snapshot
    }

    /// Makes statistics lookups for the table fail until statistics are set.
    pub fn fail_statistics(&self, table: DescriptorId) {
        self.state.write().failing_statistics.insert(table);
    }

    pub fn add_type(&self, oid: Oid, typ: ColumnType) {
        self.state.write().types.insert(oid, typ);
    }

    pub fn grant(&self, user: &str, object: DescriptorId, privilege: Privilege) {
        self.state
            .write()
            .grants
            .entry((user.to_string(), object))
            .or_default()
            .insert(privilege);
    }

    pub fn add_admin(&self, user: &str) {
        self.state.write().admins.insert(user.to_string());
    }

    pub fn publish_system_config(&self, config: SystemConfig) {
        self.gossip.publish(config);
    }

    /// Flags seen by the most recent descriptor lookup.
    pub fn last_lookup_flags(&self) -> Option<LookupFlags> {
        *self.last_lookup_flags.lock()
    }

    fn observe(&self, flags: LookupFlags) {
        *self.last_lookup_flags.lock() = Some(flags);
    }

    /// With `avoid_cached` set, hands out a fresh copy, as a store that
    /// bypasses its lease cache would.
    fn serve(desc: &Arc<TableDescriptor>, flags: LookupFlags) -> Arc<TableDescriptor> {
        if flags.avoid_cached {
            Arc::new(TableDescriptor::clone(desc))
        } else {
            Arc::clone(desc)
        }
    }
}

impl NameResolver for InMemoryCatalog {
    fn resolve_prefix(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        session: &SessionData,
        name: &SchemaName,
    ) -> Result<Option<ResolvedPrefix>> {
        ctx.check()?;
        self.observe(flags);
        let state = self.state.read();
        let database = if name.explicit_catalog {
            name.catalog.as_str()
        } else {
            session.database.as_str()
        };
        if database.is_empty() {
            return Ok(None);
        }
        let candidates: Vec<&str> = if name.explicit_schema {
            vec![name.schema.as_str()]
        } else if name.explicit_catalog {
            vec![PUBLIC_SCHEMA_NAME]
        } else {
            session.search_path.iter().map(String::as_str).collect()
        };
        for schema in candidates {
            let resolved = SchemaName {
                catalog: database.to_string(),
                schema: schema.to_string(),
                ..name.clone()
            };
            if let Some(prefix) = state.lookup(database, schema, resolved) {
                return Ok(Some(prefix));
            }
        }
        Ok(None)
    }

    fn lookup_schema(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        database: &str,
        schema: &str,
    ) -> Result<Option<ResolvedPrefix>> {
        ctx.check()?;
        self.observe(flags);
        Ok(self
            .state
            .read()
            .lookup(database, schema, SchemaName::new(database, schema)))
    }

    fn resolve_existing_table(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        session: &SessionData,
        name: &DataSourceName,
    ) -> Result<(Arc<TableDescriptor>, DataSourceName)> {
        ctx.check()?;
        self.observe(flags);
        let state = self.state.read();
        let database = if name.prefix.explicit_catalog {
            name.prefix.catalog.as_str()
        } else {
            session.database.as_str()
        };
        let db = state.database_by_name(database);
        let schemas: Vec<&str> = if name.prefix.explicit_schema {
            vec![name.prefix.schema.as_str()]
        } else {
            session.search_path.iter().map(String::as_str).collect()
        };
        for schema in schemas {
            let resolved = match (db, state.virtual_schemas.get(schema)) {
                (_, Some(id)) => ResolvedSchema {
                    kind: SchemaKind::Virtual,
                    id: *id,
                    name: schema.to_string(),
                    desc: None,
                },
                (Some(db), None) => match state.schema_in(db, schema) {
                    Some(s) => s,
                    None => continue,
                },
                (None, None) => continue,
            };
            if let Some(desc) = state.find_object(db.map(|d| &**d), &resolved, &name.object) {
                let mut out = name.clone();
                out.prefix.catalog = database.to_string();
                out.prefix.schema = schema.to_string();
                return Ok((Self::serve(desc, flags), out));
            }
        }
        Err(CatalogError::UndefinedRelation {
            name: name.to_string(),
            being_added: false,
        })
    }

    fn object_names(
        &self,
        ctx: &Context,
        flags: LookupFlags,
        database: &DatabaseDescriptor,
        schema: &str,
    ) -> Result<Vec<DataSourceName>> {
        ctx.check()?;
        self.observe(flags);
        let state = self.state.read();
        let Some(resolved) = state.schema_in(database, schema) else {
            return Err(CatalogError::InvalidSchema);
        };
        let mut names: Vec<DataSourceName> = state
            .tables
            .values()
            .filter(|t| {
                t.state == DescriptorState::Public
                    && t.parent_schema_id == resolved.id
                    && (resolved.kind == SchemaKind::Virtual || t.parent_id == database.id)
            })
            .map(|t| DataSourceName::new(&database.name, schema, &t.name))
            .collect();
        names.sort_by(|a, b| a.object.cmp(&b.object));
        Ok(names)
    }
}

impl DescriptorProvider for InMemoryCatalog {
    fn table_by_id(&self, ctx: &Context, flags: LookupFlags, id: DescriptorId) -> Result<Arc<TableDescriptor>> {
        ctx.check()?;
        self.observe(flags);
        let state = self.state.read();
        match state.tables.get(&id) {
            Some(desc) if desc.state == DescriptorState::Public => Ok(Self::serve(desc, flags)),
            Some(desc) if desc.state == DescriptorState::Add => Err(CatalogError::TableBeingAdded(id)),
            _ => Err(CatalogError::DescriptorNotFound(id)),
        }
    }

    fn database_by_id(&self, ctx: &Context, flags: LookupFlags, id: DescriptorId) -> Result<Arc<DatabaseDescriptor>> {
        ctx.check()?;
        self.observe(flags);
        self.state
            .read()
            .databases
            .get(&id)
            .cloned()
            .ok_or(CatalogError::UndefinedDatabase(id))
    }
}

impl StatisticsProvider for InMemoryCatalog {
    fn table_statistics(&self, ctx: &Context, table: DescriptorId) -> Result<StatisticsSnapshot> {
        ctx.check()?;
        let state = self.state.read();
        if state.failing_statistics.contains(&table) {
            return Err(CatalogError::StatisticsUnavailable {
                table,
                reason: "statistics table unavailable".to_string(),
            });
        }
        Ok(state.statistics.get(&table).cloned().unwrap_or_default())
    }
}

impl PrivilegeChecker for InMemoryCatalog {
    fn check_privilege(
        &self,
        ctx: &Context,
        user: &str,
        target: PrivilegeTarget<'_>,
        privilege: Privilege,
    ) -> Result<()> {
        ctx.check()?;
        if self.state.read().has_privilege(user, target.id(), Some(privilege)) {
            return Ok(());
        }
        Err(CatalogError::PermissionDenied {
            user: user.to_string(),
            privilege: privilege.to_string(),
            object: target.name().to_string(),
        })
    }

    fn check_any_privilege(&self, ctx: &Context, user: &str, target: PrivilegeTarget<'_>) -> Result<()> {
        ctx.check()?;
        if self.state.read().has_privilege(user, target.id(), None) {
            return Ok(());
        }
        Err(CatalogError::PermissionDenied {
            user: user.to_string(),
            privilege: "any".to_string(),
            object: target.name().to_string(),
        })
    }

    fn has_admin_role(&self, ctx: &Context, user: &str) -> Result<bool> {
        ctx.check()?;
        Ok(user == ROOT_USER || self.state.read().admins.contains(user))
    }

    fn can_resolve_under_schema(&self, ctx: &Context, user: &str, desc: &TableDescriptor) -> Result<()> {
        ctx.check()?;
        let state = self.state.read();
        // Only user-defined schemas carry privileges of their own.
        let Some(schema) = state.schemas.get(&desc.parent_schema_id) else {
            return Ok(());
        };
        if state.has_privilege(user, schema.id, Some(Privilege::Usage)) {
            return Ok(());
        }
        Err(CatalogError::PermissionDenied {
            user: user.to_string(),
            privilege: Privilege::Usage.to_string(),
            object: schema.name.clone(),
        })
    }
}

impl TypeResolver for InMemoryCatalog {
    fn resolve_type_by_oid(&self, ctx: &Context, flags: LookupFlags, oid: Oid) -> Result<ColumnType> {
        ctx.check()?;
        self.observe(flags);
        self.state
            .read()
            .types
            .get(&oid)
            .cloned()
            .ok_or(CatalogError::UndefinedType(oid))
    }
}

impl SystemConfigSource for InMemoryCatalog {
    fn system_config(&self) -> Option<Arc<SystemConfig>> {
        self.gossip.system_config()
    }
}
