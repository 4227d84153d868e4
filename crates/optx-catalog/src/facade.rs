//! # Optimizer Catalog
//!
//! [`OptCatalog`] is the optimizer's single entry point into schema metadata.
//! One instance belongs to one planning session; it is never shared, so it
//! needs no locking of its own.
//!
//! ## Resolution Flow
//!
//! ```text
//! name / ID ──► NameResolver / DescriptorProvider ──► raw descriptor
//!                                                        │
//!                        privilege check ◄───────────────┤
//!                                                        ▼
//!                          DataSourceCache ──hit──► staleness check (tables)
//!                                │ miss / stale                │ fresh
//!                                ▼                             ▼
//!                    Table / View / Sequence builder ──► DataSource
//! ```
//!
//! Views and sequences are cached unconditionally by descriptor instance.
//! Tables and materialized views are re-validated on every hit because their
//! statistics and zone can change without a descriptor version bump. Virtual
//! tables are rebuilt on every resolution because their identity depends on
//! the database they are resolved under.
//!
//! ## Reset Points
//!
//! [`OptCatalog::reset`] runs between independent planning attempts. It
//! bounds the cache and re-reads the gossiped zone configuration; the
//! configuration is never refreshed in between.

use crate::cache::DataSourceCache;
use crate::catalog::{LookupFlags, Privilege, Providers};
use crate::config::{CatalogConfig, Flags, SessionData};
use crate::context::Context;
use crate::descriptor::{DescriptorId, Oid, TableDescriptor};
use crate::error::{CatalogError, ErrorClass, Result};
use crate::object::{DataSource, ObjectRef, Sequence, StableId, View};
use crate::schema::{DataSourceName, Schema, SchemaName, PUBLIC_SCHEMA_NAME};
use crate::stats::StatisticsSnapshot;
use crate::table::Table;
use crate::types::ColumnType;
use crate::virtual_table::{VirtualTable, VirtualTableScope};
use crate::zone::{SystemConfig, ZoneConfig};
use std::sync::Arc;
use tracing::{debug, warn};

/// Session-scoped catalog used by the optimizer.
#[derive(Debug)]
pub struct OptCatalog {
    providers: Providers,
    config: CatalogConfig,
    session: SessionData,
    cache: DataSourceCache,
    /// Zone configuration as of the last reset; `None` until the process has
    /// received one.
    system_config: Option<Arc<SystemConfig>>,
    /// Set for the duration of a call made with
    /// [`Flags::avoid_descriptor_caches`].
    avoid_cached_descriptors: bool,
    empty_zone: Arc<ZoneConfig>,
}

impl OptCatalog {
    pub fn new(providers: Providers, config: CatalogConfig, session: SessionData) -> Self {
        let system_config = providers.system_config.system_config();
        Self {
            providers,
            config,
            session,
            cache: DataSourceCache::new(),
            system_config,
            avoid_cached_descriptors: false,
            empty_zone: Arc::new(ZoneConfig::default()),
        }
    }

    /// Prepares the catalog for a new planning attempt: discards the cache if
    /// it has grown too large and picks up the latest zone configuration.
    pub fn reset(&mut self) {
        self.cache.reset_if_oversized(self.config.cache_reset_threshold);
        self.system_config = self.providers.system_config.system_config();
    }

    pub fn session(&self) -> &SessionData {
        &self.session
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Number of cached data sources.
    pub fn cached_data_source_count(&self) -> usize {
        self.cache.len()
    }

    /// Runs `f` with the descriptor-cache bypass turned on if the flags ask
    /// for it. The previous setting is restored whatever `f` returns.
    fn with_flags<T>(&mut self, flags: Flags, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let prev = self.avoid_cached_descriptors;
        if flags.avoid_descriptor_caches {
            self.avoid_cached_descriptors = true;
        }
        let result = f(self);
        self.avoid_cached_descriptors = prev;
        result
    }

    fn lookup_flags(&self) -> LookupFlags {
        LookupFlags {
            avoid_cached: self.avoid_cached_descriptors,
        }
    }

    /// Resolves a possibly partially qualified schema name. Returns the
    /// schema and the name with the missing parts filled in.
    pub fn resolve_schema(&mut self, ctx: &Context, flags: Flags, name: &SchemaName) -> Result<(Schema, SchemaName)> {
        self.with_flags(flags, |oc| {
            ctx.check()?;
            let prefix = oc
                .providers
                .names
                .resolve_prefix(ctx, oc.lookup_flags(), &oc.session, name)?;
            match prefix {
                Some(p) => {
                    let resolved = p.name.clone();
                    Ok((Schema::new(p.database, p.schema, p.name), resolved))
                }
                None if name.is_empty() => Err(CatalogError::NoDatabaseSpecified),
                None => Err(CatalogError::InvalidSchema),
            }
        })
    }

    /// Resolves a table, view, sequence or virtual table by name, after
    /// checking that the user may resolve objects in its schema.
    pub fn resolve_data_source(
        &mut self,
        ctx: &Context,
        flags: Flags,
        name: &DataSourceName,
    ) -> Result<(DataSource, DataSourceName)> {
        self.with_flags(flags, |oc| {
            ctx.check()?;
            let (desc, resolved) =
                oc.providers
                    .names
                    .resolve_existing_table(ctx, oc.lookup_flags(), &oc.session, name)?;
            oc.providers
                .privileges
                .can_resolve_under_schema(ctx, &oc.session.user, &desc)?;
            let ds = oc.data_source_for_desc(ctx, flags, desc, &resolved)?;
            Ok((ds, resolved))
        })
    }

    /// Resolves a data source by stable ID.
    ///
    /// A missing table and a table that is still being added both fail with
    /// `UndefinedRelation`; the latter has `being_added` set (see
    /// [`CatalogError::is_being_added`]). A virtual table resolved by ID is
    /// scoped to all databases.
    pub fn resolve_data_source_by_id(&mut self, ctx: &Context, flags: Flags, id: StableId) -> Result<DataSource> {
        self.with_flags(flags, |oc| {
            ctx.check()?;
            let undefined = |being_added| CatalogError::UndefinedRelation {
                name: format!("[{}]", id),
                being_added,
            };
            let Ok(desc_id) = DescriptorId::try_from(id.0) else {
                return Err(undefined(false));
            };
            let desc = match oc.providers.descriptors.table_by_id(ctx, oc.lookup_flags(), desc_id) {
                Ok(desc) => desc,
                Err(CatalogError::DescriptorNotFound(_)) => return Err(undefined(false)),
                Err(CatalogError::TableBeingAdded(_)) => return Err(undefined(true)),
                Err(err) => return Err(err),
            };
            // Only virtual tables use the name.
            oc.data_source_for_desc(ctx, flags, desc, &DataSourceName::default())
        })
    }

    pub fn resolve_type_by_oid(&mut self, ctx: &Context, flags: Flags, oid: Oid) -> Result<ColumnType> {
        self.with_flags(flags, |oc| {
            ctx.check()?;
            oc.providers.types.resolve_type_by_oid(ctx, oc.lookup_flags(), oid)
        })
    }

    pub fn check_privilege<'a>(
        &self,
        ctx: &Context,
        object: impl Into<ObjectRef<'a>>,
        privilege: Privilege,
    ) -> Result<()> {
        ctx.check()?;
        let object = object.into();
        self.providers
            .privileges
            .check_privilege(ctx, &self.session.user, object.privilege_target(), privilege)
    }

    pub fn check_any_privilege<'a>(&self, ctx: &Context, object: impl Into<ObjectRef<'a>>) -> Result<()> {
        ctx.check()?;
        let object = object.into();
        self.providers
            .privileges
            .check_any_privilege(ctx, &self.session.user, object.privilege_target())
    }

    pub fn has_admin_role(&self, ctx: &Context) -> Result<bool> {
        ctx.check()?;
        self.providers.privileges.has_admin_role(ctx, &self.session.user)
    }

    /// Fails with `AdminRoleRequired` unless the user has the admin role.
    pub fn require_admin_role(&self, ctx: &Context, action: &str) -> Result<()> {
        if self.has_admin_role(ctx)? {
            return Ok(());
        }
        Err(CatalogError::AdminRoleRequired {
            user: self.session.user.clone(),
            action: action.to_string(),
        })
    }

    /// The explicit `db.public.name` of a data source. Virtual tables report
    /// the name they were resolved under instead.
    pub fn fully_qualified_name(&self, ctx: &Context, ds: &DataSource) -> Result<DataSourceName> {
        ctx.check()?;
        let desc = match ds {
            DataSource::VirtualTable(vt) => return Ok(vt.data_source_name().clone()),
            DataSource::Table(t) => t.descriptor(),
            DataSource::View(v) => v.descriptor(),
            DataSource::Sequence(s) => s.descriptor(),
        };
        let db = self
            .providers
            .descriptors
            .database_by_id(ctx, self.lookup_flags(), desc.parent_id)?;
        Ok(DataSourceName::new(&db.name, PUBLIC_SCHEMA_NAME, &desc.name))
    }

    /// Fully qualified names of every object in the schema.
    pub fn schema_data_source_names(&self, ctx: &Context, schema: &Schema) -> Result<Vec<DataSourceName>> {
        ctx.check()?;
        self.providers
            .names
            .object_names(ctx, self.lookup_flags(), schema.database(), &schema.name().schema)
    }

    fn data_source_for_desc(
        &mut self,
        ctx: &Context,
        flags: Flags,
        desc: Arc<TableDescriptor>,
        name: &DataSourceName,
    ) -> Result<DataSource> {
        // Materialized views are backed by physical data, so they plan like
        // tables.
        if desc.is_table() || desc.materialized_view() {
            return self.data_source_for_table(ctx, flags, desc, name);
        }
        if let Some(ds) = self.cache.get(&desc) {
            return Ok(ds.clone());
        }
        let ds = if desc.is_view() {
            DataSource::View(Arc::new(View::new(Arc::clone(&desc))))
        } else if desc.is_sequence() {
            DataSource::Sequence(Arc::new(Sequence::new(Arc::clone(&desc))))
        } else {
            return Err(CatalogError::assertion(format!(
                "unexpected table descriptor {} ({:?})",
                desc.id, desc.kind
            )));
        };
        self.cache.put(&desc, ds.clone());
        Ok(ds)
    }

    fn data_source_for_table(
        &mut self,
        ctx: &Context,
        flags: Flags,
        desc: Arc<TableDescriptor>,
        name: &DataSourceName,
    ) -> Result<DataSource> {
        if desc.is_virtual_table() {
            let scope = self.virtual_table_scope(ctx, name)?;
            let vt = VirtualTable::new(desc, scope, name)?;
            return Ok(DataSource::VirtualTable(Arc::new(vt)));
        }

        let stats = if flags.no_table_stats {
            StatisticsSnapshot::empty()
        } else {
            match self.providers.statistics.table_statistics(ctx, desc.id) {
                Ok(stats) => stats,
                Err(err) if err.class() == ErrorClass::Canceled => return Err(err),
                Err(err) => {
                    // Planning must not depend on the statistics table being
                    // reachable.
                    warn!("Planning table '{}' (id={}) without statistics: {}", desc.name, desc.id, err);
                    StatisticsSnapshot::empty()
                }
            }
        };
        let zone = self.zone_config_for(&desc);

        if let Some(DataSource::Table(cached)) = self.cache.get(&desc) {
            if !cached.is_stale(&desc, &stats, &zone) {
                debug!("Catalog cache hit for table '{}' (id={})", desc.name, desc.id);
                return Ok(DataSource::Table(Arc::clone(cached)));
            }
            debug!("Rebuilding stale table '{}' (id={})", desc.name, desc.id);
        } else {
            debug!("Catalog cache miss for table '{}' (id={})", desc.name, desc.id);
        }

        let table = Table::new(Arc::clone(&desc), self.config.codec, stats, zone)?;
        let ds = DataSource::Table(Arc::new(table));
        self.cache.put(&desc, ds.clone());
        Ok(ds)
    }

    /// The database context a virtual table name was resolved under.
    fn virtual_table_scope(&self, ctx: &Context, name: &DataSourceName) -> Result<VirtualTableScope> {
        if name.catalog().is_empty() {
            return Ok(VirtualTableScope::AllDatabases);
        }
        let prefix = self
            .providers
            .names
            .lookup_schema(ctx, self.lookup_flags(), name.catalog(), name.schema())?;
        Ok(match prefix {
            Some(p) => VirtualTableScope::Database(p.database.id),
            None => VirtualTableScope::MissingDatabase,
        })
    }

    /// The table's zone, or an empty one when the table has none or no zone
    /// configuration has been received yet.
    fn zone_config_for(&self, desc: &TableDescriptor) -> Arc<ZoneConfig> {
        self.system_config
            .as_ref()
            .filter(|_| !desc.is_virtual_table())
            .and_then(|config| config.zone_config_for_object(&self.config.codec, desc.id))
            .unwrap_or_else(|| Arc::clone(&self.empty_zone))
    }
}
