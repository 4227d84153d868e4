//! End-to-end resolution tests against the in-memory catalog.
//!
//! Each test builds a small cluster (two databases, a handful of tables, a
//! view, a sequence, a user-defined schema and a virtual schema) and drives it
//! through [`OptCatalog`] the way a planner would.
//!
//! ## What These Tests Verify
//! - Resolution returns the same object for an unchanged descriptor, and a
//!   fresh one once the descriptor, statistics or zone change
//! - The session cache is discarded at reset once it exceeds its bound
//! - Key columns, foreign keys and synthesized enum checks are derived from
//!   the descriptor
//! - Virtual table IDs depend on the database they are resolved under
//! - Errors carry the right kind for missing, in-progress and forbidden
//!   objects

use chrono::{TimeZone, Utc};
use optx_catalog::catalog::InMemoryCatalog;
use optx_catalog::descriptor::{
    ColumnDescriptor, ConstraintValidity, DescriptorId, DescriptorState, ForeignKeyReference,
    IndexDescriptor, MatchMethod, ReferenceAction, RelationKind, SchemaDescriptor, TableDescriptor,
    PUBLIC_SCHEMA_ID,
};
use optx_catalog::stats::TableStatistic;
use optx_catalog::types::{user_defined_type_oid, ColumnType};
use optx_catalog::zone::{SystemConfig, ZoneConfig};
use optx_catalog::{
    CatalogConfig, CatalogError, Context, DataSource, DataSourceName, Flags, OptCatalog, Privilege,
    Providers, SchemaName, SessionData, StableId, Table,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DB: DescriptorId = 50;
const DB2: DescriptorId = 51;
const T: DescriptorId = 52;
const ADDING: DescriptorId = 53;
const PEOPLE: DescriptorId = 54;
const CHILD: DescriptorId = 55;
const PRIVATE_SCHEMA: DescriptorId = 70;
const PG_CATALOG: DescriptorId = 1;
const PG_CLASS: DescriptorId = u32::MAX - 100;
const MOOD_TYPE: DescriptorId = 60;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("optx=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn col(id: u32, name: &str, nullable: bool) -> ColumnDescriptor {
    ColumnDescriptor::new(id, name, ColumnType::int(), nullable)
}

fn primary(cols: Vec<u32>) -> IndexDescriptor {
    IndexDescriptor {
        id: 1,
        name: "primary".into(),
        unique: true,
        column_ids: cols,
        ..Default::default()
    }
}

fn table(id: DescriptorId, name: &str, columns: Vec<ColumnDescriptor>) -> TableDescriptor {
    TableDescriptor {
        id,
        version: 1,
        name: name.into(),
        parent_id: DB,
        parent_schema_id: PUBLIC_SCHEMA_ID,
        columns,
        primary_index: primary(vec![1]),
        ..Default::default()
    }
}

fn fk_child_to_t() -> ForeignKeyReference {
    ForeignKeyReference {
        name: "child_t_fk".into(),
        origin_table_id: CHILD,
        origin_column_ids: vec![2],
        referenced_table_id: T,
        referenced_column_ids: vec![1],
        validity: ConstraintValidity::Validated,
        match_method: MatchMethod::Simple,
        on_delete: ReferenceAction::Cascade,
        on_update: ReferenceAction::NoAction,
    }
}

/// `t (a INT NOT NULL PRIMARY KEY, b INT, c INT NOT NULL)` with a unique
/// index on the nullable `b` and a plain index on `c`.
fn t_desc() -> TableDescriptor {
    TableDescriptor {
        indexes: vec![
            IndexDescriptor {
                id: 2,
                name: "t_b_idx".into(),
                unique: true,
                column_ids: vec![2],
                extra_column_ids: vec![1],
                ..Default::default()
            },
            IndexDescriptor {
                id: 3,
                name: "t_c_idx".into(),
                column_ids: vec![3],
                extra_column_ids: vec![1],
                ..Default::default()
            },
        ],
        inbound_fks: vec![fk_child_to_t()],
        ..table(T, "t", vec![col(1, "a", false), col(2, "b", true), col(3, "c", false)])
    }
}

fn stat(table_id: DescriptorId, cols: Vec<u32>, day: u32) -> TableStatistic {
    TableStatistic {
        statistic_id: day as u64,
        table_id,
        name: None,
        column_ids: cols,
        created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        row_count: 1000,
        distinct_count: 1000,
        null_count: 0,
        histogram: None,
    }
}

fn mood() -> ColumnType {
    ColumnType::enumeration(MOOD_TYPE, 1, "mood", ["happy", "sad"])
}

fn build_catalog() -> Arc<InMemoryCatalog> {
    let cat = Arc::new(InMemoryCatalog::new());
    cat.add_database(DB, "db");
    cat.add_database(DB2, "db2");
    cat.put_table(t_desc());
    cat.put_table(TableDescriptor {
        state: DescriptorState::Add,
        ..table(ADDING, "adding", vec![col(1, "k", false)])
    });
    cat.put_table(table(
        PEOPLE,
        "people",
        vec![col(1, "id", false), ColumnDescriptor::new(2, "mood", mood(), true)],
    ));
    cat.put_table(TableDescriptor {
        outbound_fks: vec![fk_child_to_t()],
        ..table(CHILD, "child", vec![col(1, "id", false), col(2, "t_a", true)])
    });
    cat.put_table(TableDescriptor {
        kind: RelationKind::View,
        view_query: "SELECT a FROM t".into(),
        ..table(56, "v", vec![])
    });
    cat.put_table(TableDescriptor {
        kind: RelationKind::Sequence,
        ..table(57, "seq", vec![])
    });
    cat.put_table(TableDescriptor {
        kind: RelationKind::MaterializedView,
        view_query: "SELECT a, c FROM t".into(),
        ..table(58, "mv", vec![col(1, "a", false), col(2, "c", false)])
    });
    cat.add_schema(SchemaDescriptor {
        id: PRIVATE_SCHEMA,
        version: 1,
        name: "private".into(),
        parent_id: DB,
    });
    cat.put_table(TableDescriptor {
        parent_schema_id: PRIVATE_SCHEMA,
        ..table(71, "secret", vec![col(1, "k", false)])
    });
    cat.add_virtual_schema(PG_CATALOG, "pg_catalog");
    cat.put_table(TableDescriptor {
        id: PG_CLASS,
        version: 1,
        name: "pg_class".into(),
        parent_id: 0,
        parent_schema_id: PG_CATALOG,
        is_virtual: true,
        columns: vec![
            col(1, "oid", false),
            ColumnDescriptor::new(2, "relname", ColumnType::string(), false),
        ],
        indexes: vec![IndexDescriptor {
            id: 2,
            name: "pg_class_oid_idx".into(),
            column_ids: vec![1],
            ..Default::default()
        }],
        ..Default::default()
    });
    cat.add_type(user_defined_type_oid(MOOD_TYPE), mood());
    cat
}

fn session(cat: &Arc<InMemoryCatalog>, user: &str, database: &str) -> OptCatalog {
    init_tracing();
    OptCatalog::new(
        Providers::in_memory(Arc::clone(cat)),
        CatalogConfig::default(),
        SessionData::new(user, database),
    )
}

fn resolve(oc: &mut OptCatalog, name: &str) -> DataSource {
    oc.resolve_data_source(&Context::background(), Flags::default(), &DataSourceName::unqualified(name))
        .unwrap()
        .0
}

fn resolve_table(oc: &mut OptCatalog, name: &str) -> Arc<Table> {
    Arc::clone(resolve(oc, name).as_table().unwrap())
}

fn pg_class_in(catalog: &str) -> DataSourceName {
    DataSourceName::new(catalog, "pg_catalog", "pg_class")
}

// ---------------------------------------------------------------------------
// Identity and staleness
// ---------------------------------------------------------------------------

#[test]
fn test_unchanged_descriptor_resolves_to_same_table() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let first = resolve_table(&mut oc, "t");
    let second = resolve_table(&mut oc, "t");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.equals(&second));
}

#[test]
fn test_new_descriptor_version_rebuilds() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let old = resolve_table(&mut oc, "t");
    cat.put_table(TableDescriptor {
        version: 2,
        ..t_desc()
    });
    let new = resolve_table(&mut oc, "t");
    assert!(!Arc::ptr_eq(&old, &new));
    assert!(!old.equals(&new));
}

#[test]
fn test_refreshed_statistics_rebuild() {
    let cat = build_catalog();
    cat.set_statistics(T, vec![stat(T, vec![1], 1)]);
    let mut oc = session(&cat, "root", "db");
    let old = resolve_table(&mut oc, "t");
    assert_eq!(old.statistic_count(), 1);
    assert!(Arc::ptr_eq(&old, &resolve_table(&mut oc, "t")));

    cat.set_statistics(T, vec![stat(T, vec![1], 2)]);
    let new = resolve_table(&mut oc, "t");
    assert!(!Arc::ptr_eq(&old, &new));
    assert!(!old.equals(&new));
    assert_eq!(new.statistic(0).created_at(), Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap());
}

#[test]
fn test_statistics_on_dropped_column_are_skipped() {
    let cat = build_catalog();
    cat.set_statistics(T, vec![stat(T, vec![9], 1), stat(T, vec![2, 3], 2)]);
    let mut oc = session(&cat, "root", "db");
    let t = resolve_table(&mut oc, "t");
    assert_eq!(t.statistic_count(), 1);
    assert_eq!(t.statistic(0).column_count(), 2);
    assert_eq!(t.statistic(0).column_ordinal(0), 1);
    assert_eq!(t.statistic(0).column_ordinal(1), 2);
}

#[test]
fn test_zone_change_seen_after_reset() {
    let cat = build_catalog();
    let three = ZoneConfig {
        num_replicas: Some(3),
        ..Default::default()
    };
    cat.publish_system_config(SystemConfig::new(1).with_zone(T, three.clone()));
    let mut oc = session(&cat, "root", "db");
    let old = resolve_table(&mut oc, "t");
    assert_eq!(*old.zone(), three);
    assert_eq!(*old.index(1).zone(), three);

    let five = ZoneConfig {
        num_replicas: Some(5),
        ..Default::default()
    };
    cat.publish_system_config(SystemConfig::new(2).with_zone(T, five.clone()));
    assert!(Arc::ptr_eq(&old, &resolve_table(&mut oc, "t")));

    oc.reset();
    let new = resolve_table(&mut oc, "t");
    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(*new.zone(), five);
    assert!(!old.equals(&new));
}

#[test]
fn test_cache_discarded_past_threshold() {
    let cat = build_catalog();
    for i in 0..101u32 {
        cat.put_table(TableDescriptor {
            kind: RelationKind::View,
            view_query: "SELECT 1".into(),
            ..table(1000 + i, &format!("view_{}", i), vec![])
        });
    }
    let mut oc = session(&cat, "root", "db");
    for i in 0..101 {
        resolve(&mut oc, &format!("view_{}", i));
    }
    assert!(oc.cached_data_source_count() > 100);

    oc.reset();
    assert_eq!(oc.cached_data_source_count(), 0);

    resolve(&mut oc, "t");
    assert_eq!(oc.cached_data_source_count(), 1);
    // Under the bound, a reset keeps everything.
    oc.reset();
    assert_eq!(oc.cached_data_source_count(), 1);
}

// ---------------------------------------------------------------------------
// Table shape
// ---------------------------------------------------------------------------

#[test]
fn test_key_columns() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let t = resolve_table(&mut oc, "t");
    assert_eq!(t.column_count(), 4);
    assert_eq!(t.index_count(), 3);

    let pk = t.index(0);
    assert_eq!((pk.key_column_count(), pk.lax_key_column_count()), (1, 1));

    // Unique over a nullable column: NULLs may repeat, so the strict key
    // needs the primary key too.
    let b = t.index(1);
    assert_eq!(b.name(), "t_b_idx");
    assert_eq!((b.key_column_count(), b.lax_key_column_count()), (2, 1));
    assert_eq!(b.column(0).column.col_name(), "b");
    assert_eq!(b.column(1).column.col_name(), "a");

    let c = t.index(2);
    assert_eq!((c.key_column_count(), c.lax_key_column_count()), (2, 2));
}

#[test]
fn test_enum_column_gets_check() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let people = resolve_table(&mut oc, "people");
    assert_eq!(people.check_count(), 1);
    let check = people.check(0);
    assert_eq!(check.constraint, "mood IN ('happy', 'sad')");
    assert!(check.validated);
    assert!(check.is_synthesized());
}

#[test]
fn test_foreign_key_ordinals() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let t = resolve_table(&mut oc, "t");
    let child = resolve_table(&mut oc, "child");

    assert_eq!(child.outbound_foreign_key_count(), 1);
    let fk = child.outbound_foreign_key(0);
    assert_eq!(fk.origin_table_id(), child.id());
    assert_eq!(fk.referenced_table_id(), t.id());
    assert_eq!(fk.origin_column_ordinal(&child, 0), 1);
    assert_eq!(fk.referenced_column_ordinal(&t, 0), 0);
    assert_eq!(fk.delete_reference_action(), ReferenceAction::Cascade);

    assert_eq!(t.inbound_foreign_key_count(), 1);
    assert_eq!(t.inbound_foreign_key(0).origin_table_id(), child.id());
}

#[test]
#[should_panic(expected = "assertion failed")]
fn test_foreign_key_wrong_table_panics() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let t = resolve_table(&mut oc, "t");
    let child = resolve_table(&mut oc, "child");
    child.outbound_foreign_key(0).origin_column_ordinal(&t, 0);
}

#[test]
fn test_view_sequence_and_materialized_view() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let v = resolve(&mut oc, "v");
    assert_eq!(v.as_view().unwrap().query(), "SELECT a FROM t");
    let seq = resolve(&mut oc, "seq");
    assert!(seq.as_sequence().is_some());
    assert!(Arc::ptr_eq(seq.as_sequence().unwrap(), resolve(&mut oc, "seq").as_sequence().unwrap()));
    let mv = resolve_table(&mut oc, "mv");
    assert!(mv.is_materialized_view());
}

// ---------------------------------------------------------------------------
// Virtual tables
// ---------------------------------------------------------------------------

#[test]
fn test_virtual_table_id_depends_on_database() {
    let cat = build_catalog();
    let ctx = Context::background();
    let mut oc = session(&cat, "root", "db");
    let id_in = |oc: &mut OptCatalog, name: &DataSourceName| {
        let (ds, _) = oc.resolve_data_source(&ctx, Flags::default(), name).unwrap();
        ds.as_virtual_table().unwrap().id()
    };

    let in_db = id_in(&mut oc, &pg_class_in("db"));
    let in_db2 = id_in(&mut oc, &pg_class_in("db2"));
    let missing = id_in(&mut oc, &pg_class_in("nope"));
    assert_eq!(in_db, StableId(PG_CLASS as u64 | (DB as u64) << 32));
    assert_eq!(in_db2, StableId(PG_CLASS as u64 | (DB2 as u64) << 32));
    assert_eq!(missing, StableId(PG_CLASS as u64 | (u32::MAX as u64) << 32));

    let mut no_db = session(&cat, "root", "");
    let name = DataSourceName {
        prefix: SchemaName {
            schema: "pg_catalog".into(),
            explicit_schema: true,
            ..Default::default()
        },
        object: "pg_class".into(),
    };
    assert_eq!(id_in(&mut no_db, &name), StableId(PG_CLASS as u64));

    // Never cached; each resolution builds a new object.
    assert_eq!(oc.cached_data_source_count(), 0);
}

#[test]
fn test_virtual_table_shape() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let ctx = Context::background();
    let (ds, _) = oc.resolve_data_source(&ctx, Flags::default(), &pg_class_in("db")).unwrap();
    let vt = ds.as_virtual_table().unwrap();
    assert_eq!(vt.column_count(), 3);
    assert_eq!(vt.column(0).col_name(), "internal_vtable_pk");
    assert!(vt.column(0).is_hidden());
    assert_eq!(vt.index_count(), 2);
    let idx = vt.index(1);
    assert_eq!(idx.column_count(), 2);
    assert_eq!(idx.column_ordinal(0), 1);
    assert_eq!(idx.column_ordinal(1), 0);

    let fqn = oc.fully_qualified_name(&ctx, &ds).unwrap();
    assert_eq!(fqn.to_string(), "db.pg_catalog.pg_class");
}

// ---------------------------------------------------------------------------
// Resolution by ID and by schema
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_by_id_round_trip() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let by_name = resolve(&mut oc, "t");
    let by_id = oc
        .resolve_data_source_by_id(&Context::background(), Flags::default(), by_name.id())
        .unwrap();
    assert!(by_name.equals(&by_id));
    assert!(Arc::ptr_eq(by_name.as_table().unwrap(), by_id.as_table().unwrap()));
}

#[test]
fn test_resolve_by_id_errors() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let ctx = Context::background();

    let err = oc
        .resolve_data_source_by_id(&ctx, Flags::default(), StableId(99))
        .unwrap_err();
    assert_eq!(
        err,
        CatalogError::UndefinedRelation {
            name: "[99]".into(),
            being_added: false
        }
    );

    let err = oc
        .resolve_data_source_by_id(&ctx, Flags::default(), StableId(ADDING as u64))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.is_being_added());

    let err = oc
        .resolve_data_source_by_id(&ctx, Flags::default(), StableId(u64::MAX))
        .unwrap_err();
    assert!(!err.is_being_added());
    assert_eq!(err.code(), "42P01");
}

#[test]
fn test_resolve_schema_errors() {
    let cat = build_catalog();
    let ctx = Context::background();
    let mut no_db = session(&cat, "root", "");
    assert_eq!(
        no_db
            .resolve_schema(&ctx, Flags::default(), &SchemaName::default())
            .unwrap_err(),
        CatalogError::NoDatabaseSpecified
    );

    let mut oc = session(&cat, "root", "db");
    assert_eq!(
        oc.resolve_schema(&ctx, Flags::default(), &SchemaName::new("db", "nope"))
            .unwrap_err(),
        CatalogError::InvalidSchema
    );
}

#[test]
fn test_schema_object_names() {
    let cat = build_catalog();
    let ctx = Context::background();
    let mut oc = session(&cat, "root", "db");
    let (schema, resolved) = oc
        .resolve_schema(&ctx, Flags::default(), &SchemaName::unqualified("public"))
        .unwrap();
    assert_eq!(resolved.catalog, "db");
    let names: Vec<String> = oc
        .schema_data_source_names(&ctx, &schema)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        names,
        vec!["db.public.child", "db.public.mv", "db.public.people", "db.public.seq", "db.public.t", "db.public.v"]
    );
}

#[test]
fn test_fully_qualified_name() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let t = resolve(&mut oc, "t");
    let fqn = oc.fully_qualified_name(&Context::background(), &t).unwrap();
    assert_eq!(fqn, DataSourceName::new("db", "public", "t"));
}

#[test]
fn test_resolve_type_by_oid() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let ctx = Context::background();
    let typ = oc
        .resolve_type_by_oid(&ctx, Flags::default(), user_defined_type_oid(MOOD_TYPE))
        .unwrap();
    assert_eq!(typ, mood());
    assert_eq!(
        oc.resolve_type_by_oid(&ctx, Flags::default(), 1).unwrap_err(),
        CatalogError::UndefinedType(1)
    );
}

// ---------------------------------------------------------------------------
// Privileges
// ---------------------------------------------------------------------------

#[test]
fn test_user_defined_schema_requires_usage() {
    let cat = build_catalog();
    let ctx = Context::background();
    let name = DataSourceName::new("db", "private", "secret");
    let mut bob = session(&cat, "bob", "db");
    let err = bob.resolve_data_source(&ctx, Flags::default(), &name).unwrap_err();
    assert!(matches!(err, CatalogError::PermissionDenied { .. }));

    cat.grant("bob", PRIVATE_SCHEMA, Privilege::Usage);
    assert!(bob.resolve_data_source(&ctx, Flags::default(), &name).is_ok());
}

#[test]
fn test_check_privilege_on_objects() {
    let cat = build_catalog();
    let ctx = Context::background();
    let mut bob = session(&cat, "bob", "db");
    let t = resolve(&mut bob, "t");
    assert!(bob.check_privilege(&ctx, &t, Privilege::Select).is_err());
    assert!(bob.check_any_privilege(&ctx, &t).is_err());
    cat.grant("bob", T, Privilege::Select);
    assert!(bob.check_privilege(&ctx, &t, Privilege::Select).is_ok());
    assert!(bob.check_any_privilege(&ctx, &t).is_ok());

    let (schema, _) = bob
        .resolve_schema(&ctx, Flags::default(), &SchemaName::unqualified("public"))
        .unwrap();
    // The public schema defers to its database.
    assert!(bob.check_privilege(&ctx, &schema, Privilege::Create).is_err());
    cat.grant("bob", DB, Privilege::Create);
    assert!(bob.check_privilege(&ctx, &schema, Privilege::Create).is_ok());
}

#[test]
fn test_admin_role() {
    let cat = build_catalog();
    let ctx = Context::background();
    let bob = session(&cat, "bob", "db");
    assert!(!bob.has_admin_role(&ctx).unwrap());
    assert!(matches!(
        bob.require_admin_role(&ctx, "inspect zone configs"),
        Err(CatalogError::AdminRoleRequired { .. })
    ));
    cat.add_admin("bob");
    assert!(bob.require_admin_role(&ctx, "inspect zone configs").is_ok());
    assert!(session(&cat, "root", "db").has_admin_role(&ctx).unwrap());
}

// ---------------------------------------------------------------------------
// Flags, failures and cancellation
// ---------------------------------------------------------------------------

#[test]
fn test_avoid_cache_flag_is_scoped_to_call() {
    let cat = build_catalog();
    let ctx = Context::background();
    let mut oc = session(&cat, "root", "db");
    let flags = Flags {
        avoid_descriptor_caches: true,
        ..Default::default()
    };
    oc.resolve_data_source(&ctx, flags, &DataSourceName::unqualified("t")).unwrap();
    assert!(cat.last_lookup_flags().unwrap().avoid_cached);

    resolve(&mut oc, "t");
    assert!(!cat.last_lookup_flags().unwrap().avoid_cached);
}

#[test]
fn test_statistics_failure_degrades_to_empty() {
    let cat = build_catalog();
    cat.fail_statistics(T);
    let mut oc = session(&cat, "root", "db");
    let t = resolve_table(&mut oc, "t");
    assert_eq!(t.statistic_count(), 0);
}

#[test]
fn test_no_table_stats_flag() {
    let cat = build_catalog();
    cat.set_statistics(T, vec![stat(T, vec![1], 1)]);
    let mut oc = session(&cat, "root", "db");
    let flags = Flags {
        no_table_stats: true,
        ..Default::default()
    };
    let (ds, _) = oc
        .resolve_data_source(&Context::background(), flags, &DataSourceName::unqualified("t"))
        .unwrap();
    assert_eq!(ds.as_table().unwrap().statistic_count(), 0);
}

#[test]
fn test_canceled_context() {
    let cat = build_catalog();
    let mut oc = session(&cat, "root", "db");
    let ctx = Context::background();
    ctx.cancel();
    let err = oc
        .resolve_data_source(&ctx, Flags::default(), &DataSourceName::unqualified("t"))
        .unwrap_err();
    assert_eq!(err, CatalogError::Canceled);
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[test]
fn test_descriptor_from_json_fixture() {
    let json = r#"{
        "id": 80,
        "version": 3,
        "name": "orders",
        "parent_id": 50,
        "parent_schema_id": 29,
        "columns": [
            {"id": 1, "name": "o_id", "column_type": {"family": "Int", "oid": 20, "user_defined": null}, "nullable": false},
            {"id": 2, "name": "o_note", "column_type": {"family": "String", "oid": 25, "user_defined": null}, "nullable": true}
        ],
        "primary_index": {"id": 1, "name": "primary", "unique": true, "column_ids": [1]}
    }"#;
    let desc: TableDescriptor = serde_json::from_str(json).unwrap();
    let cat = build_catalog();
    cat.put_table(desc);

    let mut oc = session(&cat, "root", "db");
    let orders = resolve_table(&mut oc, "orders");
    assert_eq!(orders.id(), StableId(80));
    // Two declared columns plus the MVCC timestamp column.
    assert_eq!(orders.column_count(), 3);
    assert_eq!(orders.index(0).stored_column_ids().len(), 2);
    assert_eq!(orders.family_count(), 1);
}
