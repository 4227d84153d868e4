//! # optx-catalog: Optimizer Catalog Adaptation Layer
//!
//! This crate presents raw schema metadata (table, view and sequence
//! descriptors, statistics, zone configs, privileges) to a cost-based
//! optimizer through immutable, cheaply shared catalog objects. A session
//! resolves names and IDs through [`OptCatalog`]; the objects it returns never
//! change once built, so the optimizer can hold them across planning attempts
//! and compare them for staleness later.
//!
//! ## Module Overview
//!
//! - **`facade`**: [`OptCatalog`], the session-scoped resolution entry point.
//! - **`catalog`**: Collaborator traits (names, descriptors, statistics,
//!   privileges, types) and the [`InMemoryCatalog`] backend.
//! - **`cache`**: Session cache keyed by descriptor instance.
//! - **`table`**: Builds optimizer [`Table`]s from descriptors: columns, key
//!   derivation, families, checks, foreign keys, statistics.
//! - **`virtual_table`**: System-catalog tables and their synthetic key column.
//! - **`object`**: Views, sequences and the [`DataSource`] sum type.
//! - **`schema`**: Schema and data-source names and resolved schemas.
//! - **`index`**, **`family`**, **`fk`**, **`check`**, **`column`**,
//!   **`table_stat`**: The per-table primitives exposed to the optimizer.
//! - **`descriptor`**, **`types`**, **`stats`**, **`zone`**, **`codec`**,
//!   **`expr`**: Raw metadata as stored by the schema and statistics layers.
//! - **`config`**, **`context`**, **`error`**: Configuration, request
//!   cancellation and the error taxonomy.

pub mod cache;
pub mod catalog;
pub mod check;
pub mod codec;
pub mod column;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod facade;
pub mod family;
pub mod fk;
pub mod index;
pub mod object;
pub mod schema;
mod staleness;
pub mod stats;
pub mod table;
pub mod table_stat;
pub mod types;
pub mod virtual_table;
pub mod zone;

pub use catalog::{InMemoryCatalog, Privilege, Providers};
pub use config::{CatalogConfig, Flags, SessionData};
pub use context::Context;
pub use error::{CatalogError, ErrorClass, Result};
pub use facade::OptCatalog;
pub use object::{DataSource, ObjectRef, StableId};
pub use schema::{DataSourceName, Schema, SchemaName};
pub use table::Table;
pub use virtual_table::VirtualTable;
