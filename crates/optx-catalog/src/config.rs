//! # Catalog Configuration
//!
//! Settings come in three scopes:
//!
//! - **Process**: [`CatalogConfig`], shared by every session built from the
//!   same configuration (key codec, cache bound).
//! - **Session**: [`SessionData`], the user and name-resolution context of one
//!   planning session.
//! - **Call**: [`Flags`], passed with each resolution request and never
//!   retained after it returns.

use crate::codec::SqlCodec;
use serde::{Deserialize, Serialize};

/// Default cache bound; see [`CatalogConfig::cache_reset_threshold`].
pub const DEFAULT_CACHE_RESET_THRESHOLD: usize = 100;

/// Process-level catalog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// A session cache holding more entries than this at reset time is
    /// discarded wholesale. A heuristic bound on schema-churn-heavy sessions,
    /// not a correctness requirement.
    pub cache_reset_threshold: usize,
    /// Codec of the tenant this process serves; selects key prefixes and the
    /// zone lookup key.
    pub codec: SqlCodec,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_reset_threshold: DEFAULT_CACHE_RESET_THRESHOLD,
            codec: SqlCodec::system(),
        }
    }
}

/// Per-call resolution flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    /// Bypass upstream descriptor caches for the duration of the call.
    pub avoid_descriptor_caches: bool,
    /// Build tables without statistics.
    pub no_table_stats: bool,
}

/// Name-resolution and identity context of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: String,
    /// Current database; empty when the session has none.
    pub database: String,
    /// Schemas searched, in order, for unqualified names.
    pub search_path: Vec<String>,
}

impl SessionData {
    pub fn new(user: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            database: database.into(),
            search_path: vec!["public".to_string()],
        }
    }
}
