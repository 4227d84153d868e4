//! # Catalog Errors
//!
//! Every fallible catalog operation returns [`CatalogError`]. Variants carry a
//! Postgres-compatible SQLSTATE (see [`CatalogError::code`]) so that the
//! optimizer can surface them to clients unchanged, and an [`ErrorClass`] that
//! tells callers how the failure is meant to be handled:
//!
//! - **NotFound**: missing database, schema, relation, column or type. Surfaced
//!   verbatim and never retried here.
//! - **PermissionDenied**: produced by the privilege checker, surfaced verbatim.
//! - **TransientLookup**: statistics lookups. The facade swallows these and
//!   plans without statistics.
//! - **Internal**: a caller broke a contract (unrecognized descriptor shape,
//!   unsupported virtual index). Never recovered.
//! - **Canceled**: the request context was canceled or its deadline passed.

use crate::descriptor::{ColumnId, DescriptorId, Oid};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Coarse handling class of a [`CatalogError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    PermissionDenied,
    TransientLookup,
    Internal,
    Canceled,
}

/// Errors produced by catalog resolution and object construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// A schema name had no explicit database and none could be inferred from
    /// the session.
    #[error("no database specified")]
    NoDatabaseSpecified,

    /// The database or schema named by an explicit prefix does not exist.
    #[error("target database or schema does not exist")]
    InvalidSchema,

    /// The relation does not exist. `being_added` is set when the descriptor
    /// exists but is still being created.
    #[error("relation \"{name}\" does not exist")]
    UndefinedRelation { name: String, being_added: bool },

    #[error("database [{0}] does not exist")]
    UndefinedDatabase(DescriptorId),

    #[error("column [{0}] does not exist")]
    UndefinedColumn(ColumnId),

    #[error("type with OID {0} does not exist")]
    UndefinedType(Oid),

    /// Raised by descriptor providers when no descriptor has the given ID.
    #[error("descriptor {0} not found")]
    DescriptorNotFound(DescriptorId),

    /// Raised by descriptor providers when the table is still being added.
    #[error("table {0} is being added")]
    TableBeingAdded(DescriptorId),

    #[error("user {user} does not have {privilege} privilege on {object}")]
    PermissionDenied {
        user: String,
        privilege: String,
        object: String,
    },

    #[error("user {user} must have admin role to {action}")]
    AdminRoleRequired { user: String, action: String },

    /// The statistics provider could not produce a snapshot.
    #[error("statistics unavailable for table {table}: {reason}")]
    StatisticsUnavailable { table: DescriptorId, reason: String },

    #[error("query execution canceled")]
    Canceled,

    /// Programming error: the caller violated a contract.
    #[error("internal error: {0}")]
    AssertionFailed(String),
}

impl CatalogError {
    /// Postgres SQLSTATE for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::NoDatabaseSpecified => "42602",
            CatalogError::InvalidSchema => "3F000",
            CatalogError::UndefinedRelation { .. } => "42P01",
            CatalogError::UndefinedDatabase(_) => "3D000",
            CatalogError::UndefinedColumn(_) => "42703",
            CatalogError::UndefinedType(_) => "42704",
            CatalogError::DescriptorNotFound(_) => "42P01",
            CatalogError::TableBeingAdded(_) => "42P01",
            CatalogError::PermissionDenied { .. } => "42501",
            CatalogError::AdminRoleRequired { .. } => "42501",
            CatalogError::StatisticsUnavailable { .. } => "58030",
            CatalogError::Canceled => "57014",
            CatalogError::AssertionFailed(_) => "XX000",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            CatalogError::NoDatabaseSpecified
            | CatalogError::InvalidSchema
            | CatalogError::UndefinedRelation { .. }
            | CatalogError::UndefinedDatabase(_)
            | CatalogError::UndefinedColumn(_)
            | CatalogError::UndefinedType(_)
            | CatalogError::DescriptorNotFound(_)
            | CatalogError::TableBeingAdded(_) => ErrorClass::NotFound,
            CatalogError::PermissionDenied { .. } | CatalogError::AdminRoleRequired { .. } => {
                ErrorClass::PermissionDenied
            }
            CatalogError::StatisticsUnavailable { .. } => ErrorClass::TransientLookup,
            CatalogError::AssertionFailed(_) => ErrorClass::Internal,
            CatalogError::Canceled => ErrorClass::Canceled,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    /// True for an `UndefinedRelation` whose descriptor exists but is still
    /// being added. Planners may treat such a relation as invalid without
    /// reporting an error to the user.
    pub fn is_being_added(&self) -> bool {
        matches!(
            self,
            CatalogError::UndefinedRelation { being_added: true, .. }
                | CatalogError::TableBeingAdded(_)
        )
    }

    pub(crate) fn assertion(msg: impl Into<String>) -> Self {
        CatalogError::AssertionFailed(msg.into())
    }
}
