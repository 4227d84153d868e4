//! # Schemas and Object Names
//!
//! Names are resolved in two parts: a *prefix* (database and schema, see
//! [`SchemaName`]) and an object name. Each part of the prefix records whether
//! the user spelled it out; resolution fills in the rest from the session and
//! reports which parts were explicit so error messages and fully qualified
//! names can be rendered the way the user expects.
//!
//! A resolved [`Schema`] pairs the database descriptor with the resolved
//! schema. Only user-defined and temporary schemas have IDs of their own;
//! virtual schemas and `public` borrow the database's identity.

use crate::descriptor::{DatabaseDescriptor, DescriptorId, SchemaDescriptor, PUBLIC_SCHEMA_ID};
use crate::object::{PrivilegeTarget, StableId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const PUBLIC_SCHEMA_NAME: &str = "public";

/// A possibly partially qualified `catalog.schema` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaName {
    pub catalog: String,
    pub schema: String,
    pub explicit_catalog: bool,
    pub explicit_schema: bool,
}

impl SchemaName {
    /// A prefix with both parts given explicitly.
    pub fn new(catalog: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            explicit_catalog: true,
            explicit_schema: true,
        }
    }

    /// A prefix naming only the schema; the database comes from the session.
    pub fn unqualified(schema: impl Into<String>) -> Self {
        Self {
            catalog: String::new(),
            schema: schema.into(),
            explicit_catalog: false,
            explicit_schema: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.explicit_catalog && !self.explicit_schema
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.explicit_catalog, self.explicit_schema) {
            (true, true) => write!(f, "{}.{}", self.catalog, self.schema),
            (true, false) => write!(f, "{}", self.catalog),
            (false, true) => write!(f, "{}", self.schema),
            (false, false) => Ok(()),
        }
    }
}

/// Name of a table-like object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSourceName {
    pub prefix: SchemaName,
    pub object: String,
}

impl DataSourceName {
    /// A fully qualified name, rendered with all three parts.
    pub fn new(catalog: impl Into<String>, schema: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            prefix: SchemaName::new(catalog, schema),
            object: object.into(),
        }
    }

    /// A bare object name, resolved against the session's search path.
    pub fn unqualified(object: impl Into<String>) -> Self {
        Self {
            prefix: SchemaName::default(),
            object: object.into(),
        }
    }

    pub fn catalog(&self) -> &str {
        &self.prefix.catalog
    }

    pub fn schema(&self) -> &str {
        &self.prefix.schema
    }
}

impl fmt::Display for DataSourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.object)
        } else {
            write!(f, "{}.{}", self.prefix, self.object)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKind {
    UserDefined,
    Temporary,
    /// A system schema whose tables are virtual.
    Virtual,
    Public,
}

/// A schema as produced by name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub kind: SchemaKind,
    pub id: DescriptorId,
    pub name: String,
    /// Present for user-defined schemas.
    pub desc: Option<Arc<SchemaDescriptor>>,
}

impl ResolvedSchema {
    pub fn public() -> Self {
        Self {
            kind: SchemaKind::Public,
            id: PUBLIC_SCHEMA_ID,
            name: PUBLIC_SCHEMA_NAME.to_string(),
            desc: None,
        }
    }

    pub fn user_defined(desc: Arc<SchemaDescriptor>) -> Self {
        Self {
            kind: SchemaKind::UserDefined,
            id: desc.id,
            name: desc.name.clone(),
            desc: Some(desc),
        }
    }
}

/// A resolved database plus schema.
#[derive(Debug, Clone)]
pub struct Schema {
    database: Arc<DatabaseDescriptor>,
    schema: ResolvedSchema,
    name: SchemaName,
}

impl Schema {
    pub fn new(database: Arc<DatabaseDescriptor>, schema: ResolvedSchema, name: SchemaName) -> Self {
        Self {
            database,
            schema,
            name,
        }
    }

    pub fn id(&self) -> StableId {
        match self.schema.kind {
            SchemaKind::UserDefined | SchemaKind::Temporary => StableId::from(self.schema.id),
            SchemaKind::Virtual | SchemaKind::Public => StableId::from(self.database.id),
        }
    }

    pub fn postgres_descriptor_id(&self) -> StableId {
        self.id()
    }

    pub fn equals(&self, other: &Schema) -> bool {
        self.id() == other.id()
    }

    pub fn name(&self) -> &SchemaName {
        &self.name
    }

    pub fn kind(&self) -> SchemaKind {
        self.schema.kind
    }

    pub fn database(&self) -> &Arc<DatabaseDescriptor> {
        &self.database
    }

    pub fn resolved(&self) -> &ResolvedSchema {
        &self.schema
    }

    /// The descriptor privileges on this schema are recorded on: the schema
    /// descriptor for user-defined schemas, the database otherwise.
    pub fn descriptor_for_permissions_check(&self) -> PrivilegeTarget<'_> {
        match (&self.schema.kind, &self.schema.desc) {
            (SchemaKind::UserDefined, Some(desc)) => PrivilegeTarget::Schema(desc.as_ref()),
            _ => PrivilegeTarget::Database(self.database.as_ref()),
        }
    }
}
