//! Column types as seen by the catalog.
//!
//! Only the parts of a type the catalog reasons about are modelled: its
//! family, its OID, and for user-defined types the type descriptor identity,
//! version and enum members. Type versions feed staleness checks and enum
//! members feed synthesized check constraints.

use crate::descriptor::{DescriptorId, DescriptorVersion, Oid};
use crate::expr::Datum;
use serde::{Deserialize, Serialize};

/// Broad type family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeFamily {
    Bool,
    Int,
    Float,
    Decimal,
    String,
    Bytes,
    Date,
    Timestamp,
    Jsonb,
    Geometry,
    Geography,
    Array,
    Oid,
    Enum,
    Tuple,
}

/// Metadata carried by types backed by a user-defined type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDefinedType {
    pub type_id: DescriptorId,
    pub version: DescriptorVersion,
    pub name: String,
    /// Logical representations of the enum members, in declaration order.
    /// Empty for non-enum user-defined types.
    pub enum_members: Vec<String>,
}

/// A column's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    pub family: TypeFamily,
    pub oid: Oid,
    pub user_defined: Option<UserDefinedType>,
}

impl ColumnType {
    pub const fn builtin(family: TypeFamily, oid: Oid) -> Self {
        Self {
            family,
            oid,
            user_defined: None,
        }
    }

    pub const fn int() -> Self {
        Self::builtin(TypeFamily::Int, 20)
    }

    pub const fn string() -> Self {
        Self::builtin(TypeFamily::String, 25)
    }

    pub const fn decimal() -> Self {
        Self::builtin(TypeFamily::Decimal, 1700)
    }

    pub const fn jsonb() -> Self {
        Self::builtin(TypeFamily::Jsonb, 3802)
    }

    /// An enum type backed by the given type descriptor.
    pub fn enumeration(
        type_id: DescriptorId,
        version: DescriptorVersion,
        name: impl Into<String>,
        members: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            family: TypeFamily::Enum,
            oid: user_defined_type_oid(type_id),
            user_defined: Some(UserDefinedType {
                type_id,
                version,
                name: name.into(),
                enum_members: members.into_iter().map(Into::into).collect(),
            }),
        }
    }

    pub fn is_user_defined(&self) -> bool {
        self.user_defined.is_some()
    }

    pub fn user_defined_version(&self) -> Option<DescriptorVersion> {
        self.user_defined.as_ref().map(|u| u.version)
    }

    /// All members of a user-defined enum, as datums. Empty for any other type.
    pub fn enum_datums(&self) -> Vec<Datum> {
        match (&self.family, &self.user_defined) {
            (TypeFamily::Enum, Some(udt)) => {
                udt.enum_members.iter().cloned().map(Datum::Enum).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// OIDs of user-defined types are offset from their descriptor IDs so they
/// never collide with builtin type OIDs.
pub const USER_DEFINED_TYPE_OID_OFFSET: Oid = 100_000;

pub fn user_defined_type_oid(type_id: DescriptorId) -> Oid {
    type_id + USER_DEFINED_TYPE_OID_OFFSET
}
