//! # Datums and Constraint Expressions
//!
//! The catalog never evaluates expressions, but it does two things with values:
//!
//! - It exposes already-decoded partition tuples and histogram bounds as
//!   [`Datum`]s.
//! - It synthesizes check constraints for enum-typed columns and hands them to
//!   the optimizer in serialized SQL form, the same form declared checks are
//!   stored in. [`Expr`] is the small expression tree used to build and
//!   serialize those constraints.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A constant SQL value.
///
/// Uses `OrderedFloat` for `f64` so datums can be compared and hashed, which
/// histogram and partition-prefix consumers rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Datum {
    /// SQL NULL value.
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(String),
    Bytes(Vec<u8>),
    /// Date as days since Unix epoch (1970-01-01).
    Date(i32),
    /// Member of a user-defined enum, by logical representation.
    Enum(String),
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Datum {}

impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.hash(state),
            Self::String(v) => v.hash(state),
            Self::Bytes(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
            Self::Enum(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Bool(v) => write!(f, "{}", v),
            Datum::Int(v) => write!(f, "{}", v),
            Datum::Float(v) => write!(f, "{}", v),
            Datum::String(s) | Datum::Enum(s) => write_string_literal(f, s),
            Datum::Bytes(b) => {
                write!(f, "'\\x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, "'")
            }
            Datum::Date(days) => write!(f, "{}", days),
        }
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'{}'", s.replace('\'', "''"))
}

/// Scalar expressions the catalog needs to synthesize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a column of the constrained table by name.
    Column(String),
    Literal(Datum),
    /// `expr IN (v1, v2, ...)`.
    InList { expr: Box<Expr>, list: Vec<Expr> },
}

impl Expr {
    pub fn in_list(column: impl Into<String>, values: impl IntoIterator<Item = Datum>) -> Self {
        Expr::InList {
            expr: Box::new(Expr::Column(column.into())),
            list: values.into_iter().map(Expr::Literal).collect(),
        }
    }

    /// Serialized SQL text, as stored in check constraints.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write_identifier(f, name),
            Expr::Literal(d) => write!(f, "{}", d),
            Expr::InList { expr, list } => {
                write!(f, "{} IN (", expr)?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Writes a SQL identifier, quoting it unless it is a plain lower-case name.
fn write_identifier(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let bare = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if bare {
        write!(f, "{}", name)
    } else {
        write!(f, "\"{}\"", name.replace('"', "\"\""))
    }
}
