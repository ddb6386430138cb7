// SPDX-License-Identifier: AGPL-3.0-or-later

//! Input schema of the mirrored object graph.
//!
//! The schema describes a closed universe of object types (with id, primitive, link and
//! connection fields) and union types (discriminated unions of object types). It is the single
//! input from which the relational layout, the staleness planner and the query synthesizer are
//! all derived.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

pub mod fingerprint;
pub mod identifier;
mod index;

pub use fingerprint::{fingerprint, SCHEMA_VERSION};
pub use index::{ObjectIndex, SchemaIndex, TypeIndex, UnionIndex};

/// Kind of a single field on an object type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    /// The identifying field of the object. Every object type declares exactly one.
    Id,

    /// A scalar value owned by the object itself.
    Primitive,

    /// A singular reference to another object.
    #[serde(rename_all = "camelCase")]
    Node {
        /// Typename of the referenced object or union.
        element_type: String,
    },

    /// A Relay-style paginated collection of references to other objects.
    #[serde(rename_all = "camelCase")]
    Connection {
        /// Typename of the element objects or unions.
        element_type: String,
    },
}

/// Declaration of a single type in the schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeSpec {
    /// An object type with an ordered mapping from fieldname to field kind.
    Object {
        /// Declared fields, in declaration order.
        fields: IndexMap<String, FieldKind>,
    },

    /// A discriminated union over a set of object types.
    Union {
        /// Member typenames, in declaration order.
        clauses: Vec<String>,
    },
}

/// A complete schema: an ordered mapping from typename to type declaration.
///
/// Schemas are plain data. Shape validation (closedness of element types and union clauses,
/// exactly one id field per object type) happens when the schema is decomposed into a
/// [`SchemaIndex`], which is what every other component consumes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    types: IndexMap<String, TypeSpec>,
}

impl Schema {
    /// Returns a new schema over the given type declarations.
    pub fn new(types: IndexMap<String, TypeSpec>) -> Self {
        Self { types }
    }

    /// Deserializes a schema from its JSON representation.
    ///
    /// An unrecognized field kind or type shape fails here with `SchemaError::Invalid`.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|err| SchemaError::Invalid(err.to_string()))
    }

    /// Returns all type declarations in declaration order.
    pub fn types(&self) -> &IndexMap<String, TypeSpec> {
        &self.types
    }
}
