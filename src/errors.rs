// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types of the mirror.
//!
//! Every error raised inside a store operation aborts the enclosing transaction. Nothing is
//! swallowed or retried here, the caller decides how to recover.
use crate::db::stores::UpdateId;

/// Errors detected while validating the shape of an input schema.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema could not be deserialized, for example because a field kind is unrecognized.
    #[error("Invalid schema: {0}")]
    Invalid(String),

    /// A link or connection field references a typename which is not part of the schema.
    #[error("Field '{typename}.{fieldname}' references undefined type '{element_type}'")]
    UnknownElementType {
        /// Type declaring the offending field.
        typename: String,
        /// Name of the offending field.
        fieldname: String,
        /// The undefined element type it points at.
        element_type: String,
    },

    /// A union clause references a typename which is not part of the schema.
    #[error("Union '{union_typename}' has undefined clause '{clause}'")]
    UnknownClause {
        /// The union declaring the clause.
        union_typename: String,
        /// The undefined clause typename.
        clause: String,
    },

    /// A union clause references a type which is not an object type. Unions of unions are not
    /// part of the closed schema shape.
    #[error("Clause '{clause}' of union '{union_typename}' is not an object type")]
    ClauseNotObject {
        /// The union declaring the clause.
        union_typename: String,
        /// The clause typename which resolved to a non-object type.
        clause: String,
    },

    /// An object type declares no id field.
    #[error("Object type '{0}' declares no id field")]
    NoIdField(String),

    /// An object type declares more than one id field.
    #[error("Object type '{typename}' declares multiple id fields ('{first}', '{second}')")]
    MultipleIdFields {
        /// The offending object type.
        typename: String,
        /// First declared id field.
        first: String,
        /// Second declared id field.
        second: String,
    },
}

/// Errors raised by mirror operations.
#[derive(thiserror::Error, Debug)]
pub enum MirrorError {
    /// The attached store was created with a different schema or format version. Fatal at open,
    /// the store is left untouched.
    #[error("Existing store was created with a different schema or version")]
    IncompatibleStore,

    /// A typename or primitive fieldname is not safe to appear unquoted in SQL. Fatal at
    /// install, raised before any DDL executes.
    #[error("Unsafe SQL identifier '{0}'")]
    UnsafeIdentifier(String),

    /// The input schema is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A typename is not part of the schema.
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    /// An operation which requires an object type was invoked with a union type.
    #[error("Type '{0}' is not an object type")]
    NonObjectType(String),

    /// A fieldname is not declared on the given type.
    #[error("Type '{typename}' has no field '{fieldname}'")]
    UnknownField {
        /// The type which was inspected.
        typename: String,
        /// The missing fieldname.
        fieldname: String,
    },

    /// A field exists but is not a connection field.
    #[error("Field '{typename}.{fieldname}' is not a connection")]
    NotAConnection {
        /// The type declaring the field.
        typename: String,
        /// The non-connection fieldname.
        fieldname: String,
    },

    /// An object id is already registered under a different typename. Typenames are immutable
    /// after the first registration.
    #[error("Object '{id}' is registered with type '{existing}', not '{requested}'")]
    TypeConflict {
        /// The conflicting object id.
        id: String,
        /// Typename recorded in the store.
        existing: String,
        /// Typename requested by the caller.
        requested: String,
    },

    /// No connection row exists for the given object and fieldname. Either the object was never
    /// registered or the fieldname is not a connection of its type.
    #[error("No connection '{fieldname}' on object '{object_id}'")]
    UnknownConnection {
        /// The parent object id.
        object_id: String,
        /// The requested connection fieldname.
        fieldname: String,
    },

    /// The referenced update id does not exist in the store.
    #[error("Unknown update id {0}")]
    UnknownUpdate(UpdateId),

    /// A transaction was opened while another one is still active.
    #[error("Attempted to open a transaction while one is active")]
    AlreadyInTransaction,

    /// A statement which must change exactly one row changed zero or several.
    #[error("Store invariant violated: {0}")]
    InvariantViolation(String),

    /// The underlying database failed.
    #[error("Fatal storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
