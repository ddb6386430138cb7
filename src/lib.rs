// SPDX-License-Identifier: AGPL-3.0-or-later

#![doc = include_str!("../README.md")]
#![warn(
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]
#![allow(clippy::uninlined_format_args)]
mod db;
mod errors;
mod graphql;
mod schema;
#[cfg(test)]
mod test_utils;

pub use crate::db::models::{ConnectionEntryRow, ConnectionRow, ObjectRow, UpdateRow};
pub use crate::db::stores::{ConnectionRef, EndCursor, ObjectRef, QueryPlan, UpdateId};
pub use crate::db::{connection_pool, create_database, Mirror, Pool};
pub use crate::errors::{MirrorError, SchemaError};
pub use crate::graphql::{
    query_connection, query_shallow, ConnectionPage, NodeRef, PageInfo, DEFAULT_PAGE_SIZE,
};
pub use crate::schema::{
    FieldKind, ObjectIndex, Schema, SchemaIndex, TypeIndex, TypeSpec, UnionIndex, SCHEMA_VERSION,
};

/// Attach a log handler for the test suite.
///
/// The crate only talks to the `log` facade and prints nothing by itself, so the tests wire
/// up `env_logger` here. Output is opt-in through `RUST_LOG`, which also filters per module
/// or dependency: `RUST_LOG=graphql_mirror=debug cargo t -- --nocapture` shows this crate's
/// logs, `RUST_LOG=sqlx=debug` the statements the store executes.
///
/// Declared as a `ctor` constructor so it runs once, before the first test.
#[cfg(test)]
#[ctor::ctor]
fn init() {
    // Without RUST_LOG stay quiet.
    if std::env::var("RUST_LOG").is_ok() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}
