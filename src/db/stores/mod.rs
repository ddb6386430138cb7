// SPDX-License-Identifier: AGPL-3.0-or-later

//! Store operations of the mirror: installer, object registry, update clock, staleness
//! planner and connection ingestor. Every public write runs inside one transaction which
//! commits on success and rolls back on any error.
use sqlx::sqlite::SqliteQueryResult;

use crate::errors::MirrorError;

mod connection;
mod install;
mod object;
mod plan;
mod update;

pub use plan::{ConnectionRef, EndCursor, ObjectRef, QueryPlan};
pub use update::UpdateId;

/// Asserts that a primary-key UPDATE changed exactly one row.
///
/// The registry pre-populates one row per link and connection field when an object is
/// registered, which turns all later writes into single-row updates. A statement which
/// changes zero or several rows therefore indicates a broken store.
pub(crate) fn assert_single_row(
    result: &SqliteQueryResult,
    statement: &str,
) -> Result<(), MirrorError> {
    match result.rows_affected() {
        1 => Ok(()),
        changed => Err(MirrorError::InvariantViolation(format!(
            "Expected '{}' to change exactly one row, changed {}",
            statement, changed
        ))),
    }
}
