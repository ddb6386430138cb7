// SPDX-License-Identifier: AGPL-3.0-or-later

//! Update clock.
//!
//! Updates are timestamped markers of one refresh event. Objects and connections reference
//! them to track freshness. Ids are dense and monotonically increasing within one process but
//! only uniqueness is relied upon.
use std::fmt;

use sqlx::{query, query_as};

use crate::db::models::UpdateRow;
use crate::db::Mirror;
use crate::errors::MirrorError;

/// Opaque id of one update event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UpdateId(pub(crate) i64);

impl UpdateId {
    /// Returns the raw row id backing this update.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Mirror {
    /// Creates a new update marker at the given wall-clock time.
    ///
    /// The time is in milliseconds since the UNIX epoch with ECMAScript semantics: 86,400,000
    /// milliseconds per day, no leap seconds. The caller provides whatever clock source it
    /// prefers, the store records the integer verbatim.
    pub async fn create_update(&self, timestamp_ms: i64) -> Result<UpdateId, MirrorError> {
        let result = query("INSERT INTO updates (time_epoch_millis) VALUES ($1)")
            .bind(timestamp_ms)
            .execute(&self.pool)
            .await?;

        Ok(UpdateId(result.last_insert_rowid()))
    }

    /// Get an update row by its id.
    ///
    /// Returns a result containing the row wrapped in an option if it was found. Errors when
    /// a fatal storage error occured.
    pub async fn update(&self, id: UpdateId) -> Result<Option<UpdateRow>, MirrorError> {
        let row = query_as::<_, UpdateRow>(
            "
            SELECT
                rowid,
                time_epoch_millis
            FROM
                updates
            WHERE
                rowid = $1
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
