// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::FromRow;

/// Struct representing a row of the `updates` table.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct UpdateRow {
    /// Assigned row id of the update.
    pub rowid: i64,

    /// Wall-clock time of the update in milliseconds since the UNIX epoch, leap-second free.
    pub time_epoch_millis: i64,
}
