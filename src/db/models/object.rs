// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::FromRow;

/// Struct representing a row of the `objects` table.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ObjectRow {
    /// Remote id of the object.
    pub id: String,

    /// Typename the object was registered with. Immutable after insertion.
    pub typename: String,

    /// Id of the update which last refreshed the object's own data, if any.
    pub last_update: Option<i64>,
}
