// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::FromRow;

/// Struct representing a row of the `connections` table.
///
/// The three metadata columns `last_update`, `total_count` and `has_next_page` are NULL
/// together, exactly until the connection is updated for the first time. `end_cursor` is NULL
/// while they are, but may legitimately stay NULL afterwards when the remote reported a
/// cursorless (empty or exhausted) page.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRow {
    /// Assigned row id of the connection.
    pub rowid: i64,

    /// Id of the object owning the connection.
    pub object_id: String,

    /// Connection fieldname on the owning object's type.
    pub fieldname: String,

    /// Id of the update which last refreshed this connection.
    pub last_update: Option<i64>,

    /// Total number of entries the remote reported at the last update.
    pub total_count: Option<i64>,

    /// Whether the remote reported further pages at the last update.
    pub has_next_page: Option<bool>,

    /// Pagination cursor to resume from, stored verbatim.
    pub end_cursor: Option<String>,
}

/// Struct representing a row of the `connection_entries` table.
#[derive(FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntryRow {
    /// Row id of the connection this entry belongs to.
    pub connection_id: i64,

    /// Position of the entry. Strictly increasing in insertion order within a connection.
    pub idx: i64,

    /// Id of the referenced child object, NULL when the remote returned a null node.
    pub child_id: Option<String>,
}
