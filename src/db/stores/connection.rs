// SPDX-License-Identifier: AGPL-3.0-or-later

//! Connection ingestor.
//!
//! Applies one page of connection results: connection metadata and the appended entries
//! become visible atomically, entry order is the order received and entries are never
//! deleted or reordered. Overlapping pages are stored as duplicates, resuming from the
//! stored end cursor correctly is the caller's concern.
use log::debug;
use sqlx::sqlite::SqliteConnection;
use sqlx::{query, query_as, query_scalar};

use crate::db::models::{ConnectionEntryRow, ConnectionRow};
use crate::db::stores::object::register_object_with;
use crate::db::stores::{assert_single_row, UpdateId};
use crate::db::Mirror;
use crate::errors::MirrorError;
use crate::graphql::ConnectionPage;
use crate::schema::SchemaIndex;

impl Mirror {
    /// Ingests one page of results for the given connection.
    ///
    /// Atomically updates the connection metadata (`last_update`, `total_count`,
    /// `has_next_page`, `end_cursor`) and appends one entry per node, continuing the `idx`
    /// sequence where the previous page left off. Nodes are registered as objects on the
    /// fly, null nodes are stored as entries with a NULL child.
    ///
    /// Raises `UnknownUpdate` when the update id does not exist, `UnknownConnection` when
    /// the object was never registered or the fieldname is not a connection of its type and
    /// `TypeConflict` when a node's typename contradicts an earlier registration. Any error
    /// rolls the whole page back.
    pub async fn update_connection(
        &self,
        update_id: UpdateId,
        object_id: &str,
        fieldname: &str,
        page: &ConnectionPage,
    ) -> Result<(), MirrorError> {
        let _guard = self.begin_guard()?;
        let mut tx = self.pool.begin().await?;

        match update_connection_with(&mut tx, &self.index, update_id, object_id, fieldname, page)
            .await
        {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(err) => {
                tx.rollback().await?;
                Err(err)
            }
        }
    }

    /// Get the metadata row of a connection.
    ///
    /// Returns a result containing the row if the connection exists. Raises
    /// `UnknownConnection` otherwise. Errors when a fatal storage error occured.
    pub async fn connection_metadata(
        &self,
        object_id: &str,
        fieldname: &str,
    ) -> Result<ConnectionRow, MirrorError> {
        let row = query_as::<_, ConnectionRow>(
            "
            SELECT
                rowid,
                object_id,
                fieldname,
                last_update,
                total_count,
                has_next_page,
                end_cursor
            FROM
                connections
            WHERE
                object_id = $1
                AND fieldname = $2
            ",
        )
        .bind(object_id)
        .bind(fieldname)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| MirrorError::UnknownConnection {
            object_id: object_id.to_string(),
            fieldname: fieldname.to_string(),
        })
    }

    /// Get all entries of a connection, in ingestion order.
    ///
    /// Null children are preserved in place. Raises `UnknownConnection` when the connection
    /// does not exist. Errors when a fatal storage error occured.
    pub async fn connection_entries(
        &self,
        object_id: &str,
        fieldname: &str,
    ) -> Result<Vec<ConnectionEntryRow>, MirrorError> {
        let connection = self.connection_metadata(object_id, fieldname).await?;

        let entries = query_as::<_, ConnectionEntryRow>(
            "
            SELECT
                connection_id,
                idx,
                child_id
            FROM
                connection_entries
            WHERE
                connection_id = $1
            ORDER BY
                idx
            ",
        )
        .bind(connection.rowid)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

async fn update_connection_with(
    conn: &mut SqliteConnection,
    index: &SchemaIndex,
    update_id: UpdateId,
    object_id: &str,
    fieldname: &str,
    page: &ConnectionPage,
) -> Result<(), MirrorError> {
    let update: Option<i64> = query_scalar("SELECT rowid FROM updates WHERE rowid = $1")
        .bind(update_id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;
    if update.is_none() {
        return Err(MirrorError::UnknownUpdate(update_id));
    }

    let connection_id: Option<i64> = query_scalar(
        "SELECT rowid FROM connections WHERE object_id = $1 AND fieldname = $2",
    )
    .bind(object_id)
    .bind(fieldname)
    .fetch_optional(&mut *conn)
    .await?;
    let connection_id = connection_id.ok_or_else(|| MirrorError::UnknownConnection {
        object_id: object_id.to_string(),
        fieldname: fieldname.to_string(),
    })?;

    let updated = query(
        "
        UPDATE connections
        SET
            last_update = $1,
            total_count = $2,
            has_next_page = $3,
            end_cursor = $4
        WHERE
            rowid = $5
        ",
    )
    .bind(update_id.as_i64())
    .bind(page.total_count)
    .bind(page.page_info.has_next_page)
    .bind(page.page_info.end_cursor.as_deref())
    .bind(connection_id)
    .execute(&mut *conn)
    .await?;
    assert_single_row(&updated, "connection metadata update")?;

    let max_idx: i64 = query_scalar(
        "SELECT COALESCE(MAX(idx), 0) FROM connection_entries WHERE connection_id = $1",
    )
    .bind(connection_id)
    .fetch_one(&mut *conn)
    .await?;
    let mut next_idx = max_idx + 1;

    for node in &page.nodes {
        let child_id = match node {
            Some(node) => {
                register_object_with(&mut *conn, index, &node.typename, &node.id).await?;
                Some(node.id.as_str())
            }
            // Relay may return null nodes for deleted or inaccessible objects.
            None => None,
        };

        query(
            "INSERT INTO connection_entries (connection_id, idx, child_id) VALUES ($1, $2, $3)",
        )
        .bind(connection_id)
        .bind(next_idx)
        .bind(child_id)
        .execute(&mut *conn)
        .await?;

        next_idx += 1;
    }

    debug!(
        "Ingested {} entries for connection '{}' of object '{}'",
        page.nodes.len(),
        fieldname,
        object_id
    );
    Ok(())
}
