// SPDX-License-Identifier: AGPL-3.0-or-later

//! Schema installer, invoked once when a mirror is opened.
//!
//! Inside a single transaction the installer creates the `meta` table if missing, compares
//! any stored schema fingerprint against the current one and either installs the full
//! relational layout (fresh store), does nothing (identical store) or refuses the store
//! (`IncompatibleStore`). After a successful commit the store is guaranteed to be byte-for-
//! byte compatible with this code and schema.
use log::{debug, info};
use sqlx::sqlite::SqliteConnection;
use sqlx::{query, query_scalar};

use crate::db::Mirror;
use crate::errors::MirrorError;
use crate::schema::identifier::ensure_sql_safe;
use crate::schema::SchemaIndex;

/// Structural tables shared by all schemas. Their shape is version-locked: any change here
/// must bump `SCHEMA_VERSION`.
const STRUCTURAL_DDL: &[&str] = &[
    "
    CREATE TABLE updates (
        rowid INTEGER PRIMARY KEY,
        time_epoch_millis INTEGER NOT NULL
    )
    ",
    "
    CREATE TABLE objects (
        id TEXT NOT NULL PRIMARY KEY,
        typename TEXT NOT NULL,
        last_update INTEGER REFERENCES updates (rowid)
    )
    ",
    "
    CREATE TABLE links (
        rowid INTEGER PRIMARY KEY,
        parent_id TEXT NOT NULL REFERENCES objects (id),
        fieldname TEXT NOT NULL,
        child_id TEXT REFERENCES objects (id),
        UNIQUE (parent_id, fieldname)
    )
    ",
    "
    CREATE TABLE connections (
        rowid INTEGER PRIMARY KEY,
        object_id TEXT NOT NULL REFERENCES objects (id),
        fieldname TEXT NOT NULL,
        last_update INTEGER REFERENCES updates (rowid),
        total_count INTEGER,
        has_next_page BOOLEAN,
        end_cursor TEXT,
        CHECK ((last_update IS NULL) = (total_count IS NULL)),
        CHECK ((last_update IS NULL) = (has_next_page IS NULL)),
        CHECK ((last_update IS NULL) <= (end_cursor IS NULL)),
        UNIQUE (object_id, fieldname)
    )
    ",
    "
    CREATE TABLE connection_entries (
        rowid INTEGER PRIMARY KEY,
        connection_id INTEGER NOT NULL REFERENCES connections (rowid),
        idx INTEGER NOT NULL,
        child_id TEXT REFERENCES objects (id),
        UNIQUE (connection_id, idx)
    )
    ",
    "
    CREATE UNIQUE INDEX idx_links_parent_id_fieldname
        ON links (parent_id, fieldname)
    ",
    "
    CREATE UNIQUE INDEX idx_connections_object_id_fieldname
        ON connections (object_id, fieldname)
    ",
    "
    CREATE INDEX idx_connection_entries_connection_id
        ON connection_entries (connection_id)
    ",
];

impl Mirror {
    /// Installs or verifies the relational layout for this mirror's schema.
    pub(crate) async fn install(&self, fingerprint: &str) -> Result<(), MirrorError> {
        let _guard = self.begin_guard()?;
        let mut tx = self.pool.begin().await?;

        match install_with(&mut tx, &self.index, fingerprint).await {
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
}

async fn install_with(
    conn: &mut SqliteConnection,
    index: &SchemaIndex,
    fingerprint: &str,
) -> Result<(), MirrorError> {
    // Refuse unsafe identifiers before building or executing any DDL.
    for (typename, object) in index.objects() {
        ensure_sql_safe(typename)?;
        for fieldname in object.primitive_field_names() {
            ensure_sql_safe(fieldname)?;
        }
    }

    query(
        "
        CREATE TABLE IF NOT EXISTS meta (
            zero INTEGER PRIMARY KEY,
            schema TEXT NOT NULL
        )
        ",
    )
    .execute(&mut *conn)
    .await?;

    let existing: Option<String> = query_scalar("SELECT schema FROM meta")
        .fetch_optional(&mut *conn)
        .await?;

    match existing {
        Some(stored) if stored == fingerprint => {
            debug!("Reopened store with matching schema fingerprint");
            Ok(())
        }
        Some(_) => Err(MirrorError::IncompatibleStore),
        None => {
            for statement in STRUCTURAL_DDL {
                query(statement).execute(&mut *conn).await?;
            }

            for (typename, object) in index.objects() {
                query(&primitives_table_ddl(typename, object.primitive_field_names()))
                    .execute(&mut *conn)
                    .await?;
            }

            query("INSERT INTO meta (zero, schema) VALUES (0, $1)")
                .bind(fingerprint)
                .execute(&mut *conn)
                .await?;

            info!("Installed fresh store for {} object types", index.objects().count());
            Ok(())
        }
    }
}

/// Builds the `primitives_<T>` DDL for one object type. Identifiers have been checked, the
/// column names are still written double-quoted verbatim.
fn primitives_table_ddl(typename: &str, primitive_field_names: &[String]) -> String {
    let mut columns = vec!["id TEXT NOT NULL PRIMARY KEY REFERENCES objects (id)".to_string()];
    for fieldname in primitive_field_names {
        columns.push(format!("\"{}\"", fieldname));
    }

    format!(
        "CREATE TABLE \"primitives_{}\" ({})",
        typename,
        columns.join(", ")
    )
}
