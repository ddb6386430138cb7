// SPDX-License-Identifier: AGPL-3.0-or-later

//! Object registry.
//!
//! Registering an object inserts its `objects` stub row together with one row in its
//! per-type primitives table, one `links` row per NODE field and one `connections` row per
//! CONNECTION field, all with NULL payloads. Pre-populating every row at registration turns
//! all later writes into single-row updates.
use log::debug;
use sqlx::sqlite::SqliteConnection;
use sqlx::{query, query_as, query_scalar};

use crate::db::models::ObjectRow;
use crate::db::Mirror;
use crate::errors::MirrorError;
use crate::schema::SchemaIndex;

impl Mirror {
    /// Registers an object under the given typename and id.
    ///
    /// Idempotent when the pair is already registered. Raises `TypeConflict` when the id
    /// exists under a different typename, `UnknownType` when the typename is absent from the
    /// schema and `NonObjectType` when it resolves to a union, as only object types can be
    /// instantiated.
    pub async fn register_object(&self, typename: &str, id: &str) -> Result<(), MirrorError> {
        let _guard = self.begin_guard()?;
        let mut tx = self.pool.begin().await?;

        match register_object_with(&mut tx, &self.index, typename, id).await {
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

    /// Get an object row by its id.
    ///
    /// Returns a result containing the row wrapped in an option if it was found. Returns
    /// `None` when the id was never registered. Errors when a fatal storage error occured.
    pub async fn object(&self, id: &str) -> Result<Option<ObjectRow>, MirrorError> {
        let row = query_as::<_, ObjectRow>(
            "
            SELECT
                id,
                typename,
                last_update
            FROM
                objects
            WHERE
                id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Registers an object on an already open transaction.
///
/// This variant skips the BEGIN so larger operations, like ingesting a connection page which
/// references child nodes, can group many registrations into one outer transaction.
pub(crate) async fn register_object_with(
    conn: &mut SqliteConnection,
    index: &SchemaIndex,
    typename: &str,
    id: &str,
) -> Result<(), MirrorError> {
    let object = index.object(typename)?;

    let existing: Option<String> = query_scalar("SELECT typename FROM objects WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match existing {
        Some(registered) if registered == typename => return Ok(()),
        Some(registered) => {
            return Err(MirrorError::TypeConflict {
                id: id.to_string(),
                existing: registered,
                requested: typename.to_string(),
            })
        }
        None => (),
    }

    query("INSERT INTO objects (id, typename, last_update) VALUES ($1, $2, NULL)")
        .bind(id)
        .bind(typename)
        .execute(&mut *conn)
        .await?;

    // The typename was checked against the identifier predicate at install.
    query(&format!(
        "INSERT INTO \"primitives_{}\" (id) VALUES ($1)",
        typename
    ))
    .bind(id)
    .execute(&mut *conn)
    .await?;

    for fieldname in object.link_field_names() {
        query("INSERT INTO links (parent_id, fieldname, child_id) VALUES ($1, $2, NULL)")
            .bind(id)
            .bind(fieldname)
            .execute(&mut *conn)
            .await?;
    }

    for fieldname in object.connection_field_names() {
        query("INSERT INTO connections (object_id, fieldname) VALUES ($1, $2)")
            .bind(id)
            .bind(fieldname)
            .execute(&mut *conn)
            .await?;
    }

    debug!("Registered object '{}' of type '{}'", id, typename);
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::{query_as, query_scalar};

    use crate::errors::MirrorError;
    use crate::test_utils::{repo_schema, test_mirror};

    #[tokio::test]
    async fn registration_creates_stub_rows() {
        let mirror = test_mirror(&repo_schema()).await;
        mirror.register_object("Repo", "r1").await.unwrap();

        let object = mirror.object("r1").await.unwrap().unwrap();
        assert_eq!(object.typename, "Repo");
        assert_eq!(object.last_update, None);

        let primitives: Vec<String> = query_scalar("SELECT id FROM \"primitives_Repo\"")
            .fetch_all(&mirror.pool)
            .await
            .unwrap();
        assert_eq!(primitives, ["r1"]);

        // Repo has one connection field and no link fields.
        let connections: Vec<(String, Option<i64>, Option<String>)> = query_as(
            "SELECT fieldname, last_update, end_cursor FROM connections WHERE object_id = $1",
        )
        .bind("r1")
        .fetch_all(&mirror.pool)
        .await
        .unwrap();
        assert_eq!(connections, [("issues".to_string(), None, None)]);

        let links: i64 = query_scalar("SELECT COUNT(*) FROM links WHERE parent_id = $1")
            .bind("r1")
            .fetch_one(&mirror.pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn link_fields_are_pre_populated() {
        let mirror = test_mirror(&repo_schema()).await;
        mirror.register_object("Issue", "i1").await.unwrap();

        let links: Vec<(String, Option<String>)> =
            query_as("SELECT fieldname, child_id FROM links WHERE parent_id = $1")
                .bind("i1")
                .fetch_all(&mirror.pool)
                .await
                .unwrap();
        assert_eq!(links, [("author".to_string(), None)]);
    }

    #[tokio::test]
    async fn registration_is_idempotent() {
        let mirror = test_mirror(&repo_schema()).await;

        mirror.register_object("Repo", "r1").await.unwrap();
        mirror.register_object("Repo", "r1").await.unwrap();

        let objects: i64 = query_scalar("SELECT COUNT(*) FROM objects")
            .fetch_one(&mirror.pool)
            .await
            .unwrap();
        assert_eq!(objects, 1);
    }

    #[tokio::test]
    async fn conflicting_typename_is_refused() {
        let mirror = test_mirror(&repo_schema()).await;
        mirror.register_object("Repo", "x").await.unwrap();

        let result = mirror.register_object("Issue", "x").await;
        assert!(matches!(
            result,
            Err(MirrorError::TypeConflict { ref existing, ref requested, .. })
                if existing == "Repo" && requested == "Issue"
        ));

        // The store is unchanged.
        let object = mirror.object("x").await.unwrap().unwrap();
        assert_eq!(object.typename, "Repo");
    }

    #[tokio::test]
    async fn only_schema_object_types_can_be_registered() {
        let mirror = test_mirror(&repo_schema()).await;

        assert!(matches!(
            mirror.register_object("Missing", "m1").await,
            Err(MirrorError::UnknownType(_))
        ));
        assert!(matches!(
            mirror.register_object("Actor", "a1").await,
            Err(MirrorError::NonObjectType(_))
        ));
    }
}
