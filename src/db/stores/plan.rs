// SPDX-License-Identifier: AGPL-3.0-or-later

//! Staleness planner.
//!
//! Produces a [`QueryPlan`] naming every object and connection which is older than a given
//! threshold. The surrounding fetch loop turns the plan into GraphQL queries via the
//! synthesizer, executes them remotely and feeds the results back through the ingestor.
use sqlx::query_as;

use crate::db::Mirror;
use crate::errors::MirrorError;

/// Three-valued pagination cursor of a connection.
///
/// "Never fetched" must stay distinguishable from "fetched with a null cursor": the former
/// omits the `after:` argument so pagination starts from the beginning, the latter passes
/// `null` through (the connection was empty or exhausted). Collapsing both into one nullable
/// string loses the ability to resume correctly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndCursor {
    /// The connection has never been updated.
    Unfetched,

    /// The connection was updated and the remote reported this cursor, possibly none.
    Fetched(Option<String>),
}

/// An object due for a refresh of its own data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectRef {
    /// Typename of the object.
    pub typename: String,

    /// Id of the object.
    pub id: String,
}

/// A connection due for a (re)fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionRef {
    /// Id of the object owning the connection.
    pub object_id: String,

    /// Connection fieldname on the owning object's type.
    pub fieldname: String,

    /// Cursor to resume pagination from.
    pub end_cursor: EndCursor,
}

/// Output of the staleness planner: what the fetcher should refresh next.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryPlan {
    /// Stale objects.
    pub objects: Vec<ObjectRef>,

    /// Stale or incompletely paginated connections.
    pub connections: Vec<ConnectionRef>,
}

impl Mirror {
    /// Plans which objects and connections need a refresh.
    ///
    /// An object is stale when it has never been updated or its last update is strictly older
    /// than `since_ms`. A connection is stale under the same conditions and additionally when
    /// its last page reported `hasNextPage`, as pagination is then incomplete. Runs in a
    /// single read transaction so the plan is a consistent snapshot.
    pub async fn find_outdated(&self, since_ms: i64) -> Result<QueryPlan, MirrorError> {
        let _guard = self.begin_guard()?;
        let mut tx = self.pool.begin().await?;

        let objects = query_as::<_, (String, String)>(
            "
            SELECT
                objects.typename,
                objects.id
            FROM
                objects
            LEFT OUTER JOIN updates
                ON objects.last_update = updates.rowid
            WHERE
                objects.last_update IS NULL
                OR updates.time_epoch_millis < $1
            ",
        )
        .bind(since_ms)
        .fetch_all(&mut *tx)
        .await?;

        let connections = query_as::<_, (String, String, Option<i64>, Option<String>)>(
            "
            SELECT
                connections.object_id,
                connections.fieldname,
                connections.last_update,
                connections.end_cursor
            FROM
                connections
            LEFT OUTER JOIN updates
                ON connections.last_update = updates.rowid
            WHERE
                connections.last_update IS NULL
                OR updates.time_epoch_millis < $1
                OR connections.has_next_page = 1
            ",
        )
        .bind(since_ms)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(QueryPlan {
            objects: objects
                .into_iter()
                .map(|(typename, id)| ObjectRef { typename, id })
                .collect(),
            connections: connections
                .into_iter()
                .map(|(object_id, fieldname, last_update, end_cursor)| ConnectionRef {
                    object_id,
                    fieldname,
                    end_cursor: match last_update {
                        None => EndCursor::Unfetched,
                        Some(_) => EndCursor::Fetched(end_cursor),
                    },
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EndCursor, ObjectRef};
    use crate::test_utils::{page, repo_schema, test_mirror};

    #[tokio::test]
    async fn fresh_objects_and_connections_are_outdated() {
        let mirror = test_mirror(&repo_schema()).await;
        mirror.register_object("Repo", "r1").await.unwrap();

        let plan = mirror.find_outdated(0).await.unwrap();

        assert_eq!(
            plan.objects,
            [ObjectRef {
                typename: "Repo".to_string(),
                id: "r1".to_string()
            }]
        );
        assert_eq!(plan.connections.len(), 1);
        assert_eq!(plan.connections[0].object_id, "r1");
        assert_eq!(plan.connections[0].fieldname, "issues");
        assert_eq!(plan.connections[0].end_cursor, EndCursor::Unfetched);
    }

    #[tokio::test]
    async fn updated_connections_age_out() {
        let mirror = test_mirror(&repo_schema()).await;
        mirror.register_object("Repo", "r1").await.unwrap();

        let update = mirror.create_update(5_000).await.unwrap();
        mirror
            .update_connection(update, "r1", "issues", &page(0, false, None, vec![]))
            .await
            .unwrap();

        // Updated at t=5000: fresh for thresholds at or below, stale above.
        let plan = mirror.find_outdated(5_000).await.unwrap();
        assert!(plan.connections.is_empty());

        let plan = mirror.find_outdated(5_001).await.unwrap();
        assert_eq!(plan.connections.len(), 1);
        assert_eq!(
            plan.connections[0].end_cursor,
            EndCursor::Fetched(None)
        );
    }

    #[tokio::test]
    async fn incomplete_pagination_is_always_planned() {
        let mirror = test_mirror(&repo_schema()).await;
        mirror.register_object("Repo", "r1").await.unwrap();

        let update = mirror.create_update(5_000).await.unwrap();
        mirror
            .update_connection(update, "r1", "issues", &page(3, true, Some("c1"), vec![]))
            .await
            .unwrap();

        // The update is recent, the connection is planned anyway: hasNextPage is set.
        let plan = mirror.find_outdated(0).await.unwrap();
        assert_eq!(plan.connections.len(), 1);
        assert_eq!(
            plan.connections[0].end_cursor,
            EndCursor::Fetched(Some("c1".to_string()))
        );
    }

    #[tokio::test]
    async fn plan_after_partial_ingest_includes_children() {
        let mirror = test_mirror(&repo_schema()).await;
        mirror.register_object("Repo", "r1").await.unwrap();

        let update = mirror.create_update(1_000).await.unwrap();
        mirror
            .update_connection(
                update,
                "r1",
                "issues",
                &page(
                    5,
                    true,
                    Some("c1"),
                    vec![Some(("Issue", "i1")), None, Some(("Issue", "i2"))],
                ),
            )
            .await
            .unwrap();

        // A threshold in the future marks everything stale: the repo, both ingested issues
        // and the half-paginated connection.
        let plan = mirror.find_outdated(2_000).await.unwrap();

        let mut object_ids: Vec<&str> = plan.objects.iter().map(|o| o.id.as_str()).collect();
        object_ids.sort_unstable();
        assert_eq!(object_ids, ["i1", "i2", "r1"]);

        assert_eq!(plan.connections.len(), 1);
        assert_eq!(plan.connections[0].fieldname, "issues");
    }
}
