// SPDX-License-Identifier: AGPL-3.0-or-later

//! Helpers for the test suites: in-memory mirrors and fixture schemas.
use sqlx::query_scalar;

use crate::db::{connection_pool, Mirror, Pool};
use crate::graphql::{ConnectionPage, NodeRef, PageInfo};
use crate::schema::Schema;

/// Returns a single-connection pool over a fresh in-memory SQLite database.
pub async fn test_pool() -> Pool {
    // One connection: with more, every pool member would see its own empty
    // in-memory database.
    connection_pool("sqlite::memory:", 1)
        .await
        .expect("Connecting to in-memory database failed")
}

/// Returns a mirror over a fresh in-memory database, installed with the given schema.
pub async fn test_mirror(schema: &Schema) -> Mirror {
    Mirror::open(test_pool().await, schema)
        .await
        .expect("Opening test mirror failed")
}

/// Fixture schema with a connection, a link, a union and plain primitives:
/// repositories holding issues, issues authored by users or bots.
pub fn repo_schema() -> Schema {
    Schema::from_json(
        r#"{
            "Repo": {
                "OBJECT": {
                    "fields": {
                        "id": "ID",
                        "name": "PRIMITIVE",
                        "issues": { "CONNECTION": { "elementType": "Issue" } }
                    }
                }
            },
            "Issue": {
                "OBJECT": {
                    "fields": {
                        "id": "ID",
                        "title": "PRIMITIVE",
                        "author": { "NODE": { "elementType": "Actor" } }
                    }
                }
            },
            "User": { "OBJECT": { "fields": { "id": "ID", "login": "PRIMITIVE" } } },
            "Bot": { "OBJECT": { "fields": { "id": "ID", "login": "PRIMITIVE" } } },
            "Actor": { "UNION": { "clauses": ["User", "Bot"] } }
        }"#,
    )
    .expect("Parsing fixture schema failed")
}

/// Builds a connection page result from shorthand node tuples.
pub fn page(
    total_count: i64,
    has_next_page: bool,
    end_cursor: Option<&str>,
    nodes: Vec<Option<(&str, &str)>>,
) -> ConnectionPage {
    ConnectionPage {
        total_count,
        page_info: PageInfo {
            has_next_page,
            end_cursor: end_cursor.map(str::to_string),
        },
        nodes: nodes
            .into_iter()
            .map(|node| {
                node.map(|(typename, id)| NodeRef {
                    typename: typename.to_string(),
                    id: id.to_string(),
                })
            })
            .collect(),
    }
}

/// Returns the names of all tables in the mirror's store.
pub async fn table_names(mirror: &Mirror) -> Vec<String> {
    query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .fetch_all(&mirror.pool)
        .await
        .expect("Reading sqlite_master failed")
}
