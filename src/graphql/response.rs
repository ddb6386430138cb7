// SPDX-License-Identifier: AGPL-3.0-or-later

//! Deserialized shapes of remote connection results.
//!
//! These mirror the Relay connection shape the synthesizer asks for, so a fetch loop can
//! deserialize the relevant slice of a GraphQL response body directly into the ingestor's
//! input.
use serde::{Deserialize, Serialize};

/// Shallow node reference inside a connection result.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeRef {
    /// Concrete typename the remote reported.
    #[serde(rename = "__typename")]
    pub typename: String,

    /// Remote id of the node. Shallow queries alias the element type's id field to `id`, so
    /// this key is fixed regardless of what the schema calls that field.
    pub id: String,
}

/// Relay page info of a connection result.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether further pages exist after this one.
    pub has_next_page: bool,

    /// Cursor to resume after, absent when the page was empty or the connection exhausted.
    pub end_cursor: Option<String>,
}

/// One page of a connection result, as returned by the remote for a selection emitted by
/// [`query_connection`](crate::query_connection).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPage {
    /// Total number of entries the remote reports for the connection.
    pub total_count: i64,

    /// Pagination state after this page.
    pub page_info: PageInfo,

    /// The nodes of this page, in order. Null nodes stand for deleted or inaccessible
    /// objects and are preserved in place.
    pub nodes: Vec<Option<NodeRef>>,
}
