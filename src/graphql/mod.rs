// SPDX-License-Identifier: AGPL-3.0-or-later

//! GraphQL query synthesis and result shapes.
//!
//! The synthesizer emits selection sets through `apollo-encoder`, parameterized by the
//! schema and by per-connection end cursors. Both operations are pure functions of their
//! arguments, they never touch the store. Executing the emitted queries against the remote
//! server is the surrounding fetch loop's concern.
use std::num::NonZeroU64;

use apollo_encoder::{
    Argument, Field, InlineFragment, Selection, SelectionSet, TypeCondition, Value,
};

use crate::db::stores::EndCursor;
use crate::errors::MirrorError;
use crate::schema::{ObjectIndex, SchemaIndex, TypeIndex};

mod response;

pub use response::{ConnectionPage, NodeRef, PageInfo};

/// Default number of nodes requested per connection page.
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Returns the minimal selection needed to discover an object's concrete type and id.
///
/// For an object type this is `{ __typename, <id> }`. For a union type the id is selected
/// through one inline fragment per clause, so the remote answers with the id regardless of
/// which member type the node turns out to be. An id field not literally named `id` is
/// aliased to `id`, so every response node deserializes into the fixed [`NodeRef`] shape.
/// Raises `UnknownType` for typenames absent from the schema.
pub fn query_shallow(
    index: &SchemaIndex,
    typename: &str,
) -> Result<SelectionSet, MirrorError> {
    let mut selections = SelectionSet::new();
    selections.selection(Selection::Field(Field::new("__typename".to_string())));

    match index.type_index(typename)? {
        TypeIndex::Object(object) => {
            selections.selection(Selection::Field(id_field(object)));
        }
        TypeIndex::Union(union) => {
            for clause in union.clauses() {
                // Clauses are object types, checked at schema decomposition.
                let object = index.object(clause)?;

                let mut id_selection = SelectionSet::new();
                id_selection.selection(Selection::Field(id_field(object)));

                let mut fragment = InlineFragment::new(id_selection);
                fragment.type_condition(Some(TypeCondition::new(clause.to_string())));
                selections.selection(Selection::InlineFragment(fragment));
            }
        }
    }

    Ok(selections)
}

/// Selects the object's id field under the response key `id`.
fn id_field(object: &ObjectIndex) -> Field {
    let mut field = Field::new(object.id_field_name().to_string());
    if object.id_field_name() != "id" {
        field.alias(Some("id".to_string()));
    }

    field
}

/// Returns the selection fetching one page of a connection.
///
/// The emitted shape is:
///
/// ```text
/// <fieldname>(first: <page_size>[, after: <end_cursor>]) {
///   totalCount
///   pageInfo { endCursor hasNextPage }
///   nodes { <shallow selection of the element type> }
/// }
/// ```
///
/// The `after:` argument is present iff the cursor is in the fetched state: a never-fetched
/// connection starts from the beginning, a fetched null cursor is passed through as literal
/// `null`. Raises `UnknownType` or `NonObjectType` for a bad parent typename,
/// `UnknownField` or `NotAConnection` for a bad fieldname.
pub fn query_connection(
    index: &SchemaIndex,
    parent_typename: &str,
    fieldname: &str,
    end_cursor: &EndCursor,
    page_size: NonZeroU64,
) -> Result<Field, MirrorError> {
    let element_type = index.connection_element_type(parent_typename, fieldname)?;

    let total_count = Field::new("totalCount".to_string());

    let mut page_info_selections = SelectionSet::new();
    page_info_selections.selection(Selection::Field(Field::new("endCursor".to_string())));
    page_info_selections.selection(Selection::Field(Field::new("hasNextPage".to_string())));
    let mut page_info = Field::new("pageInfo".to_string());
    page_info.selection_set(Some(page_info_selections));

    let mut nodes = Field::new("nodes".to_string());
    nodes.selection_set(Some(query_shallow(index, element_type)?));

    let mut selections = SelectionSet::new();
    selections.selection(Selection::Field(total_count));
    selections.selection(Selection::Field(page_info));
    selections.selection(Selection::Field(nodes));

    let mut connection = Field::new(fieldname.to_string());
    connection.argument(Argument::new(
        "first".to_string(),
        Value::Int(page_size.get() as i32),
    ));
    if let EndCursor::Fetched(cursor) = end_cursor {
        let value = match cursor {
            Some(cursor) => Value::String(cursor.clone()),
            None => Value::Null,
        };
        connection.argument(Argument::new("after".to_string(), value));
    }
    connection.selection_set(Some(selections));

    Ok(connection)
}
