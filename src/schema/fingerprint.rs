// SPDX-License-Identifier: AGPL-3.0-or-later

//! Deterministic fingerprint of a schema, stored in the `meta` table.
//!
//! The fingerprint is the serialization of `{version, schema}` with keys sorted
//! lexicographically at every nesting level and no extraneous whitespace, so equivalent
//! schemas produce identical bytes. A store is only reopened when the fingerprint matches
//! byte for byte.
use serde_json::{Map, Value};

use crate::errors::SchemaError;
use crate::schema::Schema;

/// Version tag of the store layout. Bumped whenever the relational layout or the semantics of
/// any mirror operation change.
pub const SCHEMA_VERSION: &str = "MIRROR_v1";

/// Returns the deterministic fingerprint of the given schema.
///
/// `serde_json` maps are backed by a `BTreeMap` so every object level serializes with its keys
/// in lexicographic order, independent of the declaration order inside the schema.
pub fn fingerprint(schema: &Schema) -> Result<String, SchemaError> {
    let schema_value =
        serde_json::to_value(schema).map_err(|err| SchemaError::Invalid(err.to_string()))?;

    let mut blob = Map::new();
    blob.insert("schema".to_string(), schema_value);
    blob.insert("version".to_string(), Value::String(SCHEMA_VERSION.to_string()));

    Ok(Value::Object(blob).to_string())
}

#[cfg(test)]
mod tests {
    use super::{fingerprint, SCHEMA_VERSION};
    use crate::schema::Schema;

    #[test]
    fn serializes_sorted_and_compact() {
        let schema = Schema::from_json(
            r#"{ "A": { "OBJECT": { "fields": { "id": "ID" } } } }"#,
        )
        .unwrap();

        assert_eq!(
            fingerprint(&schema).unwrap(),
            r#"{"schema":{"A":{"OBJECT":{"fields":{"id":"ID"}}}},"version":"MIRROR_v1"}"#
        );
    }

    #[test]
    fn independent_of_declaration_order() {
        let forwards = Schema::from_json(
            r#"{
                "Repo": { "OBJECT": { "fields": { "id": "ID", "name": "PRIMITIVE" } } },
                "Issue": { "OBJECT": { "fields": { "id": "ID" } } }
            }"#,
        )
        .unwrap();
        let backwards = Schema::from_json(
            r#"{
                "Issue": { "OBJECT": { "fields": { "id": "ID" } } },
                "Repo": { "OBJECT": { "fields": { "id": "ID", "name": "PRIMITIVE" } } }
            }"#,
        )
        .unwrap();

        assert_eq!(
            fingerprint(&forwards).unwrap(),
            fingerprint(&backwards).unwrap()
        );
    }

    #[test]
    fn version_tag_is_embedded() {
        let schema = Schema::from_json(r#"{}"#).unwrap();
        assert!(fingerprint(&schema).unwrap().contains(SCHEMA_VERSION));
    }
}
