// SPDX-License-Identifier: AGPL-3.0-or-later

//! Decomposed schema index.
//!
//! Flattens the input schema into the per-type shape the stores and the query synthesizer
//! work against: each object type exposes its field map plus three disjoint ordered sequences
//! of primitive, link and connection fieldnames, each union type its ordered clause list.
//! Decomposition validates the closed-universe properties of the schema. Pure, no I/O.
use indexmap::IndexMap;

use crate::errors::{MirrorError, SchemaError};
use crate::schema::{FieldKind, Schema, TypeSpec};

/// Index over a single object type.
#[derive(Clone, Debug)]
pub struct ObjectIndex {
    fields: IndexMap<String, FieldKind>,
    id_field_name: String,
    primitive_field_names: Vec<String>,
    link_field_names: Vec<String>,
    connection_field_names: Vec<String>,
}

impl ObjectIndex {
    /// Returns the full field map, in declaration order.
    pub fn fields(&self) -> &IndexMap<String, FieldKind> {
        &self.fields
    }

    /// Returns the name of the identifying field.
    pub fn id_field_name(&self) -> &str {
        &self.id_field_name
    }

    /// Returns the primitive fieldnames in declaration order. The id field is not included.
    pub fn primitive_field_names(&self) -> &[String] {
        &self.primitive_field_names
    }

    /// Returns the link (NODE) fieldnames in declaration order.
    pub fn link_field_names(&self) -> &[String] {
        &self.link_field_names
    }

    /// Returns the connection fieldnames in declaration order.
    pub fn connection_field_names(&self) -> &[String] {
        &self.connection_field_names
    }
}

/// Index over a single union type.
#[derive(Clone, Debug)]
pub struct UnionIndex {
    clauses: Vec<String>,
}

impl UnionIndex {
    /// Returns the member typenames in declaration order.
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }
}

/// A decomposed type, either object or union.
#[derive(Clone, Copy, Debug)]
pub enum TypeIndex<'a> {
    /// An object type.
    Object(&'a ObjectIndex),

    /// A union type.
    Union(&'a UnionIndex),
}

/// Index over a complete schema.
#[derive(Clone, Debug)]
pub struct SchemaIndex {
    objects: IndexMap<String, ObjectIndex>,
    unions: IndexMap<String, UnionIndex>,
}

impl SchemaIndex {
    /// Decomposes and validates a schema.
    ///
    /// Checks that every link and connection element type and every union clause names a type
    /// inside the schema, that union clauses are object types and that every object type
    /// declares exactly one id field.
    pub fn new(schema: &Schema) -> Result<Self, SchemaError> {
        let mut objects = IndexMap::new();
        let mut unions = IndexMap::new();

        for (typename, spec) in schema.types() {
            match spec {
                TypeSpec::Object { fields } => {
                    objects.insert(typename.clone(), Self::decompose_object(typename, fields)?);
                }
                TypeSpec::Union { clauses } => {
                    unions.insert(
                        typename.clone(),
                        UnionIndex {
                            clauses: clauses.clone(),
                        },
                    );
                }
            }
        }

        let index = Self { objects, unions };
        index.validate(schema)?;

        Ok(index)
    }

    fn decompose_object(
        typename: &str,
        fields: &IndexMap<String, FieldKind>,
    ) -> Result<ObjectIndex, SchemaError> {
        let mut id_field_name: Option<String> = None;
        let mut primitive_field_names = Vec::new();
        let mut link_field_names = Vec::new();
        let mut connection_field_names = Vec::new();

        for (fieldname, kind) in fields {
            match kind {
                FieldKind::Id => match &id_field_name {
                    None => id_field_name = Some(fieldname.clone()),
                    Some(first) => {
                        return Err(SchemaError::MultipleIdFields {
                            typename: typename.to_string(),
                            first: first.clone(),
                            second: fieldname.clone(),
                        })
                    }
                },
                FieldKind::Primitive => primitive_field_names.push(fieldname.clone()),
                FieldKind::Node { .. } => link_field_names.push(fieldname.clone()),
                FieldKind::Connection { .. } => connection_field_names.push(fieldname.clone()),
            }
        }

        let id_field_name =
            id_field_name.ok_or_else(|| SchemaError::NoIdField(typename.to_string()))?;

        Ok(ObjectIndex {
            fields: fields.clone(),
            id_field_name,
            primitive_field_names,
            link_field_names,
            connection_field_names,
        })
    }

    /// Checks the closed-universe properties which span multiple types.
    fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        for (typename, object) in &self.objects {
            for (fieldname, kind) in object.fields() {
                let element_type = match kind {
                    FieldKind::Node { element_type } => element_type,
                    FieldKind::Connection { element_type } => element_type,
                    _ => continue,
                };

                if !schema.types().contains_key(element_type) {
                    return Err(SchemaError::UnknownElementType {
                        typename: typename.clone(),
                        fieldname: fieldname.clone(),
                        element_type: element_type.clone(),
                    });
                }
            }
        }

        for (union_typename, union) in &self.unions {
            for clause in union.clauses() {
                if !schema.types().contains_key(clause) {
                    return Err(SchemaError::UnknownClause {
                        union_typename: union_typename.clone(),
                        clause: clause.clone(),
                    });
                }

                if !self.objects.contains_key(clause) {
                    return Err(SchemaError::ClauseNotObject {
                        union_typename: union_typename.clone(),
                        clause: clause.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Returns all object types in declaration order.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &ObjectIndex)> {
        self.objects.iter().map(|(name, index)| (name.as_str(), index))
    }

    /// Looks up any type by name, raising `UnknownType` on absence.
    pub fn type_index(&self, typename: &str) -> Result<TypeIndex, MirrorError> {
        if let Some(object) = self.objects.get(typename) {
            return Ok(TypeIndex::Object(object));
        }

        if let Some(union) = self.unions.get(typename) {
            return Ok(TypeIndex::Union(union));
        }

        Err(MirrorError::UnknownType(typename.to_string()))
    }

    /// Looks up an object type by name.
    ///
    /// Raises `UnknownType` when the typename is absent from the schema and `NonObjectType`
    /// when it resolves to a union.
    pub fn object(&self, typename: &str) -> Result<&ObjectIndex, MirrorError> {
        match self.type_index(typename)? {
            TypeIndex::Object(object) => Ok(object),
            TypeIndex::Union(_) => Err(MirrorError::NonObjectType(typename.to_string())),
        }
    }

    /// Resolves the element type of a connection field on an object type.
    ///
    /// Raises `UnknownField` when the field is absent and `NotAConnection` when it exists with
    /// a different kind.
    pub fn connection_element_type(
        &self,
        typename: &str,
        fieldname: &str,
    ) -> Result<&str, MirrorError> {
        let object = self.object(typename)?;

        match object.fields().get(fieldname) {
            None => Err(MirrorError::UnknownField {
                typename: typename.to_string(),
                fieldname: fieldname.to_string(),
            }),
            Some(FieldKind::Connection { element_type }) => Ok(element_type),
            Some(_) => Err(MirrorError::NotAConnection {
                typename: typename.to_string(),
                fieldname: fieldname.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaIndex;
    use crate::errors::{MirrorError, SchemaError};
    use crate::test_utils::repo_schema;
    use crate::Schema;

    #[test]
    fn decomposes_field_sequences() {
        let index = SchemaIndex::new(&repo_schema()).unwrap();

        let issue = index.object("Issue").unwrap();
        assert_eq!(issue.id_field_name(), "id");
        assert_eq!(issue.primitive_field_names(), ["title"]);
        assert_eq!(issue.link_field_names(), ["author"]);
        assert_eq!(issue.connection_field_names(), Vec::<String>::new());

        let repo = index.object("Repo").unwrap();
        assert_eq!(repo.primitive_field_names(), ["name"]);
        assert_eq!(repo.connection_field_names(), ["issues"]);

        // The id field appears in the field map but in none of the three sequences.
        assert!(repo.fields().contains_key("id"));
        assert!(!repo.primitive_field_names().contains(&"id".to_string()));
    }

    #[test]
    fn looks_up_unions() {
        let index = SchemaIndex::new(&repo_schema()).unwrap();

        assert!(matches!(
            index.object("Actor"),
            Err(MirrorError::NonObjectType(_))
        ));
        assert!(matches!(
            index.object("Missing"),
            Err(MirrorError::UnknownType(_))
        ));
    }

    #[test]
    fn resolves_connection_element_types() {
        let index = SchemaIndex::new(&repo_schema()).unwrap();

        assert_eq!(
            index.connection_element_type("Repo", "issues").unwrap(),
            "Issue"
        );
        assert!(matches!(
            index.connection_element_type("Repo", "stars"),
            Err(MirrorError::UnknownField { .. })
        ));
        assert!(matches!(
            index.connection_element_type("Repo", "name"),
            Err(MirrorError::NotAConnection { .. })
        ));
    }

    #[test]
    fn rejects_undefined_element_type() {
        let schema = Schema::from_json(
            r#"{
                "Repo": {
                    "OBJECT": {
                        "fields": {
                            "id": "ID",
                            "issues": { "CONNECTION": { "elementType": "Issue" } }
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        assert!(matches!(
            SchemaIndex::new(&schema),
            Err(SchemaError::UnknownElementType { .. })
        ));
    }

    #[test]
    fn rejects_union_of_unions() {
        let schema = Schema::from_json(
            r#"{
                "User": { "OBJECT": { "fields": { "id": "ID" } } },
                "Inner": { "UNION": { "clauses": ["User"] } },
                "Outer": { "UNION": { "clauses": ["Inner"] } }
            }"#,
        )
        .unwrap();

        assert!(matches!(
            SchemaIndex::new(&schema),
            Err(SchemaError::ClauseNotObject { .. })
        ));
    }

    #[test]
    fn rejects_missing_or_duplicate_id_fields() {
        let no_id = Schema::from_json(
            r#"{ "Repo": { "OBJECT": { "fields": { "name": "PRIMITIVE" } } } }"#,
        )
        .unwrap();
        assert!(matches!(
            SchemaIndex::new(&no_id),
            Err(SchemaError::NoIdField(_))
        ));

        let two_ids = Schema::from_json(
            r#"{ "Repo": { "OBJECT": { "fields": { "id": "ID", "alt": "ID" } } } }"#,
        )
        .unwrap();
        assert!(matches!(
            SchemaIndex::new(&two_ids),
            Err(SchemaError::MultipleIdFields { .. })
        ));
    }
}
