//! veil-test: Test domain for conformance testing
//!
//! Provides a user document type and the schema it is projected with, shared
//! by unit tests, property tests, benchmarks and the YAML fixture runner.
//!
//! # Example
//!
//! ```
//! use veil_test::prelude::*;
//!
//! let schema = user_schema().build().unwrap();
//! let john = User::john();
//!
//! let public = john.to_object(&schema, &CallOptions::new()).unwrap();
//! assert_eq!(public, serde_json::json!({ "username": "John" }));
//! ```

use serde_json::{json, Value};
use veil::prelude::*;


/// A persisted user: an identifier plus its materialized field values.
///
/// Plays the document handle passed to level resolvers and prior transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Document identifier, also present as `_id` in [`data`](Self::data).
    pub id: String,
    /// Materialized object graph.
    pub data: Value,
}

impl User {
    /// Create a user from its id and field values. `_id` is set from `id`.
    #[must_use]
    pub fn new(id: impl Into<String>, mut data: Value) -> Self {
        let id = id.into();
        if let Value::Object(map) = &mut data {
            map.insert("_id".to_owned(), Value::String(id.clone()));
        }
        Self { id, data }
    }

    /// John, with a friend reference, per-field-rule fields and empty notes.
    #[must_use]
    pub fn john() -> Self {
        Self::new(
            "u1",
            json!({
                "username": "John",
                "name": "John Jhonsson",
                "password": "123456",
                "email": "private@email.com",
                "friend": "u2",
                "systemField": "sys",
                "groups": "admin user",
                "notes": {},
                "deep": { "c": [] }
            }),
        )
    }

    /// A user with a populated `deep` subtree, including a subdocument array.
    #[must_use]
    pub fn deep() -> Self {
        Self::new(
            "u3",
            json!({
                "username": "John",
                "name": "John Jhonsson",
                "password": "123456",
                "email": "private@email.com",
                "deep": {
                    "a": "a var",
                    "b": "b var",
                    "c": [
                        { "a": "c.a var 0", "b": "c.b var 0" },
                        { "a": "c.a var 1", "b": "c.b var 1" }
                    ]
                }
            }),
        )
    }

    /// Serialize through a schema's hook: the working object is a copy of
    /// [`data`](Self::data).
    ///
    /// # Errors
    ///
    /// Whatever the schema's hook returns.
    pub fn to_object(
        &self,
        schema: &Schema<User>,
        options: &CallOptions<User>,
    ) -> Result<Value, ProjectionError> {
        schema.to_object(self, self.data.clone(), options)
    }
}

/// The user field tree.
///
/// `systemField` is hidden on `public`, `private` and `newLevel`. `groups`
/// is visible on `internal` only.
#[must_use]
pub fn user_fields() -> FieldTree {
    let string = || FieldNode::scalar("String");
    FieldTree::new()
        .field("_id", FieldNode::scalar("ObjectId"))
        .field("username", string())
        .field("name", string())
        .field("password", string())
        .field("email", string())
        .field(
            "deep",
            FieldNode::nested(
                FieldTree::new()
                    .field("a", string())
                    .field("b", string())
                    .field(
                        "c",
                        FieldNode::array(FieldKind::Nested(
                            FieldTree::new().field("a", string()).field("b", string()),
                        )),
                    ),
            ),
        )
        .field(
            "notes",
            FieldNode::nested(
                FieldTree::new()
                    .field("title", string())
                    .field("content", string()),
            ),
        )
        .field("friend", FieldNode::scalar("ObjectId"))
        .field(
            "systemField",
            string().with_level("-public -private -newLevel"),
        )
        .field("groups", string().with_level("internal"))
}

/// The user schema: `public` by default, with `private`, `system` and
/// `internal` declared.
#[must_use]
pub fn user_schema() -> SchemaBuilder<User> {
    SchemaBuilder::new(user_fields())
        .level("public", "username -password -_id -deep otherTransform -friend")
        .level("private", "-password -_id")
        .level("system", "")
        .level("internal", "")
        .default_level("public")
}

/// Prior transform that marks the working object, as a host's own
/// serialization transform would.
///
/// # Errors
///
/// Never fails.
pub fn mark_other_transform(
    _doc: &User,
    mut ret: Value,
    _options: &CallOptions<User>,
) -> Result<Value, ProjectionError> {
    if let Value::Object(map) = &mut ret {
        map.insert("otherTransform".to_owned(), Value::Bool(true));
    }
    Ok(ret)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{mark_other_transform, user_fields, user_schema, User};
    pub use veil::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema<User> {
        user_schema().build().unwrap()
    }

    fn level(name: &str) -> CallOptions<User> {
        CallOptions::new().with_level(name).with_minimize(true)
    }

    #[test]
    fn test_user_sets_id_field() {
        let john = User::john();
        assert_eq!(john.data["_id"], json!("u1"));
    }

    #[test]
    fn test_respects_existing_transform() {
        let schema = user_schema()
            .pre_transform(mark_other_transform)
            .build()
            .unwrap();
        let data = User::john().to_object(&schema, &CallOptions::new()).unwrap();
        assert_eq!(data, json!({ "username": "John", "otherTransform": true }));
    }

    #[test]
    fn test_level_resolver_selects_level() {
        let options = CallOptions::<User>::new()
            .with_extra("user", json!("u1"))
            .with_resolver(|doc: Option<&User>, _, options| {
                let viewer = options.extra.get("user")?.as_str()?;
                Some(if doc?.id == viewer { "private" } else { "public" }.to_owned())
            });

        let data = User::john().to_object(&schema(), &options).unwrap();
        assert_eq!(
            data,
            json!({
                "username": "John",
                "name": "John Jhonsson",
                "email": "private@email.com",
                "friend": "u2",
                "notes": {},
                "deep": { "c": [] }
            })
        );

        let stranger = User::new("u9", json!({ "username": "Doe", "name": "D" }));
        let data = stranger.to_object(&schema(), &options).unwrap();
        assert_eq!(data, json!({ "username": "Doe" }));
    }

    #[test]
    fn test_public_by_default() {
        let data = User::john().to_object(&schema(), &CallOptions::new()).unwrap();
        assert_eq!(data, json!({ "username": "John" }));
    }

    #[test]
    fn test_minimize_toggle() {
        let options = CallOptions::new().with_level("internal");
        let data = User::john().to_object(&schema(), &options).unwrap();
        assert!(data.get("notes").is_some());

        let data = User::john()
            .to_object(&schema(), &options.with_minimize(true))
            .unwrap();
        assert!(data.get("notes").is_none());
    }

    #[test]
    fn test_private() {
        let data = User::john().to_object(&schema(), &level("private")).unwrap();
        assert_eq!(
            data,
            json!({
                "username": "John",
                "name": "John Jhonsson",
                "email": "private@email.com",
                "friend": "u2",
                "deep": { "c": [] }
            })
        );
    }

    #[test]
    fn test_system() {
        let data = User::john().to_object(&schema(), &level("system")).unwrap();
        assert_eq!(
            data,
            json!({
                "_id": "u1",
                "username": "John",
                "name": "John Jhonsson",
                "password": "123456",
                "email": "private@email.com",
                "friend": "u2",
                "systemField": "sys",
                "deep": { "c": [] }
            })
        );
    }

    #[test]
    fn test_modified_private() {
        let options = level("private").with_projection("-username -friend -deep");
        let data = User::john().to_object(&schema(), &options).unwrap();
        assert_eq!(
            data,
            json!({ "name": "John Jhonsson", "email": "private@email.com" })
        );
    }

    #[test]
    fn test_public_never_includes_password() {
        let options = level("public").with_projection("password");
        let data = User::john().to_object(&schema(), &options).unwrap();
        assert_eq!(data, json!({ "username": "John" }));
    }

    #[test]
    fn test_projection_only() {
        let options = CallOptions::new().with_projection("username");
        let data = User::john().to_object(&schema(), &options).unwrap();
        assert_eq!(data, json!({ "username": "John" }));
    }

    #[test]
    fn test_field_rules() {
        let john = User::john();
        let s = schema();

        let public = john.to_object(&s, &CallOptions::new()).unwrap();
        assert!(public.get("systemField").is_none());
        assert!(public.get("groups").is_none());

        let system = john.to_object(&s, &level("system")).unwrap();
        assert!(system.get("systemField").is_some());
        assert!(system.get("groups").is_none());

        let internal = john.to_object(&s, &level("internal")).unwrap();
        assert!(internal.get("groups").is_some());
        assert!(internal.get("systemField").is_some());

        let created = john.to_object(&s, &level("newLevel")).unwrap();
        assert!(created.get("systemField").is_none());
        assert!(created.get("groups").is_some());
    }

    #[test]
    fn test_deep_private() {
        let data = User::deep().to_object(&schema(), &level("private")).unwrap();
        let mut expected = User::deep().data;
        let map = expected.as_object_mut().unwrap();
        map.shift_remove("_id");
        map.shift_remove("password");
        assert_eq!(data, expected);
    }

    #[test]
    fn test_deep_excluded() {
        let options = level("private").with_projection("-deep");
        let data = User::deep().to_object(&schema(), &options).unwrap();
        assert_eq!(
            data,
            json!({
                "username": "John",
                "name": "John Jhonsson",
                "email": "private@email.com"
            })
        );
    }

    #[test]
    fn test_deep_array_member_excluded() {
        let options = level("private").with_projection("-deep.c.a");
        let data = User::deep().to_object(&schema(), &options).unwrap();
        assert_eq!(
            data,
            json!({
                "username": "John",
                "name": "John Jhonsson",
                "email": "private@email.com",
                "deep": {
                    "a": "a var",
                    "b": "b var",
                    "c": [{ "b": "c.b var 0" }, { "b": "c.b var 1" }]
                }
            })
        );
    }

    #[test]
    fn test_level_schema_tree() {
        assert_eq!(
            schema().level_schema_tree("public").unwrap(),
            Some(json!({ "username": "String" }))
        );
    }

    #[test]
    fn test_extend_options() {
        let options = schema().extend_options(CallOptions::new().with_extra("name", json!("Doe")));
        assert_eq!(options.extra["name"], json!("Doe"));
        assert_eq!(
            options.level.as_ref().and_then(LevelSpec::as_name),
            Some("public")
        );
    }

    #[test]
    fn test_schema_errors() {
        let err = SchemaBuilder::<User>::new(
            FieldTree::new().field("field", FieldNode::scalar("String").with_level("public")),
        )
        .build()
        .unwrap_err();
        assert!(matches!(err, ProjectionError::UndeclaredLevel { .. }));

        let err = SchemaBuilder::<User>::new(
            FieldTree::new().field("field", FieldNode::scalar("String").with_level("public -private")),
        )
        .level("public", "")
        .level("private", "")
        .build()
        .unwrap_err();
        assert!(matches!(err, ProjectionError::MixedLevelRule { .. }));
    }
}
