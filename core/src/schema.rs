//! Schema facade: one document type's field tree, frozen levels and hook.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    ArrayPolicy, CallOptions, FieldKind, FieldTree, LevelRegistry, LevelRegistryBuilder,
    LevelSpec, LevelTransform, ProjectionError, Transform,
};

/// Builder for constructing a [`Schema`].
///
/// Declare levels, the default level and any prior transform, then call
/// [`build()`](Self::build). Configuration errors surface there, once.
pub struct SchemaBuilder<D> {
    fields: FieldTree,
    levels: LevelRegistryBuilder,
    default_level: Option<LevelSpec<D>>,
    array_policy: ArrayPolicy,
    prior: Option<Box<dyn Transform<D>>>,
}

impl<D> SchemaBuilder<D> {
    /// Start a schema over a field tree.
    #[must_use]
    pub fn new(fields: FieldTree) -> Self {
        Self {
            fields,
            levels: LevelRegistryBuilder::new(),
            default_level: None,
            array_policy: ArrayPolicy::default(),
            prior: None,
        }
    }

    /// Declare a level from a selector string.
    #[must_use]
    pub fn level(mut self, name: impl Into<String>, selector: &str) -> Self {
        self.levels = self.levels.level(name, selector);
        self
    }

    /// Set the level used when a call names none: a name or a resolver.
    #[must_use]
    pub fn default_level(mut self, level: impl Into<LevelSpec<D>>) -> Self {
        self.default_level = Some(level.into());
        self
    }

    /// Set a resolver as the default level.
    #[must_use]
    pub fn default_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&D>, &Value, &CallOptions<D>) -> Option<String> + Send + Sync + 'static,
    {
        self.default_level = Some(LevelSpec::resolver(f));
        self
    }

    /// Set how minimizing treats arrays.
    #[must_use]
    pub fn array_policy(mut self, policy: ArrayPolicy) -> Self {
        self.array_policy = policy;
        self
    }

    /// Compose with an existing serialization transform. It runs before level
    /// projection and its output is what gets projected.
    #[must_use]
    pub fn pre_transform(mut self, prior: impl Transform<D> + 'static) -> Self {
        self.prior = Some(Box::new(prior));
        self
    }

    /// Build the level registry and freeze the schema.
    ///
    /// # Errors
    ///
    /// - [`ProjectionError::MixedLevelRule`] — a field rule both includes and excludes
    /// - [`ProjectionError::UndeclaredLevel`] — a field rule includes an undeclared level
    pub fn build(self) -> Result<Schema<D>, ProjectionError> {
        let registry = Arc::new(self.levels.build(&self.fields)?);
        let transform = LevelTransform::new(
            Arc::clone(&registry),
            self.default_level,
            self.array_policy,
            self.prior,
        );
        Ok(Schema {
            fields: self.fields,
            registry,
            transform,
        })
    }
}

/// A document type's projection surface.
///
/// Owns its frozen [`LevelRegistry`]. Every operation is a pure function of
/// the registry and its arguments, so a schema can be shared across threads.
pub struct Schema<D> {
    fields: FieldTree,
    registry: Arc<LevelRegistry>,
    transform: LevelTransform<D>,
}

impl<D> Schema<D> {
    /// The schema's field tree.
    #[must_use]
    pub fn fields(&self) -> &FieldTree {
        &self.fields
    }

    /// The frozen level registry.
    #[must_use]
    pub fn registry(&self) -> &LevelRegistry {
        &self.registry
    }

    /// The serialization hook, for hosts that register it themselves.
    #[must_use]
    pub fn transform(&self) -> &LevelTransform<D> {
        &self.transform
    }

    /// Serialization hook path: run the prior transform (if any) on `working`,
    /// then project it at the resolved level.
    ///
    /// # Errors
    ///
    /// Level resolution errors, or whatever the prior transform returns.
    pub fn to_object(
        &self,
        doc: &D,
        working: Value,
        options: &CallOptions<D>,
    ) -> Result<Value, ProjectionError> {
        self.transform.transform(doc, working, options)
    }

    /// Project a plain object directly. No prior transform runs and resolvers
    /// receive no document handle. The caller's object is not modified.
    ///
    /// # Errors
    ///
    /// Level resolution errors.
    pub fn project_object(
        &self,
        object: &Value,
        options: &CallOptions<D>,
    ) -> Result<Option<Value>, ProjectionError> {
        self.transform.project(None, object.clone(), options)
    }

    /// The schema's own field metadata as seen at `level`, minimized.
    ///
    /// ```
    /// use serde_json::json;
    /// use veil::prelude::*;
    ///
    /// let schema: Schema<()> = SchemaBuilder::new(
    ///     FieldTree::new()
    ///         .field("username", FieldNode::scalar("String"))
    ///         .field("password", FieldNode::scalar("String")),
    /// )
    /// .level("public", "username")
    /// .build()
    /// .unwrap();
    ///
    /// assert_eq!(
    ///     schema.level_schema_tree("public").unwrap(),
    ///     Some(json!({ "username": "String" }))
    /// );
    /// ```
    ///
    /// # Errors
    ///
    /// [`ProjectionError::UnknownLevel`] if the level is not registered.
    pub fn level_schema_tree(&self, level: &str) -> Result<Option<Value>, ProjectionError> {
        let options = CallOptions::new().with_level(level).with_minimize(true);
        self.transform.project(None, self.fields.to_value(), &options)
    }

    /// Fill in the schema defaults for options a caller assembled.
    ///
    /// Only the level has a default; an empty level name is replaced by it.
    /// Everything else, `extra` included, is kept.
    #[must_use]
    pub fn extend_options(&self, mut options: CallOptions<D>) -> CallOptions<D> {
        if options.level.as_ref().map_or(true, LevelSpec::is_blank) {
            options.level = self.transform.default_level().cloned();
        }
        options
    }

    /// Build a document holding `value` at a dotted path, shaped by the
    /// field tree.
    ///
    /// Nested fields become objects. An array field followed by a numeric
    /// segment becomes an array with `value` (or the rest of the path) at that
    /// index, earlier slots `null`. A single-segment path is always set. A
    /// longer path that does not walk through the schema yields an empty object.
    ///
    /// ```
    /// use serde_json::json;
    /// use veil::prelude::*;
    ///
    /// let schema: Schema<()> = SchemaBuilder::new(
    ///     FieldTree::new().field(
    ///         "notes",
    ///         FieldNode::nested(FieldTree::new().field("title", FieldNode::scalar("String"))),
    ///     ),
    /// )
    /// .build()
    /// .unwrap();
    ///
    /// assert_eq!(
    ///     schema.expand_path("notes.title", json!("hi")),
    ///     json!({ "notes": { "title": "hi" } })
    /// );
    /// ```
    #[must_use]
    pub fn expand_path(&self, path: &str, value: Value) -> Value {
        let segments: Vec<&str> = path.split('.').collect();
        expand(Some(&self.fields), &segments, value).unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Project a write: expand `path = value` into a document and filter it
    /// through the same levels as reads.
    ///
    /// # Errors
    ///
    /// Level resolution errors.
    pub fn project_update(
        &self,
        path: &str,
        value: Value,
        options: &CallOptions<D>,
    ) -> Result<Option<Value>, ProjectionError> {
        let update = self.expand_path(path, value);
        self.transform.project(None, update, options)
    }
}

fn expand(tree: Option<&FieldTree>, segments: &[&str], value: Value) -> Option<Value> {
    let (head, rest) = segments.split_first()?;
    if rest.is_empty() {
        return Some(singleton(head, value));
    }

    let child = match &tree?.get(head)?.kind {
        FieldKind::Nested(sub) => expand(Some(sub), rest, value)?,
        FieldKind::Array(element) => {
            let (index, rest) = rest.split_first()?;
            let index: usize = index.parse().ok()?;
            let slot = if rest.is_empty() {
                value
            } else {
                match element.as_ref() {
                    FieldKind::Nested(sub) => expand(Some(sub), rest, value)?,
                    _ => return None,
                }
            };
            let mut items = vec![Value::Null; index];
            items.push(slot);
            Value::Array(items)
        }
        FieldKind::Scalar(_) => return None,
    };
    Some(singleton(head, child))
}

fn singleton(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_owned(), value);
    Value::Object(map)
}

impl<D> fmt::Debug for Schema<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .field("registry", &self.registry)
            .field("transform", &self.transform)
            .finish()
    }
}
