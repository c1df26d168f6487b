//! Schema description: an ordered tree of named fields.
//!
//! The host document framework owns the real schema. [`FieldTree`] is the
//! explicit traversal surface the level registry and path expansion need:
//! field kinds, declaration order, and optional per-field `level` rules.

use serde_json::{Map, Value};

use crate::{ProjectionError, MAX_FIELD_DEPTH};

/// Shape of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Leaf value of the named type (`"String"`, `"ObjectId"`, ...). Opaque.
    Scalar(String),
    /// Nested object whose fields are part of the same document.
    Nested(FieldTree),
    /// Array of the element kind. `Array(Nested(..))` is an array of subdocuments.
    Array(Box<FieldKind>),
}

impl FieldKind {
    fn to_value(&self) -> Value {
        match self {
            Self::Scalar(ty) => Value::String(ty.clone()),
            Self::Nested(tree) => tree.to_value(),
            Self::Array(element) => Value::Array(vec![element.to_value()]),
        }
    }
}

/// A field declaration: its kind plus an optional `level` selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    /// The field's shape.
    pub kind: FieldKind,
    /// Per-field level rule, e.g. `"internal"` or `"-public -private"`.
    pub level: Option<String>,
}

impl FieldNode {
    /// A scalar field of the given type name.
    #[must_use]
    pub fn scalar(ty: impl Into<String>) -> Self {
        Self::of(FieldKind::Scalar(ty.into()))
    }

    /// A nested object field.
    #[must_use]
    pub fn nested(tree: FieldTree) -> Self {
        Self::of(FieldKind::Nested(tree))
    }

    /// An array field of the given element kind.
    #[must_use]
    pub fn array(element: FieldKind) -> Self {
        Self::of(FieldKind::Array(Box::new(element)))
    }

    /// Attach a per-field level rule (builder pattern).
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    fn of(kind: FieldKind) -> Self {
        Self { kind, level: None }
    }
}

/// Ordered mapping of field name to [`FieldNode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTree {
    fields: Vec<(String, FieldNode)>,
}

impl FieldTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder pattern). A repeated name replaces the earlier declaration.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, node: FieldNode) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = node,
            None => self.fields.push((name, node)),
        }
        self
    }

    /// Look up a direct child by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, node)| node)
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the tree declares no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every schema path in declaration order, dotted.
    ///
    /// Scalars and arrays are paths. Nested objects are descended into and
    /// only reported themselves when they carry a `level` rule. Subdocument
    /// array elements are not descended into: their fields belong to the
    /// element schema.
    #[must_use]
    pub fn each_path(&self) -> Vec<(String, &FieldNode)> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a FieldNode)>) {
        for (name, node) in &self.fields {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match &node.kind {
                FieldKind::Nested(tree) => {
                    if node.level.is_some() {
                        out.push((path.clone(), node));
                    }
                    tree.collect_paths(&path, out);
                }
                _ => out.push((path, node)),
            }
        }
    }

    /// Resolve a dotted path to its field kind.
    ///
    /// Walks nested objects and the element schema of subdocument arrays.
    #[must_use]
    pub fn path_kind(&self, path: &str) -> Option<&FieldKind> {
        let mut tree = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let kind = &tree.get(segment)?.kind;
            if segments.peek().is_none() {
                return Some(kind);
            }
            tree = match kind {
                FieldKind::Nested(sub) => sub,
                FieldKind::Array(element) => match element.as_ref() {
                    FieldKind::Nested(sub) => sub,
                    _ => return None,
                },
                FieldKind::Scalar(_) => return None,
            };
        }
        None
    }

    /// The schema's own metadata as a document: types as strings, arrays as a
    /// one-element array holding the element shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, node)| (name.clone(), node.kind.to_value()))
            .collect();
        Value::Object(map)
    }

    /// Read a field tree from a document.
    ///
    /// | Value | Meaning |
    /// |-------|---------|
    /// | `"String"` | scalar of that type |
    /// | `{ type: "String", level: ".." }` | scalar with options |
    /// | `{ type: [<elem>], level: ".." }` | array field with options |
    /// | `{ type: {..}, level: ".." }` | nested object with options |
    /// | `[<elem>]` | array of the element shape |
    /// | any other mapping | nested object |
    ///
    /// # Errors
    ///
    /// - [`ProjectionError::InvalidConfig`] — a value matches no row above
    /// - [`ProjectionError::DepthExceeded`] — nesting exceeds [`MAX_FIELD_DEPTH`]
    pub fn from_value(value: &Value) -> Result<Self, ProjectionError> {
        match value {
            Value::Object(map) => Self::from_map(map, 1),
            other => Err(invalid(format!(
                "field tree must be a mapping, got {}",
                type_name(other)
            ))),
        }
    }

    fn from_map(map: &Map<String, Value>, depth: usize) -> Result<Self, ProjectionError> {
        if depth > MAX_FIELD_DEPTH {
            return Err(ProjectionError::DepthExceeded {
                depth,
                max: MAX_FIELD_DEPTH,
            });
        }
        let fields = map
            .iter()
            .map(|(name, value)| {
                let node = parse_node(value, depth).map_err(|e| match e {
                    ProjectionError::InvalidConfig { reason } => invalid(format!("{name}: {reason}")),
                    other => other,
                })?;
                Ok((name.clone(), node))
            })
            .collect::<Result<Vec<_>, ProjectionError>>()?;
        Ok(Self { fields })
    }
}

fn parse_node(value: &Value, depth: usize) -> Result<FieldNode, ProjectionError> {
    match value {
        Value::Object(map) => match map.get("type") {
            Some(ty) => {
                let kind = parse_kind(ty, depth)?;
                let level = match map.get("level") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(level)) => Some(level.clone()),
                    Some(other) => {
                        return Err(invalid(format!(
                            "level must be a selector string, got {}",
                            type_name(other)
                        )))
                    }
                };
                Ok(FieldNode { kind, level })
            }
            None => Ok(FieldNode::nested(FieldTree::from_map(map, depth + 1)?)),
        },
        other => Ok(FieldNode::of(parse_kind(other, depth)?)),
    }
}

fn parse_kind(value: &Value, depth: usize) -> Result<FieldKind, ProjectionError> {
    match value {
        Value::String(ty) => Ok(FieldKind::Scalar(ty.clone())),
        Value::Array(items) => match items.as_slice() {
            [] => Ok(FieldKind::Array(Box::new(FieldKind::Scalar("Mixed".into())))),
            [element] => {
                if depth >= MAX_FIELD_DEPTH {
                    return Err(ProjectionError::DepthExceeded {
                        depth: depth + 1,
                        max: MAX_FIELD_DEPTH,
                    });
                }
                let element = match element {
                    Value::Object(map) if !map.contains_key("type") => {
                        FieldKind::Nested(FieldTree::from_map(map, depth + 1)?)
                    }
                    other => parse_node(other, depth + 1)?.kind,
                };
                Ok(FieldKind::Array(Box::new(element)))
            }
            _ => Err(invalid(format!(
                "array field must declare exactly one element shape, got {}",
                items.len()
            ))),
        },
        Value::Object(map) => Ok(FieldKind::Nested(FieldTree::from_map(map, depth + 1)?)),
        other => Err(invalid(format!(
            "field type must be a string, list or mapping, got {}",
            type_name(other)
        ))),
    }
}

fn invalid(reason: String) -> ProjectionError {
    ProjectionError::InvalidConfig { reason }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
