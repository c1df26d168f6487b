//! Serde config for schema construction.
//!
//! ```yaml
//! levels:
//!   public: "username -password"
//!   private: "-password"
//! level: public
//! array_policy: opaque
//! fields:
//!   username: String
//!   password: String
//!   deep:
//!     a: String
//!     c: [{ a: String, b: String }]
//!   groups: { type: String, level: internal }
//! ```
//!
//! | Config key | Runtime counterpart |
//! |------------|--------------------|
//! | `levels` | [`SchemaBuilder::level`] per entry |
//! | `level` | [`SchemaBuilder::default_level`] |
//! | `array_policy` | [`SchemaBuilder::array_policy`] |
//! | `fields` | [`FieldTree::from_value`] |

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{ArrayPolicy, FieldTree, ProjectionError, Schema, SchemaBuilder};

/// Deserializable schema configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Declared levels: name to selector string.
    #[serde(default)]
    pub levels: BTreeMap<String, String>,

    /// Default level name.
    #[serde(default)]
    pub level: Option<String>,

    /// How minimizing treats arrays.
    #[serde(default)]
    pub array_policy: ArrayPolicy,

    /// The field tree, in the grammar of [`FieldTree::from_value`].
    #[serde(default = "empty_fields")]
    pub fields: serde_json::Value,
}

fn empty_fields() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl SchemaConfig {
    /// Turn the config into a builder, for adding resolvers or a prior transform.
    ///
    /// # Errors
    ///
    /// Field tree errors: [`ProjectionError::InvalidConfig`], [`ProjectionError::DepthExceeded`].
    pub fn into_builder<D>(self) -> Result<SchemaBuilder<D>, ProjectionError> {
        let fields = FieldTree::from_value(&self.fields)?;
        let mut builder = SchemaBuilder::new(fields).array_policy(self.array_policy);
        for (name, selector) in &self.levels {
            builder = builder.level(name.as_str(), selector);
        }
        if let Some(level) = self.level {
            builder = builder.default_level(level);
        }
        Ok(builder)
    }

    /// Build the schema.
    ///
    /// # Errors
    ///
    /// Any configuration error from [`into_builder`](Self::into_builder) or
    /// [`SchemaBuilder::build`].
    pub fn build<D>(self) -> Result<Schema<D>, ProjectionError> {
        self.into_builder()?.build()
    }

    /// Parse a config from JSON.
    ///
    /// # Errors
    ///
    /// [`ProjectionError::InvalidConfig`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, ProjectionError> {
        serde_json::from_str(json).map_err(|e| ProjectionError::InvalidConfig {
            reason: e.to_string(),
        })
    }
}
