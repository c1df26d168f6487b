//! veil - level-based field visibility for nested documents
//!
//! Projects a document (a [`serde_json::Value`] tree of objects, arrays and
//! scalars) down to the fields a given *level* (role) is allowed to see.
//!
//! # Architecture
//!
//! - [`Selector`] — Compiled `include`/`exclude` dotted-path lists, parsed from
//!   strings like `"username -password"`
//! - [`FieldTree`] — Explicit description of a document schema, with optional
//!   per-field `level` rules
//! - [`LevelRegistry`] — Named level presets, frozen after [`LevelRegistryBuilder::build`]
//! - [`project()`] — Inclusion then exclusion over an owned working document
//! - [`minimize()`] — Optional pruning of emptied objects
//! - [`Transform`] / [`LevelTransform`] — Serialization hook adapter, chained
//!   with an optional prior transform by composition
//! - [`Schema`] — Facade tying the above together for one document type
//!
//! # Key Design Insights
//!
//! 1. **Inclusion is a strict filter**: when any include path is present, the
//!    output starts empty and only reachable include paths are copied.
//!
//! 2. **Exclusion always wins**: excludes run after inclusion and delete
//!    unconditionally, so a per-call include never restores a field a level hides.
//!
//! 3. **Registry is immutable after build**: per-field rules are cross-injected
//!    once, at schema construction. Projection calls only read it.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use veil::prelude::*;
//!
//! let fields = FieldTree::new()
//!     .field("username", FieldNode::scalar("String"))
//!     .field("password", FieldNode::scalar("String"))
//!     .field("email", FieldNode::scalar("String"));
//!
//! let schema: Schema<()> = SchemaBuilder::new(fields)
//!     .level("public", "username -password")
//!     .level("private", "-password")
//!     .default_level("public")
//!     .build()
//!     .unwrap();
//!
//! let doc = json!({ "username": "John", "password": "x", "email": "e" });
//!
//! let public = schema.to_object(&(), doc.clone(), &CallOptions::new()).unwrap();
//! assert_eq!(public, json!({ "username": "John" }));
//!
//! let private = schema
//!     .to_object(&(), doc, &CallOptions::new().with_level("private"))
//!     .unwrap();
//! assert_eq!(private, json!({ "username": "John", "email": "e" }));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod field_tree;
mod level;
mod minimize;
mod project;
mod schema;
mod selector;
mod transform;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use field_tree::{FieldKind, FieldNode, FieldTree};
pub use level::{LevelRegistry, LevelRegistryBuilder};
pub use minimize::{minimize, minimize_value, ArrayPolicy};
pub use project::project;
pub use schema::{Schema, SchemaBuilder};
pub use selector::Selector;
pub use transform::{CallOptions, LevelResolver, LevelSpec, LevelTransform, Transform};

#[cfg(feature = "config")]
pub use config::SchemaConfig;

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use veil::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Projection
        project,
        // Schema description
        ArrayPolicy,
        CallOptions,
        FieldKind,
        FieldNode,
        FieldTree,
        // Levels
        LevelRegistry,
        LevelRegistryBuilder,
        LevelSpec,
        LevelTransform,
        // Errors
        ProjectionError,
        Schema,
        SchemaBuilder,
        Selector,
        Transform,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth accepted when reading a [`FieldTree`] from configuration.
///
/// Guards the recursive tree walks against stack overflow from hostile configs.
pub const MAX_FIELD_DEPTH: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from level registry construction and level resolution.
///
/// Configuration errors are raised once, while the schema is built. Level
/// resolution errors abort a single projection call; no partial output is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// A per-field `level` rule mixes inclusions and exclusions.
    #[error("\"{path}\" contains inclusions and exclusions, only one kind can be used")]
    MixedLevelRule {
        /// Dotted path of the offending field.
        path: String,
    },

    /// A per-field `level` rule includes a level that was not declared up front.
    #[error(
        "\"{path}\" contains undefined level \"{level}\"; level inclusions must be declared in the schema levels"
    )]
    UndeclaredLevel {
        /// Dotted path of the offending field.
        path: String,
        /// The level name that is not declared.
        level: String,
    },

    /// Configuration deserialization or field tree construction failed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },

    /// Field tree nesting exceeds [`MAX_FIELD_DEPTH`].
    #[error("field tree nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Depth at which the limit was hit.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// No level name could be obtained for a projection call.
    #[error("unable to determine level")]
    UnresolvedLevel,

    /// A level name was resolved but is not registered.
    #[error("unknown level \"{level}\"{}", describe_available(.available))]
    UnknownLevel {
        /// The unregistered level name.
        level: String,
        /// Level names that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },
}

impl ProjectionError {
    /// Returns `true` for errors raised while building a schema.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MixedLevelRule { .. }
                | Self::UndeclaredLevel { .. }
                | Self::InvalidConfig { .. }
                | Self::DepthExceeded { .. }
        )
    }

    /// Returns `true` for errors raised while resolving the level of a call.
    #[must_use]
    pub fn is_level_resolution(&self) -> bool {
        matches!(self, Self::UnresolvedLevel | Self::UnknownLevel { .. })
    }
}

fn describe_available(available: &[String]) -> String {
    if available.is_empty() {
        ", no levels are registered".to_owned()
    } else {
        format!(", registered: {}", available.join(", "))
    }
}
