//! Serialization hook adapter.
//!
//! The host calls a [`Transform`] once per serialization with the document
//! handle, the working output object it assembled, and the call options.
//! [`LevelTransform`] resolves the effective level and runs the projection
//! engine, after any prior transform it was composed with.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{project, ArrayPolicy, LevelRegistry, ProjectionError, Selector};

/// Level resolver callback: `(document, working output, options) -> level name`.
///
/// The document handle is `None` when projecting a plain object with no
/// document behind it. Returning `None` means no level could be chosen.
pub type LevelResolver<D> =
    Arc<dyn Fn(Option<&D>, &Value, &CallOptions<D>) -> Option<String> + Send + Sync>;

/// A level given by name, or chosen per call by a resolver.
pub enum LevelSpec<D> {
    /// A registered level name.
    Name(String),
    /// A callback invoked with the call-site context.
    Resolver(LevelResolver<D>),
}

impl<D> LevelSpec<D> {
    /// Wrap a resolver function.
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(Option<&D>, &Value, &CallOptions<D>) -> Option<String> + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }

    /// The level name, if this is not a resolver.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Resolver(_) => None,
        }
    }
}

impl<D> LevelSpec<D> {
    /// An empty name counts as no level at all.
    pub(crate) fn is_blank(&self) -> bool {
        self.as_name().is_some_and(str::is_empty)
    }
}

impl<D> Clone for LevelSpec<D> {
    fn clone(&self) -> Self {
        match self {
            Self::Name(name) => Self::Name(name.clone()),
            Self::Resolver(f) => Self::Resolver(Arc::clone(f)),
        }
    }
}

impl<D> fmt::Debug for LevelSpec<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl<D> From<&str> for LevelSpec<D> {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl<D> From<String> for LevelSpec<D> {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Per-call options. Never persisted.
pub struct CallOptions<D> {
    /// Level override; the schema default applies when `None`.
    pub level: Option<LevelSpec<D>>,
    /// Per-call selector string, merged in front of the level's selector.
    pub projection: Option<String>,
    /// Prune emptied objects from the output.
    pub minimize: bool,
    /// Caller data passed through to resolvers and prior transforms.
    pub extra: Map<String, Value>,
}

impl<D> CallOptions<D> {
    /// Options with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: None,
            projection: None,
            minimize: false,
            extra: Map::new(),
        }
    }

    /// Set the level (builder pattern).
    #[must_use]
    pub fn with_level(mut self, level: impl Into<LevelSpec<D>>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Set a level resolver (builder pattern).
    #[must_use]
    pub fn with_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&D>, &Value, &CallOptions<D>) -> Option<String> + Send + Sync + 'static,
    {
        self.level = Some(LevelSpec::resolver(f));
        self
    }

    /// Set the per-call selector string (builder pattern).
    #[must_use]
    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }

    /// Turn minimizing on or off (builder pattern).
    #[must_use]
    pub fn with_minimize(mut self, minimize: bool) -> Self {
        self.minimize = minimize;
        self
    }

    /// Attach caller data (builder pattern).
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl<D> Default for CallOptions<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for CallOptions<D> {
    fn clone(&self) -> Self {
        Self {
            level: self.level.clone(),
            projection: self.projection.clone(),
            minimize: self.minimize,
            extra: self.extra.clone(),
        }
    }
}

impl<D> fmt::Debug for CallOptions<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("level", &self.level)
            .field("projection", &self.projection)
            .field("minimize", &self.minimize)
            .field("extra", &self.extra)
            .finish()
    }
}

/// A serialization hook: turns the working output object for `doc` into the
/// serialized form.
///
/// Implemented for closures, so an existing host transform can be passed to
/// [`LevelTransform::new`] directly.
pub trait Transform<D>: Send + Sync {
    /// Transform the working object.
    ///
    /// # Errors
    ///
    /// Implementations decide; [`LevelTransform`] fails with level resolution errors.
    fn transform(&self, doc: &D, ret: Value, options: &CallOptions<D>)
        -> Result<Value, ProjectionError>;
}

impl<D, F> Transform<D> for F
where
    F: Fn(&D, Value, &CallOptions<D>) -> Result<Value, ProjectionError> + Send + Sync,
{
    fn transform(
        &self,
        doc: &D,
        ret: Value,
        options: &CallOptions<D>,
    ) -> Result<Value, ProjectionError> {
        self(doc, ret, options)
    }
}

/// The level projection hook.
///
/// Holds the frozen registry, the schema's default level and an optional prior
/// transform. The prior transform always runs first and its output becomes the
/// working document.
pub struct LevelTransform<D> {
    registry: Arc<LevelRegistry>,
    default_level: Option<LevelSpec<D>>,
    array_policy: ArrayPolicy,
    prior: Option<Box<dyn Transform<D>>>,
}

impl<D> LevelTransform<D> {
    /// Create the hook over a registry.
    #[must_use]
    pub fn new(
        registry: Arc<LevelRegistry>,
        default_level: Option<LevelSpec<D>>,
        array_policy: ArrayPolicy,
        prior: Option<Box<dyn Transform<D>>>,
    ) -> Self {
        Self {
            registry,
            default_level,
            array_policy,
            prior,
        }
    }

    /// The registry levels are resolved against.
    #[must_use]
    pub fn registry(&self) -> &LevelRegistry {
        &self.registry
    }

    /// The level used when a call names none.
    #[must_use]
    pub fn default_level(&self) -> Option<&LevelSpec<D>> {
        self.default_level.as_ref()
    }

    /// Resolve the effective level selector for a call.
    ///
    /// The call's level wins over the default unless it is an empty name. A
    /// resolver is invoked with `(doc, working, options)`.
    ///
    /// # Errors
    ///
    /// - [`ProjectionError::UnresolvedLevel`] — no level given, or the resolver returned `None`
    /// - [`ProjectionError::UnknownLevel`] — the name is not registered
    pub fn resolve(
        &self,
        doc: Option<&D>,
        working: &Value,
        options: &CallOptions<D>,
    ) -> Result<&Selector, ProjectionError> {
        let spec = options
            .level
            .as_ref()
            .filter(|spec| !spec.is_blank())
            .or(self.default_level.as_ref())
            .ok_or(ProjectionError::UnresolvedLevel)?;

        let name = match spec {
            LevelSpec::Name(name) => name.clone(),
            LevelSpec::Resolver(resolve) => {
                resolve(doc, working, options).ok_or(ProjectionError::UnresolvedLevel)?
            }
        };

        self.registry
            .get(&name)
            .ok_or_else(|| ProjectionError::UnknownLevel {
                available: self
                    .registry
                    .level_names()
                    .into_iter()
                    .map(str::to_owned)
                    .collect(),
                level: name,
            })
    }

    /// Resolve the level and project `working`, skipping the prior transform.
    ///
    /// # Errors
    ///
    /// Level resolution errors, see [`resolve()`](Self::resolve).
    pub fn project(
        &self,
        doc: Option<&D>,
        working: Value,
        options: &CallOptions<D>,
    ) -> Result<Option<Value>, ProjectionError> {
        let level = self.resolve(doc, &working, options)?;
        project(
            working,
            Some(level),
            options.projection.as_deref(),
            options.minimize.then_some(self.array_policy),
        )
    }
}

impl<D> Transform<D> for LevelTransform<D> {
    fn transform(
        &self,
        doc: &D,
        ret: Value,
        options: &CallOptions<D>,
    ) -> Result<Value, ProjectionError> {
        let working = match &self.prior {
            Some(prior) => prior.transform(doc, ret, options)?,
            None => ret,
        };
        Ok(self
            .project(Some(doc), working, options)?
            .unwrap_or_else(|| Value::Object(Map::new())))
    }
}

impl<D> fmt::Debug for LevelTransform<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelTransform")
            .field("registry", &self.registry)
            .field("default_level", &self.default_level)
            .field("array_policy", &self.array_policy)
            .field("prior", &self.prior.as_ref().map(|_| ".."))
            .finish()
    }
}
