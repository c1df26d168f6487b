//! Level registry: named selector presets for one schema.
//!
//! Built once from the schema's declared levels plus the per-field `level`
//! rules found in its [`FieldTree`], then frozen.
//!
//! # Per-field rules
//!
//! | Field rule | Effect |
//! |------------|--------|
//! | `level: "internal"` | field path excluded from every other *declared* level |
//! | `level: "-public"` | field path excluded from `public` (created if undeclared) |
//! | `level: "internal -public"` | [`ProjectionError::MixedLevelRule`] |
//!
//! Inclusions must name a declared level ([`ProjectionError::UndeclaredLevel`]
//! otherwise). Levels created by exclusion rules are not "declared": later
//! inclusion rules do not inject into them.

use std::collections::BTreeMap;

use crate::{FieldTree, ProjectionError, Selector};

/// Builder for constructing a [`LevelRegistry`].
///
/// Declare levels with [`level()`](Self::level), then call
/// [`build()`](Self::build) with the schema's field tree to apply per-field
/// rules and freeze the registry.
///
/// # Immutability after build
///
/// Field rules are cross-injected here, once. The built registry exposes no
/// mutation, so projection calls can share it freely.
#[derive(Debug, Clone, Default)]
pub struct LevelRegistryBuilder {
    levels: BTreeMap<String, Selector>,
}

impl LevelRegistryBuilder {
    /// Create a new empty registry builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a level from a selector string.
    ///
    /// Declaring the same name twice keeps the later selector.
    #[must_use]
    pub fn level(mut self, name: impl Into<String>, selector: &str) -> Self {
        self.levels.insert(name.into(), Selector::compile(selector));
        self
    }

    /// Apply the field tree's `level` rules and freeze the registry.
    ///
    /// # Errors
    ///
    /// - [`ProjectionError::MixedLevelRule`] — a field rule both includes and excludes
    /// - [`ProjectionError::UndeclaredLevel`] — a field rule includes an undeclared level
    pub fn build(self, fields: &FieldTree) -> Result<LevelRegistry, ProjectionError> {
        let declared: Vec<String> = self.levels.keys().cloned().collect();
        let mut levels = self.levels;

        for (path, node) in fields.each_path() {
            let Some(rule) = node.level.as_deref() else {
                continue;
            };
            let rule = Selector::compile(rule);

            if rule.is_mixed() {
                return Err(ProjectionError::MixedLevelRule { path });
            }

            for visible_on in rule.include() {
                if !levels.contains_key(visible_on) {
                    return Err(ProjectionError::UndeclaredLevel {
                        path,
                        level: visible_on.clone(),
                    });
                }
                for other in declared.iter().filter(|name| *name != visible_on) {
                    if let Some(selector) = levels.get_mut(other) {
                        tracing::debug!(path = %path, level = %other, "hiding field outside its levels");
                        selector.push_exclude(path.as_str());
                    }
                }
            }

            for hidden_on in rule.exclude() {
                tracing::debug!(path = %path, level = %hidden_on, "hiding field on level");
                match levels.get_mut(hidden_on) {
                    Some(selector) => selector.push_exclude(path.as_str()),
                    None => {
                        levels.insert(hidden_on.clone(), Selector::excluding(path.as_str()));
                    }
                }
            }
        }

        tracing::info!(levels = levels.len(), "level registry built");
        Ok(LevelRegistry { levels })
    }
}

/// Immutable mapping of level name to compiled [`Selector`].
///
/// Constructed via [`LevelRegistryBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelRegistry {
    levels: BTreeMap<String, Selector>,
}

impl LevelRegistry {
    /// Look up a level's selector.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Selector> {
        self.levels.get(name)
    }

    /// Returns `true` if the level is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.levels.contains_key(name)
    }

    /// Returns the number of registered levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns `true` if no levels are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the registered level names, sorted.
    #[must_use]
    pub fn level_names(&self) -> Vec<&str> {
        self.levels.keys().map(String::as_str).collect()
    }

    /// Iterate over `(name, selector)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector)> {
        self.levels.iter().map(|(name, selector)| (name.as_str(), selector))
    }
}
