//! Path selectors: compiled `include`/`exclude` lists of dotted paths.
//!
//! Grammar: space-separated tokens, each `[-]dotted.path`. A leading `-`
//! marks an exclusion. Empty tokens are skipped.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A compiled field selector.
///
/// After [`compile`](Self::compile), each list is sorted and holds no path that
/// another retained path of the same list is a string prefix of. Selectors
/// produced by [`merge`](Self::merge) or by level registration carry no such
/// guarantee and may have both lists non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Selector {
    /// Create an empty selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a selector string.
    ///
    /// Redundant descendants are dropped per list: with `b` present, `b.c` is
    /// removed. The test is a raw string prefix, so `ab` is dropped next to `a`
    /// as well.
    ///
    /// ```
    /// use veil::Selector;
    ///
    /// let selector = Selector::compile("a -b c");
    /// assert_eq!(selector.include(), ["a", "c"]);
    /// assert_eq!(selector.exclude(), ["b"]);
    /// ```
    #[must_use]
    pub fn compile(source: &str) -> Self {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for token in source.split(' ') {
            if let Some(path) = token.strip_prefix('-') {
                exclude.push(path.to_owned());
            } else if !token.is_empty() {
                include.push(token.to_owned());
            }
        }

        Self {
            include: canonicalize(include),
            exclude: canonicalize(exclude),
        }
    }

    /// Concatenate a per-call selector with a level selector.
    ///
    /// Call-specific paths come first. No re-sort or redundancy pass happens here.
    #[must_use]
    pub fn merge(call: &Selector, level: &Selector) -> Self {
        Self {
            include: call.include.iter().chain(&level.include).cloned().collect(),
            exclude: call.exclude.iter().chain(&level.exclude).cloned().collect(),
        }
    }

    /// Paths to copy into the output.
    #[must_use]
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Paths to delete from the output.
    #[must_use]
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Returns `true` if neither list has any path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Returns `true` if both lists are non-empty.
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        !self.include.is_empty() && !self.exclude.is_empty()
    }

    pub(crate) fn push_exclude(&mut self, path: impl Into<String>) {
        self.exclude.push(path.into());
    }

    pub(crate) fn excluding(path: impl Into<String>) -> Self {
        Self {
            include: Vec::new(),
            exclude: vec![path.into()],
        }
    }
}

fn canonicalize(mut paths: Vec<String>) -> Vec<String> {
    paths.sort();
    let retained: Vec<bool> = paths
        .iter()
        .map(|v| !paths.iter().any(|f| v != f && v.starts_with(f.as_str())))
        .collect();
    paths
        .into_iter()
        .zip(retained)
        .filter_map(|(path, keep)| keep.then_some(path))
        .collect()
}

impl FromStr for Selector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::compile(s))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self
            .include
            .iter()
            .map(|p| p.to_owned())
            .chain(self.exclude.iter().map(|p| format!("-{p}")));
        for (i, token) in tokens.enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&token)?;
        }
        Ok(())
    }
}
