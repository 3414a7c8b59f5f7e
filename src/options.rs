use crate::{TagRegistry, DEFAULT_MAX_DEPTH};

/// Configuration for composing documents.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ComposeOptions {
    /// Resolve integers outside the `i64` range to [`Value::BigInt`]
    /// instead of a lossy [`Value::Float`] (default: false).
    ///
    /// [`Value::BigInt`]: crate::Value::BigInt
    /// [`Value::Float`]: crate::Value::Float
    pub int_as_bigint: bool,
    /// Report plain scalars that no tag matches, rather than reading them
    /// as strings (default: false).
    pub strict_tags: bool,
    /// Maximum collection nesting (default: [`DEFAULT_MAX_DEPTH`]).
    pub max_depth: usize,
    /// Scalar tags (default: [`TagRegistry::json5`]).
    pub tags: TagRegistry,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            int_as_bigint: false,
            strict_tags: false,
            max_depth: DEFAULT_MAX_DEPTH,
            tags: TagRegistry::json5(),
        }
    }
}

impl ComposeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether large integers resolve to [`Value::BigInt`](crate::Value::BigInt).
    #[must_use]
    pub fn with_int_as_bigint(mut self, int_as_bigint: bool) -> Self {
        self.int_as_bigint = int_as_bigint;
        self
    }

    /// Set whether unmatched plain scalars are errors.
    #[must_use]
    pub fn with_strict_tags(mut self, strict_tags: bool) -> Self {
        self.strict_tags = strict_tags;
        self
    }

    /// Set the maximum collection nesting.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the scalar tags.
    #[must_use]
    pub fn with_tags(mut self, tags: TagRegistry) -> Self {
        self.tags = tags;
        self
    }
}
