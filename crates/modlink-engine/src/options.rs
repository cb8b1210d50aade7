//! Graph configuration

/// Limits applied to a [`ModuleGraph`](crate::ModuleGraph)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphOptions {
    /// Maximum depth of the instantiate and evaluate walks
    ///
    /// Both walks recurse once per dependency edge on the current path.
    pub max_depth: Option<usize>,
}

impl GraphOptions {
    /// Default depth limit
    pub const DEFAULT_MAX_DEPTH: usize = 1024;

    /// Create default graph options
    pub fn new() -> Self {
        Self {
            max_depth: Some(Self::DEFAULT_MAX_DEPTH),
        }
    }

    /// Options without a depth limit
    pub fn unbounded() -> Self {
        Self { max_depth: None }
    }

    /// Set the depth limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Whether `depth` is past the configured limit
    pub(crate) fn exceeded(&self, depth: usize) -> Option<usize> {
        self.max_depth.filter(|&limit| depth > limit)
    }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::new()
    }
}
