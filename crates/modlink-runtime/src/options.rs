//! Loader configuration

use crate::error::SpecifierError;
use modlink_engine::GraphOptions;
use url::Url;

/// Schemes accepted by default
pub const DEFAULT_SCHEMES: [&str; 2] = ["file", "memory"];

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// URL that top-level specifiers are resolved against
    ///
    /// `None` means the process working directory, read at import time.
    pub base_url: Option<Url>,
    /// URL schemes modules may be loaded from
    pub schemes: Vec<String>,
    /// Options for the loader's module graph
    pub graph: GraphOptions,
}

impl LoaderOptions {
    /// Default options: working-directory base, schemes `file` and `memory`
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Replace the accepted schemes
    pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the graph options
    pub fn with_graph_options(mut self, graph: GraphOptions) -> Self {
        self.graph = graph;
        self
    }

    /// The configured base URL, or a directory URL for the working directory
    pub fn base_url(&self) -> Result<Url, SpecifierError> {
        if let Some(base) = &self.base_url {
            return Ok(base.clone());
        }
        let dir = std::env::current_dir().map_err(|err| SpecifierError::NoBase {
            reason: err.to_string(),
        })?;
        Url::from_directory_path(&dir).map_err(|()| SpecifierError::NoBase {
            reason: format!("'{}' is not an absolute path", dir.display()),
        })
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            schemes: DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect(),
            graph: GraphOptions::default(),
        }
    }
}
