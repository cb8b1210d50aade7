//! Source providers
//!
//! A [`SourceProvider`] turns a resolved URL into module source text. The
//! loader asks for every URL at most once.

use crate::error::FetchError;
use rustc_hash::FxHashMap;
use url::Url;

/// Fetches module source text by URL
pub trait SourceProvider {
    /// Source text of the module at `url`
    fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

impl<F> SourceProvider for F
where
    F: Fn(&Url) -> Result<String, FetchError>,
{
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self(url)
    }
}

/// In-memory URL to source table
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    sources: FxHashMap<String, String>,
}

impl MemorySources {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register source text for a URL, replacing any previous entry
    pub fn insert(&mut self, url: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(url.into(), source.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, url: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(url, source);
        self
    }

    /// Number of registered URLs
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no URL is registered
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceProvider for MemorySources {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.sources
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
    }
}

/// Reads `file:` URLs from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSources;

impl SourceProvider for FileSources {
    fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let path = url.to_file_path().map_err(|()| FetchError::NotAFile {
            url: url.to_string(),
        })?;
        std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound {
                url: url.to_string(),
            },
            _ => FetchError::Io {
                url: url.to_string(),
                source,
            },
        })
    }
}
