//! Loader error types.

use modlink_engine::{CompileError, LinkError, RuntimeError};

/// A specifier could not be turned into a URL the loader accepts
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecifierError {
    /// The specifier does not form a valid URL against its referrer
    #[error("invalid specifier '{specifier}' imported from '{referrer}': {source}")]
    Invalid {
        /// Specifier as written
        specifier: String,
        /// URL of the importing module
        referrer: String,
        /// Underlying parse failure
        #[source]
        source: url::ParseError,
    },

    /// The resolved URL uses a scheme the loader does not load from
    #[error("unsupported scheme '{scheme}' in '{url}'")]
    UnsupportedScheme {
        /// Offending scheme
        scheme: String,
        /// Resolved URL
        url: String,
    },

    /// No base URL was configured and the working directory is unusable
    #[error("no base URL to resolve against: {reason}")]
    NoBase {
        /// Why the working directory could not be used
        reason: String,
    },
}

/// Source text could not be obtained for a URL
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No source is registered for the URL
    #[error("cannot find module '{url}'")]
    NotFound {
        /// Requested URL
        url: String,
    },

    /// The URL does not name a local file
    #[error("'{url}' is not a file path")]
    NotAFile {
        /// Requested URL
        url: String,
    },

    /// Reading the source failed
    #[error("failed to read '{url}': {source}")]
    Io {
        /// Requested URL
        url: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced while importing a module
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Specifier resolution error
    #[error(transparent)]
    Specifier(#[from] SpecifierError),

    /// Source fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Compile error
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Link or instantiate error
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Evaluation error
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
