//! Error taxonomy
//!
//! - [`CompileError`]: malformed source, fatal to one creation call
//! - [`LinkError`]: anything that stops a graph from instantiating
//! - [`RuntimeError`]: failure while evaluating a unit body
//!
//! Link and runtime errors are `Clone` because records keep the failure
//! that errored them and hand it back on every later call.

use crate::module::ModuleId;
use crate::unit::UnitId;
use thiserror::Error;

/// Source text could not be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{url}:{line}:{column}: {message}")]
pub struct CompileError {
    /// URL the source was declared at
    pub url: String,
    /// Diagnostic message
    pub message: String,
    /// 1-based line of the offending input
    pub line: usize,
    /// 1-based column of the offending input
    pub column: usize,
}

impl CompileError {
    /// Create a compile error at a line/column position
    pub fn new(url: &str, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            url: url.to_string(),
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a compile error at a byte offset into `source`
    pub fn at_offset(url: &str, source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self::new(url, message, line, column)
    }
}

/// 1-based line and column of a byte offset
pub(crate) fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let prefix = source.get(..offset).unwrap_or(source);
    let line = prefix.matches('\n').count() + 1;
    let column = match prefix.rfind('\n') {
        Some(newline) => prefix[newline + 1..].chars().count() + 1,
        None => prefix.chars().count() + 1,
    };
    (line, column)
}

/// A resolver could not produce a module for a specifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The resolver reported a failure
    #[error("{0}")]
    Failed(String),

    /// The resolution was dropped without ever being settled
    #[error("resolution abandoned before it settled")]
    Abandoned,
}

impl ResolveError {
    /// Create a resolver failure from a message
    pub fn failed(message: impl Into<String>) -> Self {
        ResolveError::Failed(message.into())
    }
}

/// A unit could not bind one of its imports
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// No namespace was supplied for a specifier the unit imports
    #[error("no module was linked for '{specifier}'")]
    Unresolved {
        /// Import specifier
        specifier: String,
    },

    /// The dependency does not export the requested name
    #[error("'{specifier}' does not export '{name}'")]
    MissingExport {
        /// Import specifier
        specifier: String,
        /// Requested export
        name: String,
    },
}

/// A value thrown by a unit body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Exception {
    /// Rendered thrown value
    pub message: String,
}

impl Exception {
    /// Create an exception from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that stop a module graph from instantiating
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    /// The record has no resolution cache entry for one of its specifiers
    #[error("unresolved specifier '{specifier}' imported from '{referrer}'")]
    UnresolvedSpecifier {
        /// Import specifier
        specifier: String,
        /// URL of the importing module
        referrer: String,
    },

    /// The resolution for a specifier has not settled yet
    #[error("dependency '{specifier}' imported from '{referrer}' is not ready")]
    NotReady {
        /// Import specifier
        specifier: String,
        /// URL of the importing module
        referrer: String,
    },

    /// The resolution settled with a handle that names no live module
    #[error("resolver returned a non-module value for '{specifier}' imported from '{referrer}'")]
    NotAModule {
        /// Import specifier
        specifier: String,
        /// URL of the importing module
        referrer: String,
    },

    /// A unit asked for its imports but no record owns it
    #[error("unknown referrer {0}")]
    UnknownReferrer(UnitId),

    /// The resolver failed for a specifier
    #[error("failed to resolve '{specifier}' imported from '{referrer}': {source}")]
    Resolver {
        /// Import specifier
        specifier: String,
        /// URL of the importing module
        referrer: String,
        /// Resolver-side failure
        #[source]
        source: ResolveError,
    },

    /// The unit rejected the namespaces it was linked against
    #[error("{url}: {source}")]
    Binding {
        /// URL of the module being linked
        url: String,
        /// Unit-side failure
        #[source]
        source: BindingError,
    },

    /// The dependency chain is deeper than the configured limit
    #[error("instantiation of '{url}' exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// URL of the module at the limit
        url: String,
        /// Configured limit
        limit: usize,
    },

    /// The handle does not name a live module
    #[error("invalid module handle {0}")]
    InvalidHandle(ModuleId),
}

/// Errors raised while evaluating a module graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A unit body threw
    #[error("uncaught exception in '{url}': {message}")]
    Exception {
        /// URL of the module whose body threw
        url: String,
        /// Rendered thrown value
        message: String,
    },

    /// Evaluation requested before instantiation
    #[error("'{url}' has not been instantiated")]
    NotInstantiated {
        /// URL of the module
        url: String,
    },

    /// Evaluation requested on a module whose instantiation failed
    #[error("'{url}' failed to instantiate: {source}")]
    Unlinked {
        /// URL of the module
        url: String,
        /// The stored instantiation failure
        #[source]
        source: LinkError,
    },

    /// The dependency chain is deeper than the configured limit
    #[error("evaluation of '{url}' exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// URL of the module at the limit
        url: String,
        /// Configured limit
        limit: usize,
    },

    /// The handle does not name a live module
    #[error("invalid module handle {0}")]
    InvalidHandle(ModuleId),
}

/// Any engine failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Compilation failed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Instantiation failed
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Evaluation failed
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
