//! Modlink Runtime
//!
//! Loads module graphs by URL on top of `modlink-engine`:
//! - **Specifiers**: resolving import specifiers to URLs (`specifier` module)
//! - **Sources**: fetching source text for a URL (`source` module)
//! - **Loader**: the URL-keyed module cache and the import job that fetches,
//!   links, instantiates and evaluates a root module (`loader` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use modlink_runtime::{Loader, MemorySources};
//!
//! let sources = MemorySources::new()
//!     .with("file:///main", r#"import { x } from "./dep"; x + 1;"#)
//!     .with("file:///dep", "export let x = 41;");
//! let mut loader = Loader::new(sources);
//! let imported = loader.import("file:///main")?;
//! assert_eq!(imported.value.as_int(), Some(42));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod error;
pub mod loader;
pub mod logging;
pub mod options;
pub mod source;
pub mod specifier;

pub use cache::ModuleCache;
pub use error::{FetchError, LoaderError, SpecifierError};
pub use loader::{Imported, Loader};
pub use logging::init_tracing;
pub use options::LoaderOptions;
pub use source::{FileSources, MemorySources, SourceProvider};
pub use specifier::resolve_specifier;
