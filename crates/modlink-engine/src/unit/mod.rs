//! Compiled units
//!
//! A compiled unit is the opaque artifact a [`Compiler`] produces from source
//! text: an ordered list of import specifiers, a namespace of exports, and
//! the ability to bind its imports and run its body. The engine never looks
//! inside a unit; it only drives it through [`CompiledUnit`].

mod value;

pub use value::{Binding, Namespace, Value};

use crate::error::{BindingError, CompileError, Exception};
use rustc_hash::FxHashMap;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a compiled unit
///
/// Minted from a process-wide counter, so two units compiled from identical
/// source are still distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(NonZeroU64);

impl UnitId {
    /// Mint a new, never-before-used identity
    pub fn fresh() -> Self {
        let raw = NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 compilations to wrap.
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Build an identity from a raw value
    ///
    /// Compilers that manage their own identities use this; the registry
    /// tolerates two live units reporting the same value.
    pub fn from_raw(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    /// Raw identity value
    pub fn as_u64(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Namespaces of a unit's dependencies, keyed by import specifier
///
/// Built by the linker from already-resolved handles and handed to
/// [`CompiledUnit::instantiate_self`].
#[derive(Debug, Clone, Default)]
pub struct LinkedImports {
    by_specifier: FxHashMap<String, Namespace>,
}

impl LinkedImports {
    /// Create an empty import table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the namespace a specifier resolved to
    pub fn insert(&mut self, specifier: impl Into<String>, namespace: Namespace) {
        self.by_specifier.insert(specifier.into(), namespace);
    }

    /// Namespace for a specifier
    pub fn get(&self, specifier: &str) -> Option<&Namespace> {
        self.by_specifier.get(specifier)
    }

    /// Number of resolved specifiers
    pub fn len(&self) -> usize {
        self.by_specifier.len()
    }

    /// Whether no specifier was resolved
    pub fn is_empty(&self) -> bool {
        self.by_specifier.is_empty()
    }
}

/// A unit produced by a [`Compiler`]
pub trait CompiledUnit: fmt::Debug {
    /// Identity of this unit
    fn id(&self) -> UnitId;

    /// Import specifiers in declaration order; duplicates are kept
    fn requests(&self) -> &[String];

    /// The unit's export namespace
    ///
    /// Must return handles to the same table every time.
    fn namespace(&self) -> Namespace;

    /// Bind this unit's imports to its dependencies' namespaces
    fn instantiate_self(&mut self, imports: &LinkedImports) -> Result<(), BindingError>;

    /// Run the unit's body and return its completion value
    fn evaluate_self(&mut self) -> Result<Value, Exception>;
}

/// Turns source text into compiled units
pub trait Compiler {
    /// Compile `source`, declared at `url`
    fn compile(&self, source: &str, url: &str) -> Result<Box<dyn CompiledUnit>, CompileError>;
}

impl<F> Compiler for F
where
    F: Fn(&str, &str) -> Result<Box<dyn CompiledUnit>, CompileError>,
{
    fn compile(&self, source: &str, url: &str) -> Result<Box<dyn CompiledUnit>, CompileError> {
        self(source, url)
    }
}
