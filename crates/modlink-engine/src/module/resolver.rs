//! Resolver capability
//!
//! The engine does not know how specifiers map to modules. Callers supply a
//! [`Resolver`] to [`ModuleGraph::link`](super::ModuleGraph::link); it is
//! asked once per distinct specifier and answers with an [`Eventual`] that
//! may settle later.

use super::{Eventual, ModuleId};
use crate::error::ResolveError;

/// The module asking for a specifier
#[derive(Debug, Clone, Copy)]
pub struct Referrer<'a> {
    /// Handle of the importing module
    pub id: ModuleId,
    /// URL the importing module was declared at
    pub url: &'a str,
}

/// Maps `(referrer, specifier)` to the module it names
pub trait Resolver {
    /// Start resolving `specifier` for `referrer`
    ///
    /// An `Err` aborts the whole `link` call.
    fn resolve(
        &mut self,
        referrer: Referrer<'_>,
        specifier: &str,
    ) -> Result<Eventual<ModuleId>, ResolveError>;
}

impl<F> Resolver for F
where
    F: FnMut(Referrer<'_>, &str) -> Result<Eventual<ModuleId>, ResolveError>,
{
    fn resolve(
        &mut self,
        referrer: Referrer<'_>,
        specifier: &str,
    ) -> Result<Eventual<ModuleId>, ResolveError> {
        self(referrer, specifier)
    }
}
