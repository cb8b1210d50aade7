//! URL-keyed module cache

use modlink_engine::{Eventual, ModuleId};
use rustc_hash::FxHashMap;
use url::Url;

/// Modules the loader has requested, keyed by URL
///
/// An entry is created the first time a URL is requested and holds an
/// [`Eventual`] that settles once the module is created and linked. Later
/// requests for the same URL, including ones from a cycle still in flight,
/// share that eventual.
#[derive(Debug, Default)]
pub struct ModuleCache {
    entries: FxHashMap<Url, Eventual<ModuleId>>,
}

impl ModuleCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `url`
    pub fn get(&self, url: &Url) -> Option<&Eventual<ModuleId>> {
        self.entries.get(url)
    }

    /// Module for `url`, if it has been created and linked
    pub fn module(&self, url: &Url) -> Option<ModuleId> {
        match self.entries.get(url)?.peek() {
            std::task::Poll::Ready(Ok(id)) => Some(id),
            _ => None,
        }
    }

    /// Whether `url` has been requested
    pub fn contains(&self, url: &Url) -> bool {
        self.entries.contains_key(url)
    }

    pub(crate) fn insert(&mut self, url: Url, eventual: Eventual<ModuleId>) {
        self.entries.insert(url, eventual);
    }

    pub(crate) fn remove(&mut self, url: &Url) -> Option<Eventual<ModuleId>> {
        self.entries.remove(url)
    }

    /// Number of requested URLs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been requested
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
