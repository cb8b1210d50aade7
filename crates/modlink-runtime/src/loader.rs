//! Module loader
//!
//! Drives a [`ModuleGraph`] from specifiers: every import runs a job that
//! requests the root URL, then repeatedly fetches, creates and links queued
//! modules until nothing new is requested. Each new URL enters the cache as
//! a pending [`Eventual`] before its source is fetched, so a cycle that
//! reaches back to it reuses the in-flight entry instead of loading twice.
//! Once the queue is empty every reachable resolution has settled and the
//! root is instantiated and evaluated.

use crate::cache::ModuleCache;
use crate::error::{LoaderError, SpecifierError};
use crate::options::LoaderOptions;
use crate::source::SourceProvider;
use crate::specifier::resolve_specifier;
use modlink_engine::{
    Compiler, Eventual, LinkError, ModuleGraph, ModuleId, Namespace, Referrer, ResolveError,
    RuntimeError, Settler, Value,
};
use std::collections::VecDeque;
use std::task::Poll;
use tracing::{debug, trace, warn};
use url::Url;

/// Result of a successful import
#[derive(Debug, Clone)]
pub struct Imported {
    /// Handle of the imported module in the loader's graph
    pub module: ModuleId,
    /// Completion value of the module's body
    pub value: Value,
    /// The module's export namespace
    pub namespace: Namespace,
}

/// Work belonging to one import call
#[derive(Default)]
struct Job {
    queue: VecDeque<(Url, Settler<ModuleId>)>,
    requested: Vec<Url>,
    created: Vec<ModuleId>,
}

/// Cached entry for `url`, queueing it for loading on first request
fn request(cache: &mut ModuleCache, job: &mut Job, url: Url) -> Eventual<ModuleId> {
    if let Some(existing) = cache.get(&url) {
        trace!(url = %url, "module cache hit");
        return existing.clone();
    }
    let (eventual, settler) = Eventual::pending();
    cache.insert(url.clone(), eventual.clone());
    job.requested.push(url.clone());
    job.queue.push_back((url, settler));
    eventual
}

/// URL-keyed module loader
pub struct Loader<P> {
    graph: ModuleGraph,
    cache: ModuleCache,
    sources: P,
    options: LoaderOptions,
}

impl<P: SourceProvider> Loader<P> {
    /// Create a loader with default options
    pub fn new(sources: P) -> Self {
        Self::with_options(sources, LoaderOptions::default())
    }

    /// Create a loader compiling sources with the built-in script compiler
    pub fn with_options(sources: P, options: LoaderOptions) -> Self {
        let graph = ModuleGraph::new().with_options(options.graph.clone());
        Self {
            graph,
            cache: ModuleCache::new(),
            sources,
            options,
        }
    }

    /// Create a loader compiling sources with `compiler`
    pub fn with_compiler(
        sources: P,
        compiler: impl Compiler + 'static,
        options: LoaderOptions,
    ) -> Self {
        let graph = ModuleGraph::with_compiler(compiler).with_options(options.graph.clone());
        Self {
            graph,
            cache: ModuleCache::new(),
            sources,
            options,
        }
    }

    /// The module graph holding every loaded module
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// The URL-keyed module cache
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Loader options
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Import `specifier` relative to the configured base URL
    ///
    /// Without a configured base, the working directory is used.
    pub fn import(&mut self, specifier: &str) -> Result<Imported, LoaderError> {
        let base = self.options.base_url()?;
        self.import_from(specifier, &base)
    }

    /// Import `specifier` relative to `parent`
    ///
    /// Modules stay loaded between imports; importing a URL again returns
    /// the cached evaluation. If fetching, compiling or linking any newly
    /// requested module fails, every module this call created is discarded
    /// so a later import retries them.
    pub fn import_from(&mut self, specifier: &str, parent: &Url) -> Result<Imported, LoaderError> {
        let url = resolve_specifier(parent, specifier, &self.options.schemes)?;
        debug!(url = %url, specifier, "import");

        let mut job = Job::default();
        let root = request(&mut self.cache, &mut job, url);
        if let Err(err) = self.drain(&mut job) {
            warn!(error = %err, discarded = job.created.len(), "import failed while loading");
            self.rollback(job);
            return Err(err);
        }

        let module = match root.peek() {
            Poll::Ready(Ok(module)) => module,
            Poll::Ready(Err(source)) => {
                return Err(LinkError::Resolver {
                    specifier: specifier.to_string(),
                    referrer: parent.to_string(),
                    source,
                }
                .into())
            }
            Poll::Pending => {
                return Err(LinkError::NotReady {
                    specifier: specifier.to_string(),
                    referrer: parent.to_string(),
                }
                .into())
            }
        };

        self.graph.instantiate(module)?;
        let value = self.graph.evaluate(module)?;
        let namespace = self
            .graph
            .namespace(module)
            .ok_or(RuntimeError::InvalidHandle(module))?;
        Ok(Imported {
            module,
            value,
            namespace,
        })
    }

    /// Load queued modules until the job requests nothing new
    fn drain(&mut self, job: &mut Job) -> Result<(), LoaderError> {
        while let Some((url, settler)) = job.queue.pop_front() {
            match self.load(&url, job) {
                Ok(module) => settler.fulfill(module),
                Err(err) => {
                    settler.reject(ResolveError::failed(err.to_string()));
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Fetch, create and link the module at `url`
    fn load(&mut self, url: &Url, job: &mut Job) -> Result<ModuleId, LoaderError> {
        let source = self.sources.fetch(url)?;
        let module = self.graph.create_module(&source, url.as_str())?;
        job.created.push(module);

        let Self {
            graph,
            cache,
            options,
            ..
        } = self;
        let mut rejected: Option<SpecifierError> = None;
        let mut resolver = |referrer: Referrer<'_>,
                            specifier: &str|
         -> Result<Eventual<ModuleId>, ResolveError> {
            let base =
                Url::parse(referrer.url).map_err(|err| ResolveError::failed(err.to_string()))?;
            match resolve_specifier(&base, specifier, &options.schemes) {
                Ok(target) => {
                    trace!(module = %referrer.id, specifier, url = %target, "specifier resolved");
                    Ok(request(cache, job, target))
                }
                Err(err) => {
                    let failure = ResolveError::failed(err.to_string());
                    rejected = Some(err);
                    Err(failure)
                }
            }
        };

        match graph.link(module, &mut resolver) {
            Ok(module) => Ok(module),
            Err(err) => Err(match rejected {
                Some(specifier_error) => specifier_error.into(),
                None => err.into(),
            }),
        }
    }

    /// Forget everything a failed job requested or created
    fn rollback(&mut self, job: Job) {
        for url in &job.requested {
            self.cache.remove(url);
        }
        for module in job.created {
            self.graph.destroy(module);
        }
    }
}

impl<P> std::fmt::Debug for Loader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("modules", &self.graph.len())
            .field("cached", &self.cache.len())
            .field("options", &self.options)
            .finish()
    }
}
