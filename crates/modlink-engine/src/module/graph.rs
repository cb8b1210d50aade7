//! Module graph
//!
//! The graph owns every module record in a generation-checked arena and the
//! registry that maps units back to their records. Creating, linking,
//! instantiating, and evaluating modules all go through it.

use super::{Eventual, ModuleId, ModuleRecord, ModuleRegistry, Referrer, Resolver};
use super::{EvalState, LinkState, LinkStatus};
use crate::error::{line_column, CompileError, LinkError};
use crate::options::GraphOptions;
use crate::script::ScriptCompiler;
use crate::unit::{CompiledUnit, Compiler, Namespace};
use std::fmt;
use tracing::{debug, trace};

struct Slot {
    generation: u32,
    record: Option<ModuleRecord>,
}

/// Owner of a module dependency graph
pub struct ModuleGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    registry: ModuleRegistry,
    compiler: Box<dyn Compiler>,
    pub(super) options: GraphOptions,
}

impl ModuleGraph {
    /// Create a graph that compiles sources with [`ScriptCompiler`]
    pub fn new() -> Self {
        Self::with_compiler(ScriptCompiler::new())
    }

    /// Create a graph that compiles sources with `compiler`
    pub fn with_compiler(compiler: impl Compiler + 'static) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            registry: ModuleRegistry::new(),
            compiler: Box::new(compiler),
            options: GraphOptions::default(),
        }
    }

    /// Replace the graph options
    pub fn with_options(mut self, options: GraphOptions) -> Self {
        self.options = options;
        self
    }

    /// Current graph options
    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// The unit-identity registry
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Compile `source` declared at `url` into a new module record
    ///
    /// Nothing is registered if compilation fails.
    pub fn create_module(&mut self, source: &str, url: &str) -> Result<ModuleId, CompileError> {
        let unit = self.compiler.compile(source, url)?;
        let unit_id = unit.id();
        let record = ModuleRecord::new(url, unit);
        let requests = record.requests.len();

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.record = Some(record);
                ModuleId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                ModuleId::new(index, 0)
            }
        };
        self.registry.insert(unit_id, id);

        debug!(module = %id, unit = %unit_id, url, requests, "module created");
        Ok(id)
    }

    /// Like [`create_module`](Self::create_module), for raw bytes
    ///
    /// Invalid UTF-8 is a compile error positioned at the first bad byte.
    pub fn create_module_from_bytes(
        &mut self,
        bytes: &[u8],
        url: &str,
    ) -> Result<ModuleId, CompileError> {
        match std::str::from_utf8(bytes) {
            Ok(source) => self.create_module(source, url),
            Err(err) => {
                let valid = &bytes[..err.valid_up_to()];
                // The prefix up to `valid_up_to` is guaranteed to be UTF-8.
                let prefix = std::str::from_utf8(valid).unwrap_or_default();
                let (line, column) = line_column(prefix, prefix.len());
                Err(CompileError::new(url, "source is not valid UTF-8", line, column))
            }
        }
    }

    /// Destroy a module record and drop its registry entry
    ///
    /// Returns `false` if the handle was already dead. Handles to the
    /// destroyed record stop resolving; dependents linked to it will fail
    /// to evaluate it.
    pub fn destroy(&mut self, id: ModuleId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index() as usize) else {
            return false;
        };
        if slot.generation != id.generation() {
            return false;
        }
        let Some(record) = slot.record.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.registry.remove(record.unit.id(), id);

        debug!(module = %id, url = %record.url, "module destroyed");
        true
    }

    /// Whether `id` names a live record
    pub fn contains(&self, id: ModuleId) -> bool {
        self.record(id).is_some()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.record.is_some()).count()
    }

    /// Whether the graph has no live records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of all live records
    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.record
                .as_ref()
                .map(|_| ModuleId::new(index as u32, slot.generation))
        })
    }

    /// Record for a handle
    pub fn record(&self, id: ModuleId) -> Option<&ModuleRecord> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_ref())
    }

    pub(super) fn record_mut(&mut self, id: ModuleId) -> Option<&mut ModuleRecord> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_mut())
    }

    pub(super) fn live(&self, id: ModuleId) -> Result<&ModuleRecord, LinkError> {
        self.record(id).ok_or(LinkError::InvalidHandle(id))
    }

    pub(super) fn live_mut(&mut self, id: ModuleId) -> Result<&mut ModuleRecord, LinkError> {
        self.record_mut(id).ok_or(LinkError::InvalidHandle(id))
    }

    /// URL a module was declared at
    pub fn url(&self, id: ModuleId) -> Option<&str> {
        self.record(id).map(ModuleRecord::url)
    }

    /// Import specifiers of a module, in declaration order
    pub fn requests(&self, id: ModuleId) -> Option<&[String]> {
        self.record(id).map(ModuleRecord::requests)
    }

    /// Export namespace of a module
    pub fn namespace(&self, id: ModuleId) -> Option<Namespace> {
        self.record(id).map(|r| r.unit.namespace())
    }

    /// Instantiation state of a module
    pub fn link_state(&self, id: ModuleId) -> Option<LinkState> {
        self.record(id).map(ModuleRecord::link_state)
    }

    /// Evaluation state of a module
    pub fn eval_state(&self, id: ModuleId) -> Option<EvalState> {
        self.record(id).map(ModuleRecord::eval_state)
    }

    /// Populate a module's resolution cache
    ///
    /// The resolver is called once per distinct specifier, in declaration
    /// order; a repeated specifier reuses the first resolution. Each call
    /// starts from an empty cache. A resolver error is returned at once and
    /// leaves the cache partially filled.
    ///
    /// Linking an instantiated module is a no-op; linking one whose
    /// instantiation failed returns the stored failure.
    pub fn link<R>(&mut self, id: ModuleId, resolver: &mut R) -> Result<ModuleId, LinkError>
    where
        R: Resolver + ?Sized,
    {
        let record = self.live(id)?;
        match &record.link {
            LinkStatus::Errored(err) => return Err(err.clone()),
            LinkStatus::Instantiated | LinkStatus::Instantiating { .. } => {
                debug!(module = %id, url = %record.url, "link skipped, already instantiated");
                return Ok(id);
            }
            LinkStatus::Uninstantiated => {}
        }
        let url = record.url.clone();
        let requests = record.requests.clone();

        self.live_mut(id)?.cache.clear();
        for specifier in &requests {
            if self.live(id)?.cache.contains_key(specifier) {
                trace!(module = %id, specifier = %specifier, "duplicate specifier reuses resolution");
                continue;
            }
            let referrer = Referrer { id, url: &url };
            let eventual: Eventual<ModuleId> =
                resolver
                    .resolve(referrer, specifier)
                    .map_err(|source| LinkError::Resolver {
                        specifier: specifier.clone(),
                        referrer: url.clone(),
                        source,
                    })?;
            trace!(module = %id, specifier = %specifier, settled = eventual.is_settled(), "resolver called");
            self.live_mut(id)?.cache.insert(specifier.clone(), eventual);
        }

        debug!(module = %id, url = %url, "module linked");
        Ok(id)
    }

    /// Record that owns `unit`
    ///
    /// Several records may share an identity bucket; the owner is the one
    /// holding this exact unit object.
    pub fn owner_of(&self, unit: &dyn CompiledUnit) -> Option<ModuleId> {
        self.registry
            .candidates(unit.id())
            .iter()
            .copied()
            .find(|&candidate| {
                self.record(candidate).is_some_and(|record| {
                    std::ptr::addr_eq(
                        record.unit.as_ref() as *const dyn CompiledUnit,
                        unit as *const dyn CompiledUnit,
                    )
                })
            })
    }

    /// Dependency `referrer` imports under `specifier`
    ///
    /// Used while instantiating, once every specifier of the referrer has
    /// settled to a handle.
    pub(super) fn resolve_callback(
        &self,
        referrer: &dyn CompiledUnit,
        specifier: &str,
    ) -> Result<ModuleId, LinkError> {
        let owner = self
            .owner_of(referrer)
            .ok_or(LinkError::UnknownReferrer(referrer.id()))?;
        let record = self.live(owner)?;
        record
            .linked
            .get(specifier)
            .copied()
            .ok_or_else(|| LinkError::UnresolvedSpecifier {
                specifier: specifier.to_string(),
                referrer: record.url.clone(),
            })
    }
}

impl Default for ModuleGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleGraph")
            .field("modules", &self.len())
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindingError, Exception, ResolveError};
    use crate::unit::{LinkedImports, UnitId, Value};
    use std::num::NonZeroU64;

    fn fulfilled(id: ModuleId) -> Result<Eventual<ModuleId>, ResolveError> {
        Ok(Eventual::fulfilled(id))
    }

    /// Unit that reports a fixed identity and imports one specifier per line
    #[derive(Debug)]
    struct FixedUnit {
        id: UnitId,
        requests: Vec<String>,
        namespace: Namespace,
    }

    impl CompiledUnit for FixedUnit {
        fn id(&self) -> UnitId {
            self.id
        }

        fn requests(&self) -> &[String] {
            &self.requests
        }

        fn namespace(&self) -> Namespace {
            self.namespace.clone()
        }

        fn instantiate_self(&mut self, _: &LinkedImports) -> Result<(), BindingError> {
            Ok(())
        }

        fn evaluate_self(&mut self) -> Result<Value, Exception> {
            Ok(Value::Undefined)
        }
    }

    fn fixed_unit(raw: u64, source: &str, url: &str) -> Box<dyn CompiledUnit> {
        Box::new(FixedUnit {
            id: UnitId::from_raw(NonZeroU64::new(raw).unwrap()),
            requests: source.lines().map(str::to_string).collect(),
            namespace: Namespace::new(url, Vec::<String>::new()),
        })
    }

    fn shared_id_compiler(
        source: &str,
        url: &str,
    ) -> Result<Box<dyn CompiledUnit>, CompileError> {
        Ok(fixed_unit(7, source, url))
    }

    #[test]
    fn test_create_module_registers_unit() {
        let mut graph = ModuleGraph::new();
        let id = graph
            .create_module(r#"import "./a"; import "./b";"#, "memory:///main")
            .unwrap();

        assert_eq!(graph.url(id), Some("memory:///main"));
        assert_eq!(
            graph.requests(id).unwrap(),
            &["./a".to_string(), "./b".to_string()]
        );
        assert_eq!(graph.registry().len(), 1);
        assert_eq!(graph.link_state(id), Some(LinkState::Uninstantiated));
        let unit = graph.record(id).unwrap().unit();
        assert_eq!(graph.owner_of(unit), Some(id));
    }

    #[test]
    fn test_compile_error_registers_nothing() {
        let mut graph = ModuleGraph::new();
        let err = graph.create_module("let = ;", "memory:///bad").unwrap_err();
        assert_eq!(err.url, "memory:///bad");
        assert!(graph.is_empty());
        assert!(graph.registry().is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_compile_error() {
        let mut graph = ModuleGraph::new();
        let err = graph
            .create_module_from_bytes(b"let a = 1;\nlet b = \xff;", "memory:///bytes")
            .unwrap_err();
        assert_eq!((err.line, err.column), (2, 9));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_destroy_invalidates_handle() {
        let mut graph = ModuleGraph::new();
        let first = graph.create_module("1;", "memory:///first").unwrap();
        assert!(graph.destroy(first));
        assert!(!graph.destroy(first));
        assert!(graph.registry().is_empty());

        let second = graph.create_module("2;", "memory:///second").unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert!(graph.url(first).is_none());
        assert_eq!(graph.url(second), Some("memory:///second"));
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec![second]);
    }

    #[test]
    fn test_link_collapses_duplicate_specifiers() {
        let mut graph = ModuleGraph::new();
        let dep = graph.create_module("1;", "memory:///dep").unwrap();
        let main = graph
            .create_module(r#"import "./dep"; import "./dep";"#, "memory:///main")
            .unwrap();

        let mut calls = Vec::new();
        let mut resolver = |referrer: Referrer<'_>, specifier: &str| {
            calls.push((referrer.url.to_string(), specifier.to_string()));
            fulfilled(dep)
        };
        assert_eq!(graph.link(main, &mut resolver).unwrap(), main);

        assert_eq!(
            calls,
            vec![("memory:///main".to_string(), "./dep".to_string())]
        );
        assert_eq!(graph.record(main).unwrap().cache_len(), 1);
    }

    #[test]
    fn test_resolver_failure_propagates() {
        let mut graph = ModuleGraph::new();
        let main = graph
            .create_module(r#"import "./ok"; import "./boom";"#, "memory:///main")
            .unwrap();
        let ok = graph.create_module("1;", "memory:///ok").unwrap();

        let mut resolver = |_: Referrer<'_>, specifier: &str| match specifier {
            "./ok" => fulfilled(ok),
            _ => Err(ResolveError::failed("no such module")),
        };
        let err = graph.link(main, &mut resolver).unwrap_err();

        assert!(matches!(
            err,
            LinkError::Resolver { ref specifier, .. } if specifier == "./boom"
        ));
        // Partially populated, state untouched.
        assert_eq!(graph.record(main).unwrap().cache_len(), 1);
        assert_eq!(graph.link_state(main), Some(LinkState::Uninstantiated));
    }

    #[test]
    fn test_link_invalid_handle() {
        let mut graph = ModuleGraph::new();
        let id = graph.create_module("1;", "memory:///a").unwrap();
        graph.destroy(id);
        let mut resolver = |_: Referrer<'_>, _: &str| fulfilled(id);
        assert_eq!(
            graph.link(id, &mut resolver),
            Err(LinkError::InvalidHandle(id))
        );
    }

    #[test]
    fn test_owner_of_tells_apart_shared_identities() {
        let mut graph = ModuleGraph::with_compiler(shared_id_compiler);
        let a = graph.create_module("./x", "memory:///a").unwrap();
        let b = graph.create_module("./y", "memory:///b").unwrap();
        let unit_a = graph.record(a).unwrap().unit();
        let unit_b = graph.record(b).unwrap().unit();
        assert_eq!(unit_a.id(), unit_b.id());
        assert_eq!(graph.registry().candidates(unit_a.id()).len(), 2);

        assert_eq!(graph.owner_of(unit_a), Some(a));
        assert_eq!(graph.owner_of(unit_b), Some(b));

        // Each unit reaches its own record's links.
        let x = graph.create_module("", "memory:///x").unwrap();
        let y = graph.create_module("", "memory:///y").unwrap();
        let mut resolver = |_: Referrer<'_>, specifier: &str| match specifier {
            "./x" => fulfilled(x),
            _ => fulfilled(y),
        };
        graph.link(a, &mut resolver).unwrap();
        graph.link(b, &mut resolver).unwrap();
        graph.instantiate(a).unwrap();
        graph.instantiate(b).unwrap();

        let unit_a = graph.record(a).unwrap().unit();
        let unit_b = graph.record(b).unwrap().unit();
        assert_eq!(graph.resolve_callback(unit_a, "./x"), Ok(x));
        assert_eq!(graph.resolve_callback(unit_b, "./y"), Ok(y));
        assert_eq!(
            graph.resolve_callback(unit_a, "./y"),
            Err(LinkError::UnresolvedSpecifier {
                specifier: "./y".to_string(),
                referrer: "memory:///a".to_string(),
            })
        );

        graph.destroy(a);
        let unit_b = graph.record(b).unwrap().unit();
        assert_eq!(graph.owner_of(unit_b), Some(b));
    }

    #[test]
    fn test_resolve_callback_unknown_referrer() {
        let mut graph = ModuleGraph::with_compiler(shared_id_compiler);
        graph.create_module("./x", "memory:///held").unwrap();

        // Same identity as the held unit, but no record owns this object.
        let stray = fixed_unit(7, "./x", "memory:///stray");
        assert_eq!(graph.owner_of(stray.as_ref()), None);
        assert_eq!(
            graph.resolve_callback(stray.as_ref(), "./x"),
            Err(LinkError::UnknownReferrer(stray.id()))
        );

        let unregistered = fixed_unit(99, "", "memory:///other");
        assert_eq!(
            graph.resolve_callback(unregistered.as_ref(), "./x"),
            Err(LinkError::UnknownReferrer(unregistered.id()))
        );
    }
}
