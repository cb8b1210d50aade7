//! Shared helpers for engine integration tests

#![allow(dead_code)]

use modlink_engine::{
    BindingError, CompileError, CompiledUnit, Compiler, Eventual, Exception, LinkedImports,
    ModuleGraph, ModuleId, Namespace, Referrer, ResolveError, UnitId, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Evaluation log shared by every unit a [`TraceCompiler`] produces
pub type Log = Rc<RefCell<Vec<String>>>;

/// Compiler whose units append their URL to a shared log when evaluated
///
/// Source is line based: `import <specifier>` adds a request, `throw <message>`
/// makes evaluation fail. Anything else is ignored.
#[derive(Default)]
pub struct TraceCompiler {
    pub log: Log,
}

impl TraceCompiler {
    pub fn new() -> (Self, Log) {
        let log = Log::default();
        (Self { log: log.clone() }, log)
    }
}

impl Compiler for TraceCompiler {
    fn compile(&self, source: &str, url: &str) -> Result<Box<dyn CompiledUnit>, CompileError> {
        let mut requests = Vec::new();
        let mut throws = None;
        for line in source.lines().map(str::trim) {
            if let Some(specifier) = line.strip_prefix("import ") {
                requests.push(specifier.trim().to_string());
            } else if let Some(message) = line.strip_prefix("throw") {
                throws = Some(message.trim().to_string());
            }
        }
        Ok(Box::new(TraceUnit {
            id: UnitId::fresh(),
            url: url.to_string(),
            requests,
            throws,
            namespace: Namespace::new(url, Vec::<String>::new()),
            log: self.log.clone(),
        }))
    }
}

#[derive(Debug)]
struct TraceUnit {
    id: UnitId,
    url: String,
    requests: Vec<String>,
    throws: Option<String>,
    namespace: Namespace,
    log: Log,
}

impl CompiledUnit for TraceUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn requests(&self) -> &[String] {
        &self.requests
    }

    fn namespace(&self) -> Namespace {
        self.namespace.clone()
    }

    fn instantiate_self(&mut self, imports: &LinkedImports) -> Result<(), BindingError> {
        for specifier in &self.requests {
            if imports.get(specifier).is_none() {
                return Err(BindingError::Unresolved {
                    specifier: specifier.clone(),
                });
            }
        }
        Ok(())
    }

    fn evaluate_self(&mut self) -> Result<Value, Exception> {
        self.log.borrow_mut().push(self.url.clone());
        match &self.throws {
            Some(message) => Err(Exception::new(message.clone())),
            None => Ok(Value::string(self.url.as_str())),
        }
    }
}

/// URL for a short module name
pub fn url(name: &str) -> String {
    format!("memory:///{}", name)
}

/// Create one module per `(name, source)` pair
pub fn create_all(graph: &mut ModuleGraph, modules: &[(&str, &str)]) -> Vec<ModuleId> {
    modules
        .iter()
        .map(|(name, source)| graph.create_module(source, &url(name)).unwrap())
        .collect()
}

/// Link every module with a resolver that maps a specifier to the module of
/// the same name, counting resolver calls
pub fn link_all(graph: &mut ModuleGraph, names: &[&str], ids: &[ModuleId]) -> Rc<Cell<usize>> {
    let calls = Rc::new(Cell::new(0));
    for &id in ids {
        let counter = calls.clone();
        let mut resolver = |_: Referrer<'_>,
                            specifier: &str|
         -> Result<Eventual<ModuleId>, ResolveError> {
            counter.set(counter.get() + 1);
            names
                .iter()
                .position(|name| *name == specifier)
                .map(|pos| Eventual::fulfilled(ids[pos]))
                .ok_or_else(|| ResolveError::failed(format!("no module named '{}'", specifier)))
        };
        graph.link(id, &mut resolver).unwrap();
    }
    calls
}

/// Create and link a graph in one go
pub fn build(graph: &mut ModuleGraph, modules: &[(&str, &str)]) -> Vec<ModuleId> {
    let ids = create_all(graph, modules);
    let names: Vec<&str> = modules.iter().map(|(name, _)| *name).collect();
    link_all(graph, &names, &ids);
    ids
}
