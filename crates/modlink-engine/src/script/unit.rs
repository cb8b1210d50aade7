//! Compiled script units

use super::ast::{Expr, ImportClause, Stmt};
use crate::error::{BindingError, Exception};
use crate::unit::{Binding, CompiledUnit, LinkedImports, Namespace, UnitId, Value};
use rustc_hash::FxHashMap;

/// What a top-level name refers to
#[derive(Debug, Clone)]
enum Declared {
    /// Non-exported `let`
    Local,
    /// `export let`, stored in the unit's own namespace
    Exported,
    /// `import * as name from "specifier"`
    NamespaceImport { specifier: String },
    /// `import { imported as name } from "specifier"`
    NamedImport { specifier: String, imported: String },
}

/// An import bound during instantiation
#[derive(Debug, Clone)]
enum ImportedBinding {
    Namespace(Namespace),
    Live { namespace: Namespace, name: String },
}

/// A compiled script module
#[derive(Debug)]
pub struct ScriptUnit {
    id: UnitId,
    url: String,
    requests: Vec<String>,
    body: Vec<Stmt>,
    namespace: Namespace,
    declared: FxHashMap<String, Declared>,
    locals: FxHashMap<String, Value>,
    imports: FxHashMap<String, ImportedBinding>,
}

impl ScriptUnit {
    /// Build a unit from a parsed body
    ///
    /// The parser has already rejected duplicate top-level bindings.
    pub fn new(body: Vec<Stmt>, url: &str) -> Self {
        let mut requests = Vec::new();
        let mut exports = Vec::new();
        let mut declared = FxHashMap::default();

        for stmt in &body {
            match stmt {
                Stmt::Import(decl) => {
                    requests.push(decl.specifier.clone());
                    match &decl.clause {
                        ImportClause::Bare => {}
                        ImportClause::Namespace(local) => {
                            declared.insert(
                                local.clone(),
                                Declared::NamespaceImport {
                                    specifier: decl.specifier.clone(),
                                },
                            );
                        }
                        ImportClause::Named(names) => {
                            for spec in names {
                                declared.insert(
                                    spec.local.clone(),
                                    Declared::NamedImport {
                                        specifier: decl.specifier.clone(),
                                        imported: spec.imported.clone(),
                                    },
                                );
                            }
                        }
                    }
                }
                Stmt::Let { name, exported, .. } => {
                    if *exported {
                        exports.push(name.clone());
                        declared.insert(name.clone(), Declared::Exported);
                    } else {
                        declared.insert(name.clone(), Declared::Local);
                    }
                }
                Stmt::Throw(_) | Stmt::Expr(_) => {}
            }
        }

        Self {
            id: UnitId::fresh(),
            url: url.to_string(),
            requests,
            body,
            namespace: Namespace::new(url, exports),
            declared,
            locals: FxHashMap::default(),
            imports: FxHashMap::default(),
        }
    }

    /// URL the unit was compiled for
    pub fn url(&self) -> &str {
        &self.url
    }

    fn read(&self, name: &str) -> Result<Value, Exception> {
        let uninitialized =
            || Exception::new(format!("cannot access '{}' before initialization", name));
        match self.declared.get(name) {
            None => Err(Exception::new(format!("'{}' is not defined", name))),
            Some(Declared::Local) => match self.locals.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(uninitialized()),
            },
            Some(Declared::Exported) => match self.namespace.lookup(name) {
                Binding::Ready(value) => Ok(value),
                _ => Err(uninitialized()),
            },
            Some(Declared::NamespaceImport { .. }) | Some(Declared::NamedImport { .. }) => {
                match self.imports.get(name) {
                    Some(ImportedBinding::Namespace(ns)) => Ok(Value::Namespace(ns.clone())),
                    Some(ImportedBinding::Live { namespace, name }) => {
                        match namespace.lookup(name) {
                            Binding::Ready(value) => Ok(value),
                            Binding::Uninitialized => Err(uninitialized()),
                            Binding::Missing => Ok(Value::Undefined),
                        }
                    }
                    None => Err(uninitialized()),
                }
            }
        }
    }

    fn run(&mut self, body: &[Stmt]) -> Result<Value, Exception> {
        let mut completion = Value::Undefined;
        for stmt in body {
            match stmt {
                Stmt::Import(_) => {}
                Stmt::Let {
                    name,
                    exported,
                    init,
                } => {
                    let value = self.eval(init)?;
                    if *exported {
                        self.namespace.initialize(name, value);
                    } else {
                        self.locals.insert(name.clone(), value);
                    }
                }
                Stmt::Throw(expr) => {
                    let value = self.eval(expr)?;
                    return Err(Exception::new(value.to_string()));
                }
                Stmt::Expr(expr) => completion = self.eval(expr)?,
            }
        }
        Ok(completion)
    }

    fn eval(&self, expr: &Expr) -> Result<Value, Exception> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Ident(name) => self.read(name),
            Expr::Member(object, property) => match self.eval(object)? {
                Value::Namespace(ns) => match ns.lookup(property) {
                    Binding::Ready(value) => Ok(value),
                    Binding::Uninitialized => Err(Exception::new(format!(
                        "cannot access '{}' before initialization",
                        property
                    ))),
                    Binding::Missing => Ok(Value::Undefined),
                },
                other => Err(Exception::new(format!(
                    "cannot read property '{}' of {}",
                    property,
                    other.type_name()
                ))),
            },
            Expr::Add(left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                match (&left, &right) {
                    (Value::Int(a), Value::Int(b)) => a
                        .checked_add(*b)
                        .map(Value::Int)
                        .ok_or_else(|| Exception::new("integer overflow")),
                    (Value::Str(_), _) | (_, Value::Str(_)) => {
                        Ok(Value::string(format!("{}{}", left, right)))
                    }
                    _ => Err(Exception::new(format!(
                        "cannot add {} and {}",
                        left.type_name(),
                        right.type_name()
                    ))),
                }
            }
        }
    }
}

impl CompiledUnit for ScriptUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn requests(&self) -> &[String] {
        &self.requests
    }

    fn namespace(&self) -> Namespace {
        self.namespace.clone()
    }

    fn instantiate_self(&mut self, linked: &LinkedImports) -> Result<(), BindingError> {
        let mut imports = FxHashMap::default();
        for specifier in &self.requests {
            if linked.get(specifier).is_none() {
                return Err(BindingError::Unresolved {
                    specifier: specifier.clone(),
                });
            }
        }
        for (local, what) in &self.declared {
            let binding = match what {
                Declared::NamespaceImport { specifier } => {
                    let ns = linked.get(specifier).ok_or_else(|| BindingError::Unresolved {
                        specifier: specifier.clone(),
                    })?;
                    ImportedBinding::Namespace(ns.clone())
                }
                Declared::NamedImport {
                    specifier,
                    imported,
                } => {
                    let ns = linked.get(specifier).ok_or_else(|| BindingError::Unresolved {
                        specifier: specifier.clone(),
                    })?;
                    if !ns.has(imported) {
                        return Err(BindingError::MissingExport {
                            specifier: specifier.clone(),
                            name: imported.clone(),
                        });
                    }
                    ImportedBinding::Live {
                        namespace: ns.clone(),
                        name: imported.clone(),
                    }
                }
                Declared::Local | Declared::Exported => continue,
            };
            imports.insert(local.clone(), binding);
        }
        self.imports = imports;
        Ok(())
    }

    fn evaluate_self(&mut self) -> Result<Value, Exception> {
        self.locals.clear();
        let body = std::mem::take(&mut self.body);
        let result = self.run(&body);
        self.body = body;
        result
    }
}
