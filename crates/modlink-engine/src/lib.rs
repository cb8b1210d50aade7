//! Modlink Engine
//!
//! A module dependency-graph engine:
//! - **Units**: the compiled-unit and compiler contracts (`unit` module)
//! - **Script**: a small built-in module language (`script` module)
//! - **Modules**: records, registry, resolution cache, instantiation, and
//!   evaluation (`module` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use modlink_engine::{Eventual, ModuleGraph, Referrer, Value};
//!
//! let mut graph = ModuleGraph::new();
//! let dep = graph.create_module("export let x = 41;", "memory:///dep")?;
//! let main = graph.create_module(r#"import { x } from "./dep"; x + 1;"#, "memory:///main")?;
//!
//! graph.link(dep, &mut |_: Referrer<'_>, _: &str| unreachable!())?;
//! graph.link(main, &mut |_: Referrer<'_>, _: &str| Ok(Eventual::fulfilled(dep)))?;
//! graph.instantiate(main)?;
//! assert_eq!(graph.evaluate(main)?, Value::Int(42));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod module;
pub mod options;
pub mod script;
pub mod unit;

pub use error::{
    BindingError, CompileError, Error, Exception, LinkError, ResolveError, RuntimeError,
};
pub use module::{
    EvalState, Eventual, LinkState, ModuleGraph, ModuleId, ModuleRecord, ModuleRegistry,
    Referrer, Resolver, Settler,
};
pub use options::GraphOptions;
pub use script::ScriptCompiler;
pub use unit::{Binding, CompiledUnit, Compiler, LinkedImports, Namespace, UnitId, Value};
