//! Built-in script language
//!
//! A deliberately small module language, enough to express dependency graphs
//! and observe live bindings:
//!
//! ```text
//! import "./side-effect";
//! import * as ns from "./ns";
//! import { a, b as c } from "./named";
//! export let x = c + 1;
//! let greeting = "hello " + ns.name;
//! throw "failed";
//! greeting;   // completion value
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
mod unit;

pub use unit::ScriptUnit;

use crate::error::CompileError;
use crate::unit::{CompiledUnit, Compiler};
use tracing::trace;

/// Compiler for the built-in script language
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompiler;

impl ScriptCompiler {
    /// Create a new script compiler
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for ScriptCompiler {
    fn compile(&self, source: &str, url: &str) -> Result<Box<dyn CompiledUnit>, CompileError> {
        let body = parser::parse(source, url)?;
        let unit = ScriptUnit::new(body, url);
        trace!(url, requests = unit.requests().len(), "compiled script");
        Ok(Box::new(unit))
    }
}
