//! Script syntax tree

use std::rc::Rc;

/// Top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `import ... "specifier";`
    Import(ImportDecl),
    /// `[export] let name = init;`
    Let {
        /// Bound name
        name: String,
        /// Whether the binding is exported
        exported: bool,
        /// Initializer
        init: Expr,
    },
    /// `throw value;`
    Throw(Expr),
    /// `expr;`
    Expr(Expr),
}

/// Import declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Specifier as written
    pub specifier: String,
    /// What the declaration binds
    pub clause: ImportClause,
}

/// Bindings introduced by an import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportClause {
    /// `import "x";`
    Bare,
    /// `import * as ns from "x";`
    Namespace(String),
    /// `import { a, b as c } from "x";`
    Named(Vec<ImportSpecifier>),
}

/// One `name` or `name as local` entry of a named import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    /// Export name in the dependency
    pub imported: String,
    /// Local binding name
    pub local: String,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal
    Int(i64),
    /// String literal
    Str(Rc<str>),
    /// Boolean literal
    Bool(bool),
    /// Binding reference
    Ident(String),
    /// `object.property`
    Member(Box<Expr>, String),
    /// `left + right`
    Add(Box<Expr>, Box<Expr>),
}
