//! Recursive-descent parser for the script language.

use super::ast::{Expr, ImportClause, ImportDecl, ImportSpecifier, Stmt};
use super::lexer::{tokenize, Token};
use crate::error::CompileError;
use rustc_hash::FxHashSet;
use std::ops::Range;

/// Maximum depth of an expression tree
///
/// Parentheses, `+` operands and `.` accesses each add a level.
const MAX_NESTING: usize = 128;

/// Parse `source` into a list of statements
pub fn parse(source: &str, url: &str) -> Result<Vec<Stmt>, CompileError> {
    let tokens = tokenize(source, url)?;
    let mut parser = Parser {
        source,
        url,
        tokens,
        pos: 0,
        nesting: 0,
        bound: FxHashSet::default(),
    };
    let mut body = Vec::new();
    while !parser.at_end() {
        body.push(parser.statement()?);
    }
    Ok(body)
}

struct Parser<'a> {
    source: &'a str,
    url: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    nesting: usize,
    /// Top-level names bound so far
    bound: FxHashSet<String>,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::at_offset(self.url, self.source, self.offset(), message)
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = match self.peek() {
            Some(token) => token.describe(),
            None => "end of input".to_string(),
        };
        self.error(format!("expected {}, found {}", expected, found))
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), CompileError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&expected.describe()))
        }
    }

    fn ident(&mut self) -> Result<String, CompileError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parse an identifier that introduces a top-level binding
    fn binding(&mut self) -> Result<String, CompileError> {
        let offset = self.offset();
        let name = self.ident()?;
        if !self.bound.insert(name.clone()) {
            return Err(CompileError::at_offset(
                self.url,
                self.source,
                offset,
                format!("duplicate binding '{}'", name),
            ));
        }
        Ok(name)
    }

    fn string(&mut self) -> Result<String, CompileError> {
        match self.peek() {
            Some(Token::Str(s)) => {
                let s = s.clone();
                self.pos += 1;
                Ok(s)
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    fn statement(&mut self) -> Result<Stmt, CompileError> {
        match self.peek() {
            Some(Token::Import) => {
                self.pos += 1;
                let decl = self.import_decl()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::Import(decl))
            }
            Some(Token::Export) => {
                self.pos += 1;
                if self.peek() != Some(&Token::Let) {
                    return Err(self.unexpected("'let'"));
                }
                self.let_decl(true)
            }
            Some(Token::Let) => self.let_decl(false),
            Some(Token::Throw) => {
                self.pos += 1;
                let value = self.expression()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::Throw(value))
            }
            _ => {
                let expr = self.expression()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn import_decl(&mut self) -> Result<ImportDecl, CompileError> {
        let clause = match self.peek() {
            Some(Token::Str(_)) => {
                let specifier = self.string()?;
                return Ok(ImportDecl {
                    specifier,
                    clause: ImportClause::Bare,
                });
            }
            Some(Token::Star) => {
                self.pos += 1;
                self.expect(&Token::As)?;
                ImportClause::Namespace(self.binding()?)
            }
            Some(Token::LBrace) => {
                self.pos += 1;
                let mut names = Vec::new();
                while !self.eat(&Token::RBrace) {
                    let (imported, local) = match self.tokens.get(self.pos + 1) {
                        Some((Token::As, _)) => {
                            let imported = self.ident()?;
                            self.pos += 1;
                            (imported, self.binding()?)
                        }
                        _ => {
                            let local = self.binding()?;
                            (local.clone(), local)
                        }
                    };
                    names.push(ImportSpecifier { imported, local });
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::RBrace)?;
                        break;
                    }
                }
                ImportClause::Named(names)
            }
            _ => return Err(self.unexpected("string literal, '*' or '{'")),
        };
        self.expect(&Token::From)?;
        let specifier = self.string()?;
        Ok(ImportDecl { specifier, clause })
    }

    fn let_decl(&mut self, exported: bool) -> Result<Stmt, CompileError> {
        self.expect(&Token::Let)?;
        let name = self.binding()?;
        self.expect(&Token::Eq)?;
        let init = self.expression()?;
        self.expect(&Token::Semi)?;
        Ok(Stmt::Let {
            name,
            exported,
            init,
        })
    }

    /// Enter one more level of the expression tree
    fn descend(&mut self) -> Result<(), CompileError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error("expression nesting too deep"));
        }
        self.nesting += 1;
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, CompileError> {
        let base = self.nesting;
        let mut left = self.postfix()?;
        while self.eat(&Token::Plus) {
            self.descend()?;
            let right = self.postfix()?;
            left = Expr::Add(Box::new(left), Box::new(right));
        }
        self.nesting = base;
        Ok(left)
    }

    fn postfix(&mut self) -> Result<Expr, CompileError> {
        let base = self.nesting;
        let mut expr = self.primary()?;
        while self.eat(&Token::Dot) {
            self.descend()?;
            let property = self.ident()?;
            expr = Expr::Member(Box::new(expr), property);
        }
        self.nesting = base;
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, CompileError> {
        match self.peek() {
            Some(Token::Int(_)) | Some(Token::Str(_)) | Some(Token::True) | Some(Token::False)
            | Some(Token::Ident(_)) => {}
            Some(Token::LParen) => {
                self.descend()?;
                self.pos += 1;
                let inner = self.expression()?;
                self.nesting -= 1;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("expression")),
        }
        match self.bump() {
            Some(Token::Int(n)) => Ok(Expr::Int(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s.into())),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            _ => Err(self.unexpected("expression")),
        }
    }
}
