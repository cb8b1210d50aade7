//! Lexer for the script language.
//!
//! Built on logos; every token keeps its byte span so the parser can report
//! line and column.

use crate::error::CompileError;
use logos::Logos;
use std::ops::Range;

/// Script tokens
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Keywords (must come before identifiers)
    #[token("import")]
    Import,

    #[token("export")]
    Export,

    #[token("from")]
    From,

    #[token("as")]
    As,

    #[token("let")]
    Let,

    #[token("throw")]
    Throw,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Punctuation
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(";")]
    Semi,

    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("=")]
    Eq,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\\n]|\\.)*""#, unquote)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, unquote)]
    Str(String),

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl Token {
    /// Short description used in "expected ..., found ..." messages
    pub fn describe(&self) -> String {
        match self {
            Token::Import => "'import'".to_string(),
            Token::Export => "'export'".to_string(),
            Token::From => "'from'".to_string(),
            Token::As => "'as'".to_string(),
            Token::Let => "'let'".to_string(),
            Token::Throw => "'throw'".to_string(),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Semi => "';'".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Eq => "'='".to_string(),
            Token::Int(n) => format!("integer {}", n),
            Token::Str(s) => format!("string {:?}", s),
            Token::Ident(name) => format!("identifier '{}'", name),
        }
    }
}

/// Strip the quotes from a string literal and resolve escapes
fn unquote(lex: &mut logos::Lexer<'_, Token>) -> Option<String> {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            _ => return None,
        }
    }
    Some(out)
}

/// Tokenize `source`, keeping byte spans
pub fn tokenize(source: &str, url: &str) -> Result<Vec<(Token, Range<usize>)>, CompileError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let slice = lexer.slice();
                let message = if slice.starts_with('"') || slice.starts_with('\'') {
                    if slice.len() >= 2 && slice.ends_with(&slice[..1]) {
                        "invalid escape sequence in string literal".to_string()
                    } else {
                        "unterminated string literal".to_string()
                    }
                } else if !slice.is_empty() && slice.bytes().all(|b| b.is_ascii_digit()) {
                    "integer literal out of range".to_string()
                } else {
                    format!("unexpected character '{}'", slice.chars().next().unwrap_or('?'))
                };
                return Err(CompileError::at_offset(url, source, span.start, message));
            }
        }
    }

    Ok(tokens)
}
