//! Monkeyxp - a tree-walking interpreter for the Monkey language
//!
//! This crate implements a small dynamically typed expression language with
//! first-class functions, lexical closures, a quote/unquote facility, and
//! user-defined macros that receive their arguments unevaluated as syntax
//! trees.
//!
//! ```text
//! let add = fn(a, b) { a + b };
//! let unless = macro(cond, cons, alt) {
//!     quote(if (!(unquote(cond))) { unquote(cons) } else { unquote(alt) });
//! };
//! unless(add(2, 2) > 5, "not greater", "greater")
//! ```
//!
//! ## Pipeline
//!
//! A source line goes through four stages, each exposed as a public entry
//! point so embedders can drive them separately:
//!
//! 1. [`parser::parse_program`] - source text to an [`ast::Program`]
//! 2. [`macros::define_macros`] - strips macro definitions into the macro
//!    environment
//! 3. [`macros::expand_macros`] - rewrites macro call sites
//! 4. [`evaluator::eval`] - evaluates the rewritten program to a
//!    [`value::Value`]
//!
//! ```
//! use monkeyxp::evaluator::{self, Environment};
//! use monkeyxp::macros;
//! use monkeyxp::parser;
//!
//! let mut program = parser::parse_program("let add = fn(a, b) { a + b }; add(2, 3)").unwrap();
//! let macro_env = Environment::new_root();
//! macros::define_macros(&mut program, &macro_env);
//! let program = macros::expand_macros(program, &macro_env);
//!
//! let result = evaluator::eval(&program, &Environment::new_root()).unwrap();
//! assert_eq!(result.to_string(), "5");
//! ```
//!
//! ## Recursion depth
//!
//! The parser rejects inputs nested deeper than [`MAX_PARSE_DEPTH`], since
//! raw text is untrusted. Evaluation itself is bounded only by the host call
//! stack: a deeply recursive Monkey program can overflow it, exactly like the
//! equivalent deeply recursive Rust program.

use std::fmt;

use crate::ast::{InfixOperator, PrefixOperator};
use crate::value::Kind;

/// Maximum parsing depth to prevent stack overflow from deeply nested input
pub const MAX_PARSE_DEPTH: usize = 64;

/// Categorizes the different kinds of parsing failures.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions).
    /// Errors reported at a position inside the input land here even when
    /// more text could have repaired them, so an unterminated string is
    /// InvalidSyntax at its opening quote, not Incomplete.
    InvalidSyntax,
    /// Input ended exactly where more was required (a missing operand or an
    /// unclosed block at end of input)
    Incomplete,
    /// Nesting exceeded the maximum parse depth
    TooDeeplyNested,
}

/// A structured error describing why a source line failed to parse.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Snippet of the input around the failure point, for display purposes
    pub context: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Create a ParseError with a context snippet extracted from the input
    /// around `error_offset`.
    ///
    /// The window is asymmetric: a little text before the failure point for
    /// orientation, more after it, since the offending token starts at the
    /// offset. Control whitespace is flattened to spaces so the snippet
    /// stays on one line.
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const BEFORE: usize = 16;
        const AFTER: usize = 40;

        let offset = error_offset.min(input.len());
        let mut start = offset.saturating_sub(BEFORE);
        while !input.is_char_boundary(start) {
            start -= 1;
        }
        let mut end = usize::min(offset + AFTER, input.len());
        while !input.is_char_boundary(end) {
            end += 1;
        }

        let mut context = String::new();
        if start > 0 {
            context.push_str("...");
        }
        for ch in input[start..end].chars() {
            context.push(if ch.is_whitespace() { ' ' } else { ch });
        }
        if end < input.len() {
            context.push_str("...");
        }

        ParseError {
            kind,
            message: message.into(),
            context: Some(context),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error: {}", self.message)?;
        if let Some(context) = &self.context {
            write!(f, "\n  near: {context}")?;
        }
        Ok(())
    }
}

/// Failures produced while evaluating a program.
///
/// These propagate through every enclosing sub-evaluation up to the program
/// root, where the driver renders them as `ERROR: <message>`. Division by
/// zero, out-of-range array indexing and hash misses are NOT errors; they
/// evaluate to `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Name bound neither in the environment chain nor in the builtin table
    IdentifierNotFound(String),
    /// Prefix operator applied to an operand kind it is not defined on
    UnknownPrefixOperator(PrefixOperator, Kind),
    /// Infix operator applied to same-kind operands it is not defined on
    UnknownInfixOperator(Kind, InfixOperator, Kind),
    /// Infix operator applied across two different operand kinds
    TypeMismatch(Kind, InfixOperator, Kind),
    /// Call target is not a function or builtin
    NotAFunction(Kind),
    /// Hash key of a kind that is not Integer, Boolean or String
    UnusableHashKey(Kind),
    /// Index operator applied to a collection kind that does not support it
    IndexNotSupported(Kind),
    /// Call or builtin invocation with the wrong number of arguments
    WrongArgumentCount { got: usize, want: usize },
    /// `unquote(...)` produced a value that has no syntax-tree equivalent
    UnquoteUnsupported(Kind),
    /// Free-form diagnostic raised by a builtin function
    Builtin(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::IdentifierNotFound(name) => {
                write!(f, "identifier not found: {name}")
            }
            RuntimeError::UnknownPrefixOperator(operator, right) => {
                write!(f, "unknown operator: {operator}{right}")
            }
            RuntimeError::UnknownInfixOperator(left, operator, right) => {
                write!(f, "unknown operator: {left} {operator} {right}")
            }
            RuntimeError::TypeMismatch(left, operator, right) => {
                write!(f, "type mismatch: {left} {operator} {right}")
            }
            RuntimeError::NotAFunction(kind) => write!(f, "not a function: {kind}"),
            RuntimeError::UnusableHashKey(kind) => write!(f, "unusable as hash key: {kind}"),
            RuntimeError::IndexNotSupported(kind) => {
                write!(f, "index operator not supported: {kind}")
            }
            RuntimeError::WrongArgumentCount { got, want } => {
                write!(f, "wrong number of arguments. got={got}, want={want}")
            }
            RuntimeError::UnquoteUnsupported(kind) => {
                write!(f, "unquote: cannot convert {kind} into an expression")
            }
            RuntimeError::Builtin(message) => write!(f, "{message}"),
        }
    }
}

pub mod ast;
pub mod builtins;
pub mod evaluator;
pub mod macros;
pub mod parser;
pub mod value;
