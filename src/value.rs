//! Runtime values produced and consumed by the evaluator.
//!
//! [`Value`] is the closed union of everything a program can evaluate to.
//! Its `Display` impl is the rendering the REPL prints. Note two deliberate
//! absences: early-return markers and errors are not values here, they travel
//! on the error side of evaluation results (see the evaluator module), which
//! makes it impossible to ever store one in an environment, array or hash.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{BlockStatement, Expression};
use crate::builtins::Builtin;
use crate::evaluator::Env;

#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    String(String),
    Array(Vec<Value>),
    /// Keyed by [`HashKey`], which carries the full key datum; the key value
    /// is reconstructed from it when rendering
    Hash(HashMap<HashKey, Value>),
    /// User function plus the environment it closes over
    Function {
        parameters: Vec<String>,
        body: BlockStatement,
        env: Env,
    },
    /// Entry in the process-wide builtin registry
    Builtin(&'static Builtin),
    /// Macro body plus its captured environment; only ever bound inside the
    /// macro environment, never produced by evaluation
    Macro {
        parameters: Vec<String>,
        body: BlockStatement,
        env: Env,
    },
    /// A syntax tree as a first-class value, produced by `quote(...)`
    Quote(Expression),
}

/// Discriminant labels for [`Value`], as used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Integer,
    Boolean,
    Null,
    String,
    Array,
    Hash,
    Function,
    Builtin,
    Macro,
    Quote,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Kind::Integer => "INTEGER",
            Kind::Boolean => "BOOLEAN",
            Kind::Null => "NULL",
            Kind::String => "STRING",
            Kind::Array => "ARRAY",
            Kind::Hash => "HASH",
            Kind::Function => "FUNCTION",
            Kind::Builtin => "BUILTIN",
            Kind::Macro => "MACRO",
            Kind::Quote => "QUOTE",
        };
        write!(f, "{label}")
    }
}

/// A hashable key: the kinds admissible on the left of `:` in a hash literal.
///
/// Carrying the full key datum (instead of a precomputed hash code) lets the
/// backing `HashMap` decide membership by equality, so colliding hashes of
/// distinct keys can never alias an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl HashKey {
    /// Rebuild the key value this entry was created from.
    pub fn to_value(&self) -> Value {
        match self {
            HashKey::Integer(value) => Value::Integer(*value),
            HashKey::Boolean(value) => Value::Boolean(*value),
            HashKey::String(value) => Value::String(value.clone()),
        }
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Integer(_) => Kind::Integer,
            Value::Boolean(_) => Kind::Boolean,
            Value::Null => Kind::Null,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Hash(_) => Kind::Hash,
            Value::Function { .. } => Kind::Function,
            Value::Builtin(_) => Kind::Builtin,
            Value::Macro { .. } => Kind::Macro,
            Value::Quote(_) => Kind::Quote,
        }
    }

    pub fn is_hashable(&self) -> bool {
        matches!(
            self,
            Value::Integer(_) | Value::Boolean(_) | Value::String(_)
        )
    }

    /// The hash-table key for this value, defined exactly when
    /// [`Value::is_hashable`] holds.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(value) => Some(HashKey::Integer(*value)),
            Value::Boolean(value) => Some(HashKey::Boolean(*value)),
            Value::String(value) => Some(HashKey::String(value.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Null => write!(f, "null"),
            Value::String(value) => write!(f, "{value}"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Function {
                parameters, body, ..
            } => write!(f, "fn({}) {body}", parameters.join(", ")),
            Value::Builtin(_) => write!(f, "builtin function"),
            Value::Macro {
                parameters, body, ..
            } => write!(f, "macro({}) {body}", parameters.join(", ")),
            Value::Quote(node) => write!(f, "QUOTE({node})"),
        }
    }
}

// Hand-written so the captured environment is elided: closures may be stored
// in their own defining scope, and a derived Debug would chase that cycle.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "Integer({value})"),
            Value::Boolean(value) => write!(f, "Boolean({value})"),
            Value::Null => write!(f, "Null"),
            Value::String(value) => write!(f, "String(\"{value}\")"),
            Value::Array(elements) => f.debug_tuple("Array").field(elements).finish(),
            Value::Hash(pairs) => f.debug_tuple("Hash").field(pairs).finish(),
            Value::Function {
                parameters, body, ..
            } => write!(f, "Function(params={parameters:?}, body={body})"),
            Value::Builtin(builtin) => write!(f, "Builtin({})", builtin.name),
            Value::Macro {
                parameters, body, ..
            } => write!(f, "Macro(params={parameters:?}, body={body})"),
            Value::Quote(node) => write!(f, "Quote({node})"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| other == value))
            }
            (
                Value::Function {
                    parameters: p1,
                    body: b1,
                    env: e1,
                },
                Value::Function {
                    parameters: p2,
                    body: b2,
                    env: e2,
                },
            ) => p1 == p2 && b1 == b2 && Rc::ptr_eq(e1, e2),
            // Builtins are compared by registry identity, not function pointer
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (
                Value::Macro {
                    parameters: p1,
                    body: b1,
                    env: e1,
                },
                Value::Macro {
                    parameters: p2,
                    body: b2,
                    env: e2,
                },
            ) => p1 == p2 && b1 == b2 && Rc::ptr_eq(e1, e2),
            (Value::Quote(a), Value::Quote(b)) => a == b,
            _ => false,
        }
    }
}
