//! Built-in functions callable by name from evaluated code.
//!
//! The registry is a process-wide, read-only table initialized once through
//! a `LazyLock`. Identifier resolution consults the environment chain first
//! and falls back to [`lookup`] here, so any builtin name can be shadowed by
//! a `let` binding.
//!
//! Builtins operate on already-evaluated values and cannot trigger early
//! returns; they report failures as [`RuntimeError`]s. Argument counts are
//! validated centrally by [`Builtin::apply`] before the implementation runs,
//! so the implementations can index their arguments directly.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::RuntimeError;
use crate::value::Value;

/// An intrinsic function plus its calling convention.
pub struct Builtin {
    /// The identifier this builtin resolves from
    pub name: &'static str,
    /// Exact number of arguments accepted
    pub arity: usize,
    func: fn(&[Value]) -> Result<Value, RuntimeError>,
}

impl Builtin {
    /// Validate the argument count and invoke the implementation.
    pub fn apply(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        if args.len() != self.arity {
            return Err(RuntimeError::WrongArgumentCount {
                got: args.len(),
                want: self.arity,
            });
        }
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

fn expect_array<'a>(value: &'a Value, name: &str) -> Result<&'a [Value], RuntimeError> {
    match value {
        Value::Array(elements) => Ok(elements),
        other => Err(RuntimeError::Builtin(format!(
            "argument to `{name}` must be ARRAY, got {}",
            other.kind()
        ))),
    }
}

fn builtin_len(args: &[Value]) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::String(value) => Ok(Value::Integer(value.len() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
        other => Err(RuntimeError::Builtin(format!(
            "argument to `len` not supported, got {}",
            other.kind()
        ))),
    }
}

fn builtin_first(args: &[Value]) -> Result<Value, RuntimeError> {
    let elements = expect_array(&args[0], "first")?;
    Ok(elements.first().cloned().unwrap_or(Value::Null))
}

fn builtin_last(args: &[Value]) -> Result<Value, RuntimeError> {
    let elements = expect_array(&args[0], "last")?;
    Ok(elements.last().cloned().unwrap_or(Value::Null))
}

fn builtin_rest(args: &[Value]) -> Result<Value, RuntimeError> {
    let elements = expect_array(&args[0], "rest")?;
    match elements {
        [] => Ok(Value::Null),
        [_, rest @ ..] => Ok(Value::Array(rest.to_vec())),
    }
}

fn builtin_push(args: &[Value]) -> Result<Value, RuntimeError> {
    let elements = expect_array(&args[0], "push")?;
    let mut extended = elements.to_vec();
    extended.push(args[1].clone());
    Ok(Value::Array(extended))
}

static BUILTINS: LazyLock<Vec<Builtin>> = LazyLock::new(|| {
    vec![
        Builtin {
            name: "len",
            arity: 1,
            func: builtin_len,
        },
        Builtin {
            name: "first",
            arity: 1,
            func: builtin_first,
        },
        Builtin {
            name: "last",
            arity: 1,
            func: builtin_last,
        },
        Builtin {
            name: "rest",
            arity: 1,
            func: builtin_rest,
        },
        Builtin {
            name: "push",
            arity: 2,
            func: builtin_push,
        },
    ]
});

/// Lazy static map from name to registry entry (private - use lookup)
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static Builtin>> = LazyLock::new(|| {
    let builtins: &'static [Builtin] = BUILTINS.as_slice();
    builtins.iter().map(|builtin| (builtin.name, builtin)).collect()
});

/// Find a builtin by the identifier it is callable as.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTIN_INDEX.get(name).copied()
}
