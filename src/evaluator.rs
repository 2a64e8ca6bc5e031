//! Core expression evaluation engine.
//!
//! Evaluation walks the syntax tree recursively against an [`Environment`]
//! chain. Internal results are `Result<Value, Interrupt>`: the `?` operator
//! carries both runtime errors (which unwind to the program root) and early
//! `return`s (which unwind to the nearest function-call boundary, where
//! [`apply_function`] catches them). The public entry [`eval`] exposes plain
//! `Result<Value, RuntimeError>` to drivers.
//!
//! `quote(...)` call sites are dispatched on the callee's spelling before any
//! environment lookup, so rebinding the name `quote` does not disable the
//! special form. The same holds for `unquote(...)` inside a quoted tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::RuntimeError;
use crate::ast::{
    self, BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::builtins;
use crate::value::{Kind, Value};

/// Shared handle to a scope.
///
/// Closures keep their defining scope alive through this handle, and several
/// closures may share one scope. A function stored in its own defining
/// environment forms a reference cycle; such cycles are valid and simply
/// outlive the last user.
pub type Env = Rc<RefCell<Environment>>;

/// Name-to-value bindings with an optional enclosing scope.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    outer: Option<Env>,
}

impl Environment {
    /// Create an empty top-level scope.
    pub fn new_root() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Create an empty scope enclosed by `outer`.
    pub fn new_enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Resolve `name`, consulting the local bindings first and then the
    /// enclosing chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings
            .get(name)
            .cloned()
            .or_else(|| self.outer.as_ref().and_then(|outer| outer.borrow().get(name)))
    }

    /// Bind `name` locally. Never writes through to an enclosing scope, so a
    /// `let` inside a function shadows instead of mutating.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }
}

/// Non-local exits raised during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// An executed `return`, unwinding to the nearest call boundary
    Return(Value),
    /// A runtime error, unwinding to the program root
    Error(RuntimeError),
}

impl From<RuntimeError> for Interrupt {
    fn from(error: RuntimeError) -> Self {
        Interrupt::Error(error)
    }
}

type Outcome = Result<Value, Interrupt>;

/// Evaluate a full program against `env` (public API).
///
/// The program's value is the last value-producing statement's value
/// (`Value::Null` if there is none). A top-level `return` terminates the
/// program early with its operand.
pub fn eval(program: &Program, env: &Env) -> Result<Value, RuntimeError> {
    let mut result = Value::Null;
    for statement in &program.statements {
        match eval_statement(statement, env) {
            Ok(Some(value)) => result = value,
            Ok(None) => {}
            Err(Interrupt::Return(value)) => return Ok(value),
            Err(Interrupt::Error(error)) => return Err(error),
        }
    }
    Ok(result)
}

/// Evaluate a block, propagating `return` interrupts to the caller.
pub(crate) fn eval_block(block: &BlockStatement, env: &Env) -> Outcome {
    let mut result = Value::Null;
    for statement in &block.statements {
        if let Some(value) = eval_statement(statement, env)? {
            result = value;
        }
    }
    Ok(result)
}

/// `let` yields no value, so the enclosing block retains its previous result.
fn eval_statement(statement: &Statement, env: &Env) -> Result<Option<Value>, Interrupt> {
    match statement {
        Statement::Let { name, value } => {
            let value = eval_expression(value, env)?;
            env.borrow_mut().set(name.clone(), value);
            Ok(None)
        }
        Statement::Return(value) => {
            let value = eval_expression(value, env)?;
            Err(Interrupt::Return(value))
        }
        Statement::Expression(expression) => Ok(Some(eval_expression(expression, env)?)),
    }
}

fn eval_expression(expression: &Expression, env: &Env) -> Outcome {
    match expression {
        Expression::Integer(value) => Ok(Value::Integer(*value)),
        Expression::Boolean(value) => Ok(Value::Boolean(*value)),
        Expression::StringLit(value) => Ok(Value::String(value.clone())),
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env)?;
            eval_prefix(*operator, right)
        }
        Expression::Infix {
            operator,
            left,
            right,
        } => {
            let left = eval_expression(left, env)?;
            let right = eval_expression(right, env)?;
            eval_infix(*operator, left, right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env)?;
            if is_truthy(&condition) {
                eval_block(consequence, env)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, env)
            } else {
                Ok(Value::Null)
            }
        }
        Expression::Function { parameters, body } => Ok(Value::Function {
            parameters: parameters.clone(),
            body: body.clone(),
            env: Rc::clone(env),
        }),
        Expression::Call {
            function,
            arguments,
        } => eval_call(function, arguments, env),
        Expression::Array(elements) => Ok(Value::Array(eval_expressions(elements, env)?)),
        Expression::Index { left, index } => {
            let left = eval_expression(left, env)?;
            let index = eval_expression(index, env)?;
            eval_index(left, index)
        }
        Expression::Hash(pairs) => eval_hash_literal(pairs, env),
        // A macro literal outside a `let` never reaches the macro environment
        // and cannot be applied
        Expression::MacroLit { .. } => Err(RuntimeError::NotAFunction(Kind::Macro).into()),
    }
}

fn eval_identifier(name: &str, env: &Env) -> Outcome {
    if let Some(value) = env.borrow().get(name) {
        return Ok(value);
    }
    if let Some(builtin) = builtins::lookup(name) {
        return Ok(Value::Builtin(builtin));
    }
    Err(RuntimeError::IdentifierNotFound(name.to_string()).into())
}

/// Every value except `null` and `false` counts as true in conditions.
fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Boolean(false))
}

fn eval_prefix(operator: PrefixOperator, right: Value) -> Outcome {
    match operator {
        PrefixOperator::Bang => Ok(Value::Boolean(!is_truthy(&right))),
        PrefixOperator::Minus => match right {
            Value::Integer(value) => Ok(Value::Integer(value.wrapping_neg())),
            other => Err(RuntimeError::UnknownPrefixOperator(operator, other.kind()).into()),
        },
    }
}

fn eval_infix(operator: InfixOperator, left: Value, right: Value) -> Outcome {
    match (left, right) {
        (Value::Integer(left), Value::Integer(right)) => {
            Ok(eval_integer_infix(operator, left, right))
        }
        (Value::String(left), Value::String(right)) => eval_string_infix(operator, left, right),
        (left, right) => match operator {
            // Equality between the remaining kinds is singleton identity:
            // booleans and null compare by content, everything else is
            // unequal even to itself
            InfixOperator::Equal => Ok(Value::Boolean(singleton_eq(&left, &right))),
            InfixOperator::NotEqual => Ok(Value::Boolean(!singleton_eq(&left, &right))),
            _ if left.kind() != right.kind() => {
                Err(RuntimeError::TypeMismatch(left.kind(), operator, right.kind()).into())
            }
            _ => Err(RuntimeError::UnknownInfixOperator(left.kind(), operator, right.kind()).into()),
        },
    }
}

fn eval_integer_infix(operator: InfixOperator, left: i64, right: i64) -> Value {
    match operator {
        InfixOperator::Plus => Value::Integer(left.wrapping_add(right)),
        InfixOperator::Minus => Value::Integer(left.wrapping_sub(right)),
        InfixOperator::Asterisk => Value::Integer(left.wrapping_mul(right)),
        InfixOperator::Slash => {
            if right == 0 {
                Value::Null
            } else {
                Value::Integer(left.wrapping_div(right))
            }
        }
        InfixOperator::LessThan => Value::Boolean(left < right),
        InfixOperator::GreaterThan => Value::Boolean(left > right),
        InfixOperator::Equal => Value::Boolean(left == right),
        InfixOperator::NotEqual => Value::Boolean(left != right),
    }
}

fn eval_string_infix(operator: InfixOperator, left: String, right: String) -> Outcome {
    match operator {
        InfixOperator::Plus => Ok(Value::String(left + &right)),
        _ => Err(RuntimeError::UnknownInfixOperator(Kind::String, operator, Kind::String).into()),
    }
}

fn singleton_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Boolean(left), Value::Boolean(right)) => left == right,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

fn eval_call(function: &Expression, arguments: &[Expression], env: &Env) -> Outcome {
    // The quote special form receives its argument unevaluated; the dispatch
    // is on the callee's spelling, not on what `quote` resolves to
    if let Expression::Identifier(name) = function
        && name == "quote"
    {
        return eval_quote(arguments, env);
    }
    let callee = eval_expression(function, env)?;
    let args = eval_expressions(arguments, env)?;
    apply_function(callee, args)
}

/// Evaluate left-to-right; the first error aborts the whole list.
fn eval_expressions(expressions: &[Expression], env: &Env) -> Result<Vec<Value>, Interrupt> {
    expressions
        .iter()
        .map(|expression| eval_expression(expression, env))
        .collect()
}

fn apply_function(callee: Value, args: Vec<Value>) -> Outcome {
    match callee {
        Value::Function {
            parameters,
            body,
            env,
        } => {
            if parameters.len() != args.len() {
                return Err(RuntimeError::WrongArgumentCount {
                    got: args.len(),
                    want: parameters.len(),
                }
                .into());
            }

            let call_env = Environment::new_enclosed(&env);
            for (parameter, arg) in parameters.iter().zip(args) {
                call_env.borrow_mut().set(parameter.clone(), arg);
            }

            // The call boundary is where a `return` stops unwinding
            match eval_block(&body, &call_env) {
                Err(Interrupt::Return(value)) => Ok(value),
                other => other,
            }
        }
        Value::Builtin(builtin) => builtin.apply(&args).map_err(Interrupt::from),
        other => Err(RuntimeError::NotAFunction(other.kind()).into()),
    }
}

fn eval_index(left: Value, index: Value) -> Outcome {
    match (left, index) {
        (Value::Array(elements), Value::Integer(index)) => {
            let element = usize::try_from(index)
                .ok()
                .and_then(|index| elements.get(index).cloned());
            Ok(element.unwrap_or(Value::Null))
        }
        (Value::Hash(pairs), index) => {
            let key = index
                .hash_key()
                .ok_or_else(|| RuntimeError::UnusableHashKey(index.kind()))?;
            Ok(pairs.get(&key).cloned().unwrap_or(Value::Null))
        }
        (left, _) => Err(RuntimeError::IndexNotSupported(left.kind()).into()),
    }
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Env) -> Outcome {
    let mut entries = HashMap::new();
    for (key_expression, value_expression) in pairs {
        let key_value = eval_expression(key_expression, env)?;
        let key = key_value
            .hash_key()
            .ok_or_else(|| RuntimeError::UnusableHashKey(key_value.kind()))?;
        let value = eval_expression(value_expression, env)?;
        entries.insert(key, value);
    }
    Ok(Value::Hash(entries))
}

/// Evaluate a `quote(...)` call site: resolve embedded `unquote(...)` calls,
/// then wrap the resulting tree as a value.
fn eval_quote(arguments: &[Expression], env: &Env) -> Outcome {
    let [argument] = arguments else {
        return Err(RuntimeError::WrongArgumentCount {
            got: arguments.len(),
            want: 1,
        }
        .into());
    };
    let node = process_unquotes(argument.clone(), env)?;
    Ok(Value::Quote(node))
}

/// Walk a quoted tree and substitute every `unquote(<expr>)` call with the
/// syntax-tree equivalent of `<expr>` evaluated in the current environment.
fn process_unquotes(expression: Expression, env: &Env) -> Result<Expression, Interrupt> {
    ast::modify_expression(expression, &mut |node| match node {
        Expression::Call {
            ref function,
            ref arguments,
        } if matches!(function.as_ref(), Expression::Identifier(name) if name == "unquote")
            && arguments.len() == 1 =>
        {
            let value = eval_expression(&arguments[0], env)?;
            convert_to_ast(value).map_err(Interrupt::from)
        }
        other => Ok(other),
    })
}

/// Re-materialize an evaluated value as a syntax-tree node.
fn convert_to_ast(value: Value) -> Result<Expression, RuntimeError> {
    match value {
        Value::Integer(value) => Ok(Expression::Integer(value)),
        Value::Boolean(value) => Ok(Expression::Boolean(value)),
        // Splicing: a quoted tree drops back in as-is
        Value::Quote(node) => Ok(node),
        other => Err(RuntimeError::UnquoteUnsupported(other.kind())),
    }
}
