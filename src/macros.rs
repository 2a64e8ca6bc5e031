//! Macro definition and expansion passes.
//!
//! Macros run between parsing and evaluation. The definition pass pulls
//! `let <name> = macro(...) { ... }` statements out of the program and binds
//! them in a dedicated macro environment; the expansion pass then rewrites
//! every call to a bound macro, handing the macro body its arguments as
//! unevaluated [`Value::Quote`] trees and splicing the quoted result back
//! into the program.
//!
//! Expansion is single-pass and bottom-up: macro calls inside arguments are
//! expanded before the enclosing call, but a macro's own output is never
//! re-expanded. There is no hygiene; names in a macro body resolve against
//! the macro's captured environment at evaluation time.

use std::convert::Infallible;
use std::rc::Rc;

use crate::ast::{self, Expression, Program, Statement};
use crate::evaluator::{self, Env, Environment};
use crate::value::Value;

/// Collect macro definitions from `program` into `macro_env` and strip the
/// defining statements, in place.
pub fn define_macros(program: &mut Program, macro_env: &Env) {
    let mut definitions = Vec::new();
    for (index, statement) in program.statements.iter().enumerate() {
        if is_macro_definition(statement) {
            add_macro(statement, macro_env);
            definitions.push(index);
        }
    }

    // Reverse order keeps the collected indices valid while removing
    for index in definitions.into_iter().rev() {
        program.statements.remove(index);
    }
}

fn is_macro_definition(statement: &Statement) -> bool {
    matches!(
        statement,
        Statement::Let {
            value: Expression::MacroLit { .. },
            ..
        }
    )
}

fn add_macro(statement: &Statement, macro_env: &Env) {
    let Statement::Let {
        name,
        value: Expression::MacroLit { parameters, body },
    } = statement
    else {
        return;
    };

    let macro_value = Value::Macro {
        parameters: parameters.clone(),
        body: body.clone(),
        env: Rc::clone(macro_env),
    };
    macro_env.borrow_mut().set(name.clone(), macro_value);
}

/// Rewrite every macro call site in `program` with the macro's expansion.
///
/// # Panics
///
/// A macro body that does not evaluate to a quoted tree is a programmer
/// error and aborts with "we only support returning AST-nodes from macros".
pub fn expand_macros(program: Program, macro_env: &Env) -> Program {
    let expanded: Result<Program, Infallible> =
        ast::modify_program(program, &mut |node| Ok(expand_call_site(node, macro_env)));
    match expanded {
        Ok(program) => program,
        Err(never) => match never {},
    }
}

fn expand_call_site(node: Expression, macro_env: &Env) -> Expression {
    let Expression::Call {
        function,
        arguments,
    } = &node
    else {
        return node;
    };
    let Expression::Identifier(name) = function.as_ref() else {
        return node;
    };
    let Some(Value::Macro {
        parameters,
        body,
        env,
    }) = macro_env.borrow().get(name)
    else {
        return node;
    };

    if parameters.len() != arguments.len() {
        panic!(
            "macro `{name}` expects {} arguments, got {}",
            parameters.len(),
            arguments.len()
        );
    }

    // Arguments are handed over unevaluated, wrapped as quoted trees
    let expansion_env = Environment::new_enclosed(&env);
    for (parameter, argument) in parameters.iter().zip(arguments) {
        expansion_env
            .borrow_mut()
            .set(parameter.clone(), Value::Quote(argument.clone()));
    }

    match evaluator::eval_block(&body, &expansion_env) {
        Ok(Value::Quote(expansion)) => expansion,
        _ => panic!("we only support returning AST-nodes from macros"),
    }
}
