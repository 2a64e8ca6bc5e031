use std::panic;
use std::process;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use monkeyxp::evaluator::{self, Environment};
use monkeyxp::macros;
use monkeyxp::parser;

const PROMPT: &str = ">> ";

fn main() {
    // A macro body that does not produce a syntax tree aborts the expansion
    // pass; catch the unwind so the user gets the message instead of a trace.
    let result = panic::catch_unwind(run_repl);

    if let Err(panic_info) = result {
        eprintln!("The session hit an unrecoverable error and must exit.");
        if let Some(message) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {message}");
        } else if let Some(message) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {message}");
        } else {
            eprintln!("Error: unknown panic");
        }
        process::exit(1);
    }
}

fn run_repl() {
    println!("Welcome to the Monkey programming language REPL.");
    println!("Enter programs like: let add = fn(a, b) {{ a + b }}; add(2, 3)");
    println!("Press Ctrl+C or Ctrl+D to exit.");
    println!();

    let mut editor = DefaultEditor::new().expect("could not initialize the line editor");

    // Both environments persist across lines, so definitions accumulate
    let env = Environment::new_root();
    let macro_env = Environment::new_root();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                let mut program = match parser::parse_program(line) {
                    Ok(program) => program,
                    Err(error) => {
                        println!("{error}");
                        continue;
                    }
                };

                macros::define_macros(&mut program, &macro_env);
                let program = macros::expand_macros(program, &macro_env);

                match evaluator::eval(&program, &env) {
                    Ok(value) => println!("{value}"),
                    Err(error) => println!("ERROR: {error}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(error) => {
                eprintln!("Input error: {error}");
                break;
            }
        }
    }
}
