//! Source text to syntax tree.
//!
//! The parser works directly on `&str` with nom combinators; token rules
//! (identifier charset, keywords, integer and string syntax) are folded into
//! the grammar rather than split into a separate lexer. Expressions are
//! parsed by precedence climbing: each recursion carries the minimum
//! precedence it may consume, and postfix call/index applications bind
//! tightest.
//!
//! Every recursive entry point threads an explicit depth counter checked
//! against [`MAX_PARSE_DEPTH`], so hostile nesting fails with a
//! [`ParseError`] instead of exhausting the stack.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{opt, value},
    error::ErrorKind,
    multi::separated_list0,
    sequence::preceded,
};

use crate::ast::{
    BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::{MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Binding strength of each operator position, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

/// Identifiers that are reserved words of the language.
const KEYWORDS: &[&str] = &[
    "let", "fn", "return", "if", "else", "true", "false", "macro",
];

/// Parse a complete program from source text.
pub fn parse_program(input: &str) -> Result<Program, ParseError> {
    match program(input) {
        Ok((_, program)) => Ok(program),
        Err(error) => Err(nom_error_to_parse_error(input, error)),
    }
}

fn program(input: &str) -> IResult<&str, Program> {
    let mut statements = Vec::new();
    let (mut rest, _) = multispace0.parse(input)?;
    while !rest.is_empty() {
        let (next, parsed) = statement(rest, 0)?;
        statements.push(parsed);
        let (next, _) = multispace0.parse(next)?;
        rest = next;
    }
    Ok((rest, Program { statements }))
}

/// Convert a nom failure into a user-facing message with an input snippet.
fn nom_error_to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::new(
                    ParseErrorKind::TooDeeplyNested,
                    format!("program too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                _ if offset >= input.len() => {
                    ParseError::new(ParseErrorKind::Incomplete, "unexpected end of input")
                }
                _ => ParseError::with_context(
                    ParseErrorKind::InvalidSyntax,
                    "invalid syntax",
                    input,
                    offset,
                ),
            }
        }
        nom::Err::Incomplete(_) => ParseError::new(ParseErrorKind::Incomplete, "incomplete input"),
    }
}

fn syntax_error<T>(input: &str, code: ErrorKind) -> IResult<&str, T> {
    Err(nom::Err::Error(nom::error::Error::new(input, code)))
}

/// A run of identifier characters: ASCII letters and underscores only
/// (digits are not identifier characters in this language).
fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic() || c == '_').parse(input)
}

/// Match one specific reserved word, without matching a longer identifier
/// that merely starts with it.
fn keyword<'a>(expected: &'static str, input: &'a str) -> IResult<&'a str, &'a str> {
    let (rest, candidate) = word(input)?;
    if candidate == expected {
        Ok((rest, candidate))
    } else {
        syntax_error(input, ErrorKind::Tag)
    }
}

/// An identifier name; reserved words are rejected.
fn identifier_name(input: &str) -> IResult<&str, String> {
    let (rest, candidate) = word(input)?;
    if KEYWORDS.contains(&candidate) {
        syntax_error(input, ErrorKind::Alpha)
    } else {
        Ok((rest, candidate.to_string()))
    }
}

fn statement(input: &str, depth: usize) -> IResult<&str, Statement> {
    let (input, parsed) = alt((
        |i| let_statement(i, depth),
        |i| return_statement(i, depth),
        |i| expression_statement(i, depth),
    ))
    .parse(input)?;

    // Statement terminators are optional
    let (input, _) = opt(preceded(multispace0, char(';'))).parse(input)?;
    Ok((input, parsed))
}

fn let_statement(input: &str, depth: usize) -> IResult<&str, Statement> {
    let (input, _) = keyword("let", input)?;
    let (input, name) = preceded(multispace0, identifier_name).parse(input)?;
    let (input, _) = preceded(multispace0, char('=')).parse(input)?;
    let (input, value) = expression(input, Precedence::Lowest, depth + 1)?;
    Ok((input, Statement::Let { name, value }))
}

fn return_statement(input: &str, depth: usize) -> IResult<&str, Statement> {
    let (input, _) = keyword("return", input)?;
    let (input, value) = expression(input, Precedence::Lowest, depth + 1)?;
    Ok((input, Statement::Return(value)))
}

fn expression_statement(input: &str, depth: usize) -> IResult<&str, Statement> {
    let (input, expression) = expression(input, Precedence::Lowest, depth)?;
    Ok((input, Statement::Expression(expression)))
}

/// Precedence-climbing core: parse one operand, then fold in every infix or
/// postfix continuation that binds tighter than `min_precedence`.
fn expression(input: &str, min_precedence: Precedence, depth: usize) -> IResult<&str, Expression> {
    if depth >= MAX_PARSE_DEPTH {
        // Failure, not Error: backtracking must not shadow the depth limit
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    let (input, _) = multispace0.parse(input)?;
    let (mut input, mut left) = prefix_expression(input, depth)?;

    loop {
        let (rest, _) = multispace0.parse(input)?;

        if rest.starts_with('(') && min_precedence < Precedence::Call {
            let (rest, arguments) = call_arguments(rest, depth)?;
            left = Expression::Call {
                function: Box::new(left),
                arguments,
            };
            input = rest;
            continue;
        }

        if rest.starts_with('[') && min_precedence < Precedence::Index {
            let (rest, index) = index_suffix(rest, depth)?;
            left = Expression::Index {
                left: Box::new(left),
                index: Box::new(index),
            };
            input = rest;
            continue;
        }

        if let Some((operator, precedence, spelling)) = peek_infix_operator(rest)
            && min_precedence < precedence
        {
            let (rest, right) = expression(&rest[spelling..], precedence, depth + 1)?;
            left = Expression::Infix {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
            input = rest;
            continue;
        }

        break;
    }

    Ok((input, left))
}

/// Look ahead for an infix operator: its meaning, binding strength and
/// spelling length.
fn peek_infix_operator(input: &str) -> Option<(InfixOperator, Precedence, usize)> {
    if input.starts_with("==") {
        return Some((InfixOperator::Equal, Precedence::Equals, 2));
    }
    if input.starts_with("!=") {
        return Some((InfixOperator::NotEqual, Precedence::Equals, 2));
    }
    match input.as_bytes().first()? {
        b'+' => Some((InfixOperator::Plus, Precedence::Sum, 1)),
        b'-' => Some((InfixOperator::Minus, Precedence::Sum, 1)),
        b'*' => Some((InfixOperator::Asterisk, Precedence::Product, 1)),
        b'/' => Some((InfixOperator::Slash, Precedence::Product, 1)),
        b'<' => Some((InfixOperator::LessThan, Precedence::LessGreater, 1)),
        b'>' => Some((InfixOperator::GreaterThan, Precedence::LessGreater, 1)),
        _ => None,
    }
}

/// A prefix-position expression: a literal, a grouped expression, a compound
/// form, or a prefix operator application.
fn prefix_expression(input: &str, depth: usize) -> IResult<&str, Expression> {
    alt((
        |i| prefix_operator_expression(i, depth),
        |i| grouped_expression(i, depth),
        |i| if_expression(i, depth),
        |i| function_literal(i, depth),
        |i| macro_literal(i, depth),
        |i| array_literal(i, depth),
        |i| hash_literal(i, depth),
        integer_literal,
        string_literal,
        boolean_literal,
        identifier_expression,
    ))
    .parse(input)
}

fn prefix_operator_expression(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, operator) = alt((
        value(PrefixOperator::Bang, char('!')),
        value(PrefixOperator::Minus, char('-')),
    ))
    .parse(input)?;
    let (input, right) = expression(input, Precedence::Prefix, depth + 1)?;
    Ok((
        input,
        Expression::Prefix {
            operator,
            right: Box::new(right),
        },
    ))
}

fn grouped_expression(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, _) = char('(').parse(input)?;
    let (input, grouped) = expression(input, Precedence::Lowest, depth + 1)?;
    let (input, _) = preceded(multispace0, char(')')).parse(input)?;
    Ok((input, grouped))
}

fn if_expression(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, _) = keyword("if", input)?;
    let (input, _) = preceded(multispace0, char('(')).parse(input)?;
    let (input, condition) = expression(input, Precedence::Lowest, depth + 1)?;
    let (input, _) = preceded(multispace0, char(')')).parse(input)?;
    let (input, consequence) = block_statement(input, depth + 1)?;
    let (input, alternative) = opt_else(input, depth)?;
    Ok((
        input,
        Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        },
    ))
}

fn opt_else(input: &str, depth: usize) -> IResult<&str, Option<BlockStatement>> {
    let (rest, _) = multispace0.parse(input)?;
    match keyword("else", rest) {
        Ok((rest, _)) => {
            let (rest, alternative) = block_statement(rest, depth + 1)?;
            Ok((rest, Some(alternative)))
        }
        Err(_) => Ok((input, None)),
    }
}

fn block_statement(input: &str, depth: usize) -> IResult<&str, BlockStatement> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    let (input, _) = preceded(multispace0, char('{')).parse(input)?;

    let mut statements = Vec::new();
    let (mut rest, _) = multispace0.parse(input)?;
    while !rest.starts_with('}') {
        if rest.is_empty() {
            // Unclosed block: fail hard instead of backtracking into a
            // misparse of the opening brace
            return Err(nom::Err::Failure(nom::error::Error::new(rest, ErrorKind::Char)));
        }
        let (next, parsed) = statement(rest, depth + 1)?;
        statements.push(parsed);
        let (next, _) = multispace0.parse(next)?;
        rest = next;
    }

    Ok((&rest[1..], BlockStatement { statements }))
}

fn function_literal(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, _) = keyword("fn", input)?;
    let (input, parameters) = parameter_list(input)?;
    let (input, body) = block_statement(input, depth + 1)?;
    Ok((input, Expression::Function { parameters, body }))
}

fn macro_literal(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, _) = keyword("macro", input)?;
    let (input, parameters) = parameter_list(input)?;
    let (input, body) = block_statement(input, depth + 1)?;
    Ok((input, Expression::MacroLit { parameters, body }))
}

fn parameter_list(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = preceded(multispace0, char('(')).parse(input)?;
    let (input, parameters) = separated_list0(
        preceded(multispace0, char(',')),
        preceded(multispace0, identifier_name),
    )
    .parse(input)?;
    let (input, _) = preceded(multispace0, char(')')).parse(input)?;
    Ok((input, parameters))
}

fn call_arguments(input: &str, depth: usize) -> IResult<&str, Vec<Expression>> {
    let (input, _) = char('(').parse(input)?;
    let (input, arguments) = separated_list0(preceded(multispace0, char(',')), |i| {
        expression(i, Precedence::Lowest, depth + 1)
    })
    .parse(input)?;
    let (input, _) = preceded(multispace0, char(')')).parse(input)?;
    Ok((input, arguments))
}

fn index_suffix(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, _) = char('[').parse(input)?;
    let (input, index) = expression(input, Precedence::Lowest, depth + 1)?;
    let (input, _) = preceded(multispace0, char(']')).parse(input)?;
    Ok((input, index))
}

fn array_literal(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, _) = char('[').parse(input)?;
    let (input, elements) = separated_list0(preceded(multispace0, char(',')), |i| {
        expression(i, Precedence::Lowest, depth + 1)
    })
    .parse(input)?;
    let (input, _) = preceded(multispace0, char(']')).parse(input)?;
    Ok((input, Expression::Array(elements)))
}

fn hash_literal(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (input, _) = char('{').parse(input)?;
    let (input, pairs) =
        separated_list0(preceded(multispace0, char(',')), |i| hash_pair(i, depth)).parse(input)?;
    let (input, _) = preceded(multispace0, char('}')).parse(input)?;
    Ok((input, Expression::Hash(pairs)))
}

fn hash_pair(input: &str, depth: usize) -> IResult<&str, (Expression, Expression)> {
    let (input, key) = expression(input, Precedence::Lowest, depth + 1)?;
    let (input, _) = preceded(multispace0, char(':')).parse(input)?;
    let (input, value) = expression(input, Precedence::Lowest, depth + 1)?;
    Ok((input, (key, value)))
}

fn integer_literal(input: &str) -> IResult<&str, Expression> {
    let (rest, digits) = take_while1(|c: char| c.is_ascii_digit()).parse(input)?;
    match digits.parse::<i64>() {
        Ok(parsed) => Ok((rest, Expression::Integer(parsed))),
        // Out-of-range literals are unrecoverable, not another token
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        ))),
    }
}

/// String literals run to the next `"`; there are no escape sequences.
fn string_literal(input: &str) -> IResult<&str, Expression> {
    let (rest, _) = char('"').parse(input)?;
    match rest.find('"') {
        Some(end) => Ok((
            &rest[end + 1..],
            Expression::StringLit(rest[..end].to_string()),
        )),
        None => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Char,
        ))),
    }
}

fn boolean_literal(input: &str) -> IResult<&str, Expression> {
    if let Ok((rest, _)) = keyword("true", input) {
        return Ok((rest, Expression::Boolean(true)));
    }
    let (rest, _) = keyword("false", input)?;
    Ok((rest, Expression::Boolean(false)))
}

fn identifier_expression(input: &str) -> IResult<&str, Expression> {
    let (rest, name) = identifier_name(input)?;
    Ok((rest, Expression::Identifier(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Result shapes for the data-driven parser tests.
    enum Expected {
        /// Parses to exactly this single-statement program
        Stmt(Statement),
        /// Parses, and the program renders as this text
        Renders(&'static str),
        /// Fails with this ParseErrorKind
        FailsWith(ParseErrorKind),
    }
    use Expected::*;

    fn ident(name: &str) -> Expression {
        Expression::Identifier(name.to_string())
    }

    fn int(value: i64) -> Expression {
        Expression::Integer(value)
    }

    fn infix(operator: InfixOperator, left: Expression, right: Expression) -> Expression {
        Expression::Infix {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn block(statements: Vec<Statement>) -> BlockStatement {
        BlockStatement { statements }
    }

    fn run_parse_tests(test_cases: Vec<(&str, Expected)>) {
        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let test_id = format!("parse test #{} ({input})", i + 1);
            match (parse_program(input), expected) {
                (Ok(program), Stmt(statement)) => {
                    assert_eq!(
                        program.statements,
                        vec![statement],
                        "{test_id}: statement mismatch"
                    );
                }
                (Ok(program), Renders(expected_text)) => {
                    assert_eq!(program.to_string(), expected_text, "{test_id}");
                }
                (Err(error), FailsWith(expected_kind)) => {
                    assert_eq!(error.kind, expected_kind, "{test_id}: {error}");
                }
                (Ok(program), FailsWith(expected_kind)) => {
                    panic!("{test_id}: expected {expected_kind:?}, parsed {program}");
                }
                (Err(error), _) => {
                    panic!("{test_id}: unexpected parse error: {error}");
                }
            }
        }
    }

    #[test]
    fn test_let_and_return_statements() {
        run_parse_tests(vec![
            (
                "let x = 5;",
                Stmt(Statement::Let {
                    name: "x".to_string(),
                    value: int(5),
                }),
            ),
            (
                "let y = true;",
                Stmt(Statement::Let {
                    name: "y".to_string(),
                    value: Expression::Boolean(true),
                }),
            ),
            (
                "let foobar = y;",
                Stmt(Statement::Let {
                    name: "foobar".to_string(),
                    value: ident("y"),
                }),
            ),
            // Semicolons are optional
            (
                "let x = 5",
                Stmt(Statement::Let {
                    name: "x".to_string(),
                    value: int(5),
                }),
            ),
            ("return 5;", Stmt(Statement::Return(int(5)))),
            ("return foobar;", Stmt(Statement::Return(ident("foobar")))),
            (
                "return 1 + 2;",
                Stmt(Statement::Return(infix(InfixOperator::Plus, int(1), int(2)))),
            ),
            // Malformed bindings
            ("let x 5;", FailsWith(ParseErrorKind::InvalidSyntax)),
            ("let = 5;", FailsWith(ParseErrorKind::InvalidSyntax)),
            ("let 5 = 5;", FailsWith(ParseErrorKind::InvalidSyntax)),
            // Reserved words cannot be bound
            ("let let = 5;", FailsWith(ParseErrorKind::InvalidSyntax)),
        ]);
    }

    #[test]
    fn test_literal_expressions() {
        run_parse_tests(vec![
            ("foobar;", Stmt(Statement::Expression(ident("foobar")))),
            ("5;", Stmt(Statement::Expression(int(5)))),
            (
                "\"hello world\";",
                Stmt(Statement::Expression(Expression::StringLit(
                    "hello world".to_string(),
                ))),
            ),
            (
                "\"\";",
                Stmt(Statement::Expression(Expression::StringLit(String::new()))),
            ),
            (
                "true;",
                Stmt(Statement::Expression(Expression::Boolean(true))),
            ),
            (
                "false;",
                Stmt(Statement::Expression(Expression::Boolean(false))),
            ),
            // Identifiers may contain underscores but never digits
            (
                "snake_case;",
                Stmt(Statement::Expression(ident("snake_case"))),
            ),
            (
                "9223372036854775807;",
                Stmt(Statement::Expression(int(i64::MAX))),
            ),
            (
                "9223372036854775808;",
                FailsWith(ParseErrorKind::InvalidSyntax),
            ),
            ("\"unterminated", FailsWith(ParseErrorKind::InvalidSyntax)),
        ]);
    }

    #[test]
    fn test_prefix_expressions() {
        run_parse_tests(vec![
            (
                "!5;",
                Stmt(Statement::Expression(Expression::Prefix {
                    operator: PrefixOperator::Bang,
                    right: Box::new(int(5)),
                })),
            ),
            (
                "-15;",
                Stmt(Statement::Expression(Expression::Prefix {
                    operator: PrefixOperator::Minus,
                    right: Box::new(int(15)),
                })),
            ),
            (
                "!true;",
                Stmt(Statement::Expression(Expression::Prefix {
                    operator: PrefixOperator::Bang,
                    right: Box::new(Expression::Boolean(true)),
                })),
            ),
        ]);
    }

    #[test]
    fn test_infix_expressions() {
        let operators = vec![
            ("5 + 5;", InfixOperator::Plus),
            ("5 - 5;", InfixOperator::Minus),
            ("5 * 5;", InfixOperator::Asterisk),
            ("5 / 5;", InfixOperator::Slash),
            ("5 > 5;", InfixOperator::GreaterThan),
            ("5 < 5;", InfixOperator::LessThan),
            ("5 == 5;", InfixOperator::Equal),
            ("5 != 5;", InfixOperator::NotEqual),
        ];
        run_parse_tests(
            operators
                .into_iter()
                .map(|(input, operator)| {
                    (
                        input,
                        Stmt(Statement::Expression(infix(operator, int(5), int(5)))),
                    )
                })
                .collect(),
        );
    }

    #[test]
    fn test_operator_precedence() {
        run_parse_tests(vec![
            ("-a * b", Renders("((-a) * b)")),
            ("!-a", Renders("(!(-a))")),
            ("a + b + c", Renders("((a + b) + c)")),
            ("a + b - c", Renders("((a + b) - c)")),
            ("a * b * c", Renders("((a * b) * c)")),
            ("a * b / c", Renders("((a * b) / c)")),
            ("a + b / c", Renders("(a + (b / c))")),
            ("a + b * c + d / e - f", Renders("(((a + (b * c)) + (d / e)) - f)")),
            ("3 + 4; -5 * 5", Renders("(3 + 4)\n((-5) * 5)")),
            ("5 > 4 == 3 < 4", Renders("((5 > 4) == (3 < 4))")),
            ("5 < 4 != 3 > 4", Renders("((5 < 4) != (3 > 4))")),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                Renders("((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
            ),
            ("3 > 5 == false", Renders("((3 > 5) == false)")),
            ("1 + (2 + 3) + 4", Renders("((1 + (2 + 3)) + 4)")),
            ("(5 + 5) * 2", Renders("((5 + 5) * 2)")),
            ("2 / (5 + 5)", Renders("(2 / (5 + 5))")),
            ("-(5 + 5)", Renders("(-(5 + 5))")),
            ("!(true == true)", Renders("(!(true == true))")),
            ("a + add(b * c) + d", Renders("((a + add((b * c))) + d)")),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                Renders("add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))"),
            ),
            (
                "add(a + b + c * d / f + g)",
                Renders("add((((a + b) + ((c * d) / f)) + g))"),
            ),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                Renders("((a * ([1, 2, 3, 4][(b * c)])) * d)"),
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                Renders("add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))"),
            ),
        ]);
    }

    #[test]
    fn test_if_expressions() {
        run_parse_tests(vec![
            (
                "if (x < y) { x }",
                Stmt(Statement::Expression(Expression::If {
                    condition: Box::new(infix(InfixOperator::LessThan, ident("x"), ident("y"))),
                    consequence: block(vec![Statement::Expression(ident("x"))]),
                    alternative: None,
                })),
            ),
            (
                "if (x < y) { x } else { y }",
                Stmt(Statement::Expression(Expression::If {
                    condition: Box::new(infix(InfixOperator::LessThan, ident("x"), ident("y"))),
                    consequence: block(vec![Statement::Expression(ident("x"))]),
                    alternative: Some(block(vec![Statement::Expression(ident("y"))])),
                })),
            ),
            ("if (x) { }", Renders("if (x) { }")),
            // The condition parentheses are mandatory
            ("if x { 1 }", FailsWith(ParseErrorKind::InvalidSyntax)),
        ]);
    }

    #[test]
    fn test_function_literals_and_calls() {
        run_parse_tests(vec![
            (
                "fn(x, y) { x + y; }",
                Stmt(Statement::Expression(Expression::Function {
                    parameters: vec!["x".to_string(), "y".to_string()],
                    body: block(vec![Statement::Expression(infix(
                        InfixOperator::Plus,
                        ident("x"),
                        ident("y"),
                    ))]),
                })),
            ),
            (
                "fn() {};",
                Stmt(Statement::Expression(Expression::Function {
                    parameters: vec![],
                    body: block(vec![]),
                })),
            ),
            (
                "fn(x) {};",
                Stmt(Statement::Expression(Expression::Function {
                    parameters: vec!["x".to_string()],
                    body: block(vec![]),
                })),
            ),
            (
                "fn(x, y, z) {};",
                Stmt(Statement::Expression(Expression::Function {
                    parameters: vec!["x".to_string(), "y".to_string(), "z".to_string()],
                    body: block(vec![]),
                })),
            ),
            (
                "add(1, 2 * 3, 4 + 5);",
                Stmt(Statement::Expression(Expression::Call {
                    function: Box::new(ident("add")),
                    arguments: vec![
                        int(1),
                        infix(InfixOperator::Asterisk, int(2), int(3)),
                        infix(InfixOperator::Plus, int(4), int(5)),
                    ],
                })),
            ),
            (
                "noarg();",
                Stmt(Statement::Expression(Expression::Call {
                    function: Box::new(ident("noarg")),
                    arguments: vec![],
                })),
            ),
            // An immediately applied function literal
            ("fn(x) { x }(5)", Renders("fn(x) { x }(5)")),
            // Parameters must be plain identifiers
            ("fn(1) {};", FailsWith(ParseErrorKind::InvalidSyntax)),
            ("fn(x, ) {};", FailsWith(ParseErrorKind::InvalidSyntax)),
        ]);
    }

    #[test]
    fn test_macro_literals() {
        run_parse_tests(vec![
            (
                "macro(x, y) { x + y; }",
                Stmt(Statement::Expression(Expression::MacroLit {
                    parameters: vec!["x".to_string(), "y".to_string()],
                    body: block(vec![Statement::Expression(infix(
                        InfixOperator::Plus,
                        ident("x"),
                        ident("y"),
                    ))]),
                })),
            ),
            (
                "let m = macro() { quote(1); };",
                Renders("let m = macro() { quote(1) };"),
            ),
        ]);
    }

    #[test]
    fn test_array_index_and_hash_literals() {
        run_parse_tests(vec![
            (
                "[1, 2 * 2, 3 + 3]",
                Stmt(Statement::Expression(Expression::Array(vec![
                    int(1),
                    infix(InfixOperator::Asterisk, int(2), int(2)),
                    infix(InfixOperator::Plus, int(3), int(3)),
                ]))),
            ),
            ("[]", Stmt(Statement::Expression(Expression::Array(vec![])))),
            (
                "myArray[1 + 1]",
                Stmt(Statement::Expression(Expression::Index {
                    left: Box::new(ident("myArray")),
                    index: Box::new(infix(InfixOperator::Plus, int(1), int(1))),
                })),
            ),
            (
                "{}",
                Stmt(Statement::Expression(Expression::Hash(vec![]))),
            ),
            (
                "{\"one\": 1, \"two\": 2}",
                Stmt(Statement::Expression(Expression::Hash(vec![
                    (Expression::StringLit("one".to_string()), int(1)),
                    (Expression::StringLit("two".to_string()), int(2)),
                ]))),
            ),
            (
                "{true: 1, 2: \"two\"}",
                Stmt(Statement::Expression(Expression::Hash(vec![
                    (Expression::Boolean(true), int(1)),
                    (int(2), Expression::StringLit("two".to_string())),
                ]))),
            ),
            (
                "{\"one\": 0 + 1}",
                Stmt(Statement::Expression(Expression::Hash(vec![(
                    Expression::StringLit("one".to_string()),
                    infix(InfixOperator::Plus, int(0), int(1)),
                )]))),
            ),
            ("{1: 2,}", FailsWith(ParseErrorKind::InvalidSyntax)),
            ("{1}", FailsWith(ParseErrorKind::InvalidSyntax)),
        ]);
    }

    #[test]
    fn test_whitespace_and_multiple_statements() {
        run_parse_tests(vec![
            ("  5  ;  ", Stmt(Statement::Expression(int(5)))),
            ("\t\nlet x = 1\r\n", Renders("let x = 1;")),
            ("1; 2; 3", Renders("1\n2\n3")),
            // Statements need no separator at all
            ("1 2", Renders("1\n2")),
            ("", Renders("")),
            ("   \n\t  ", Renders("")),
        ]);
    }

    #[test]
    fn test_general_error_cases() {
        run_parse_tests(vec![
            ("(1 + 2", FailsWith(ParseErrorKind::InvalidSyntax)),
            (")", FailsWith(ParseErrorKind::InvalidSyntax)),
            ("@", FailsWith(ParseErrorKind::InvalidSyntax)),
            ("1 + ", FailsWith(ParseErrorKind::Incomplete)),
            ("fn(x) { x", FailsWith(ParseErrorKind::Incomplete)),
            ("[1, 2", FailsWith(ParseErrorKind::InvalidSyntax)),
        ]);
    }

    #[test]
    fn test_depth_limit() {
        let nested_ok = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse_program(&nested_ok).is_ok());

        let nested_over = format!("{}1{}", "(".repeat(MAX_PARSE_DEPTH + 1), ")".repeat(MAX_PARSE_DEPTH + 1));
        let error = parse_program(&nested_over).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::TooDeeplyNested);

        let brackets_over = format!("{}1{}", "[".repeat(MAX_PARSE_DEPTH + 1), "]".repeat(MAX_PARSE_DEPTH + 1));
        let error = parse_program(&brackets_over).unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::TooDeeplyNested);
    }

    #[test]
    fn test_error_context_snippet() {
        let error = parse_program("let x = @").unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::InvalidSyntax);
        let context = error.context.expect("context snippet missing");
        assert!(context.contains('@'), "context was: {context}");
    }
}
