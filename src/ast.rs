//! Syntax tree for the language.
//!
//! The tree is a pair of closed enums ([`Statement`] and [`Expression`])
//! under a [`Program`] root. Every node is `Clone + PartialEq`, and the
//! `Display` impls render source-like text (prefix and infix expressions are
//! parenthesized so the rendering makes grouping explicit).
//!
//! The macro system treats the tree as a rewritable value: [`modify_program`]
//! and [`modify_expression`] implement the bottom-up structural rewrite that
//! both macro expansion and unquote substitution are built on.

use std::fmt;

/// A parsed source unit: the ordered list of its top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A braced statement list, as found in function bodies and `if` arms.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let <name> = <value>`
    Let { name: String, value: Expression },
    /// `return <value>`
    Return(Expression),
    /// A bare expression in statement position
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Integer(i64),
    Boolean(bool),
    StringLit(String),
    Identifier(String),
    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function {
        parameters: Vec<String>,
        body: BlockStatement,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },
    /// Hash literal pairs in source order; duplicate keys are resolved at
    /// evaluation time (last occurrence wins)
    Hash(Vec<(Expression, Expression)>),
    /// `macro(params) { body }`; only meaningful as the value of a `let`
    MacroLit {
        parameters: Vec<String>,
        body: BlockStatement,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Asterisk,
    Slash,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Bang => write!(f, "!"),
            PrefixOperator::Minus => write!(f, "-"),
        }
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spelling = match self {
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Asterisk => "*",
            InfixOperator::Slash => "/",
            InfixOperator::LessThan => "<",
            InfixOperator::GreaterThan => ">",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
        };
        write!(f, "{spelling}")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for statement in &self.statements {
            write!(f, " {statement}")?;
        }
        write!(f, " }}")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {name} = {value};"),
            Statement::Return(value) => write!(f, "return {value};"),
            Statement::Expression(expression) => write!(f, "{expression}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Integer(value) => write!(f, "{value}"),
            Expression::Boolean(value) => write!(f, "{value}"),
            Expression::StringLit(value) => write!(f, "\"{value}\""),
            Expression::Identifier(name) => write!(f, "{name}"),
            Expression::Prefix { operator, right } => write!(f, "({operator}{right})"),
            Expression::Infix {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({condition}) {consequence}")?;
                if let Some(alternative) = alternative {
                    write!(f, " else {alternative}")?;
                }
                Ok(())
            }
            Expression::Function { parameters, body } => {
                write!(f, "fn({}) {body}", parameters.join(", "))
            }
            Expression::Call {
                function,
                arguments,
            } => {
                write!(f, "{function}(")?;
                write_joined(f, arguments)?;
                write!(f, ")")
            }
            Expression::Array(elements) => {
                write!(f, "[")?;
                write_joined(f, elements)?;
                write!(f, "]")
            }
            Expression::Index { left, index } => write!(f, "({left}[{index}])"),
            Expression::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Expression::MacroLit { parameters, body } => {
                write!(f, "macro({}) {body}", parameters.join(", "))
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, expressions: &[Expression]) -> fmt::Result {
    for (i, expression) in expressions.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{expression}")?;
    }
    Ok(())
}

/// Rewrite every expression in `program` bottom-up.
///
/// Children are rewritten first, then the rebuilt node is offered to
/// `modifier`, whose return value replaces it. A replacement is used as-is
/// and never revisited, so the rewrite is single-pass by construction.
pub fn modify_program<E, F>(program: Program, modifier: &mut F) -> Result<Program, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let statements = program
        .statements
        .into_iter()
        .map(|statement| modify_statement(statement, modifier))
        .collect::<Result<_, E>>()?;
    Ok(Program { statements })
}

pub fn modify_statement<E, F>(statement: Statement, modifier: &mut F) -> Result<Statement, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    match statement {
        Statement::Let { name, value } => Ok(Statement::Let {
            name,
            value: modify_expression(value, modifier)?,
        }),
        Statement::Return(value) => Ok(Statement::Return(modify_expression(value, modifier)?)),
        Statement::Expression(expression) => Ok(Statement::Expression(modify_expression(
            expression, modifier,
        )?)),
    }
}

fn modify_block<E, F>(block: BlockStatement, modifier: &mut F) -> Result<BlockStatement, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let statements = block
        .statements
        .into_iter()
        .map(|statement| modify_statement(statement, modifier))
        .collect::<Result<_, E>>()?;
    Ok(BlockStatement { statements })
}

/// Expression-level entry of the rewrite; see [`modify_program`].
///
/// Macro literal bodies are deliberately opaque to the rewrite: their content
/// only becomes live code through expansion, which runs its own pass.
pub fn modify_expression<E, F>(expression: Expression, modifier: &mut F) -> Result<Expression, E>
where
    F: FnMut(Expression) -> Result<Expression, E>,
{
    let rebuilt = match expression {
        Expression::Prefix { operator, right } => Expression::Prefix {
            operator,
            right: Box::new(modify_expression(*right, modifier)?),
        },
        Expression::Infix {
            operator,
            left,
            right,
        } => Expression::Infix {
            operator,
            left: Box::new(modify_expression(*left, modifier)?),
            right: Box::new(modify_expression(*right, modifier)?),
        },
        Expression::If {
            condition,
            consequence,
            alternative,
        } => Expression::If {
            condition: Box::new(modify_expression(*condition, modifier)?),
            consequence: modify_block(consequence, modifier)?,
            alternative: alternative
                .map(|alternative| modify_block(alternative, modifier))
                .transpose()?,
        },
        Expression::Function { parameters, body } => Expression::Function {
            parameters,
            body: modify_block(body, modifier)?,
        },
        Expression::Call {
            function,
            arguments,
        } => Expression::Call {
            function: Box::new(modify_expression(*function, modifier)?),
            arguments: arguments
                .into_iter()
                .map(|argument| modify_expression(argument, modifier))
                .collect::<Result<_, E>>()?,
        },
        Expression::Array(elements) => Expression::Array(
            elements
                .into_iter()
                .map(|element| modify_expression(element, modifier))
                .collect::<Result<_, E>>()?,
        ),
        Expression::Index { left, index } => Expression::Index {
            left: Box::new(modify_expression(*left, modifier)?),
            index: Box::new(modify_expression(*index, modifier)?),
        },
        Expression::Hash(pairs) => Expression::Hash(
            pairs
                .into_iter()
                .map(|(key, value)| {
                    Ok((
                        modify_expression(key, modifier)?,
                        modify_expression(value, modifier)?,
                    ))
                })
                .collect::<Result<_, E>>()?,
        ),
        leaf => leaf,
    };
    modifier(rebuilt)
}
