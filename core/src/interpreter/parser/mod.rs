//! PEST-based parser for the debugger's scripting language
//!
//! Produces the line-annotated AST consumed by the executor's compiler.

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::executor::types::ast::{BinOp, Branch, Expr, Line, LogicOp, Stmt, UnaryOp};


/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "interpreter/parser/script.pest"]
struct ScriptParser;

/* ===================== Error Types ===================== */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid syntax (line {line}, column {column})")]
    Syntax { line: Line, column: usize },
    #[error("{message} (line {line})")]
    Build { line: Line, message: String },
    /// Brackets or prefix operators nest deeper than the configured limit
    #[error("too many nested parentheses (line {line}, limit {limit})")]
    TooDeep { line: Line, limit: usize },
}

impl ParseError {
    pub fn line(&self) -> Line {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::Build { line, .. }
            | ParseError::TooDeep { line, .. } => *line,
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (line, col) = match err.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        ParseError::Syntax {
            line: line as Line,
            column: col,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Public API ===================== */

/// Nesting accepted by `parse_program`
pub const DEFAULT_MAX_NESTING: usize = 20;

/// Parse a whole source file into its top-level statements
pub fn parse_program(source: &str) -> ParseResult<Vec<Stmt>> {
    parse_program_with_limit(source, DEFAULT_MAX_NESTING)
}

/// Parse with an explicit nesting limit
///
/// The grammar, the AST builder and the compiler all recurse once per
/// nesting level, so the depth is checked on the raw text before pest runs.
pub fn parse_program_with_limit(source: &str, max_nesting: usize) -> ParseResult<Vec<Stmt>> {
    check_nesting(source, max_nesting)?;
    let mut pairs = ScriptParser::parse(Rule::program, source)?;
    let program = expect_next(&mut pairs, "program", 1)?;
    let line = line_of(&program);
    let mut inner = program.into_inner();
    let body = expect_next(&mut inner, "program body", line)?;
    build_body(body)
}

/* ===================== Nesting Limit ===================== */

/// Fail if brackets plus a run of prefix operators (`-`, `not`) ever nest
/// deeper than `limit`. Strings and comments are skipped.
fn check_nesting(source: &str, limit: usize) -> ParseResult<()> {
    let mut depth = 0usize;
    let mut prefix_run = 0usize;
    let mut line: Line = 1;
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\n' => {
                line += 1;
                prefix_run = 0;
            }
            ' ' | '\t' | '\r' => {}
            '#' => {
                while chars.next_if(|&(_, next)| next != '\n').is_some() {}
            }
            '"' | '\'' => {
                skip_string(&mut chars, c);
                prefix_run = 0;
            }
            '(' | '[' | '{' => {
                depth += 1;
                prefix_run = 0;
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                prefix_run = 0;
            }
            '-' => prefix_run += 1,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some((i, next)) = chars.next_if(|&(_, n)| n.is_ascii_alphanumeric() || n == '_') {
                    end = i + next.len_utf8();
                }
                if &source[start..end] == "not" {
                    prefix_run += 1;
                } else {
                    prefix_run = 0;
                }
            }
            _ => prefix_run = 0,
        }

        if depth + prefix_run > limit {
            return Err(ParseError::TooDeep { line, limit });
        }
    }
    Ok(())
}

/// Consume a string literal up to its closing quote; an unterminated
/// literal stops before the newline so line counting stays exact.
fn skip_string(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, quote: char) {
    while let Some((_, c)) = chars.next_if(|&(_, next)| next != '\n') {
        if c == quote {
            return;
        }
        if c == '\\' {
            chars.next_if(|&(_, next)| next != '\n');
        }
    }
}

/* ===================== AST Builder ===================== */

fn line_of(pair: &Pair<Rule>) -> Line {
    pair.as_span().start_pos().line_col().0 as Line
}

fn expect_next<'a>(pairs: &mut Pairs<'a, Rule>, what: &str, line: Line) -> ParseResult<Pair<'a, Rule>> {
    pairs.next().ok_or_else(|| ParseError::Build {
        line,
        message: format!("expected {}", what),
    })
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_if
            | Rule::kw_elif
            | Rule::kw_else
            | Rule::kw_while
            | Rule::kw_for
            | Rule::kw_in
            | Rule::kw_def
            | Rule::kw_return
            | Rule::kw_break
            | Rule::kw_continue
            | Rule::kw_pass
            | Rule::kw_and
            | Rule::kw_or
            | Rule::kw_not
    )
}

/// Children of a pair with the keyword tokens dropped
fn children(pair: Pair<'_, Rule>) -> Vec<Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule())).collect()
}

fn build_body(pair: Pair<Rule>) -> ParseResult<Vec<Stmt>> {
    // body = { sep* ~ (statement ~ (sep+ ~ statement)*)? ~ sep* }
    pair.into_inner().map(build_statement).collect()
}

fn build_block(pair: Pair<Rule>) -> ParseResult<Vec<Stmt>> {
    // block = { "{" ~ body ~ "}" }
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    build_body(expect_next(&mut inner, "block body", line)?)
}

fn build_statement(pair: Pair<Rule>) -> ParseResult<Stmt> {
    let line = line_of(&pair);
    match pair.as_rule() {
        Rule::statement => {
            let mut inner = pair.into_inner();
            build_statement(expect_next(&mut inner, "statement", line)?)
        }
        Rule::if_stmt => build_if(pair),
        Rule::while_stmt => {
            let mut parts = children(pair).into_iter();
            let test = build_expr(parts.next().ok_or_else(|| missing(line, "while condition"))?)?;
            let body = build_block(parts.next().ok_or_else(|| missing(line, "while body"))?)?;
            Ok(Stmt::While { line, test, body })
        }
        Rule::for_stmt => {
            let mut parts = children(pair).into_iter();
            let var = parts
                .next()
                .ok_or_else(|| missing(line, "loop variable"))?
                .as_str()
                .to_string();
            let iterable = build_expr(parts.next().ok_or_else(|| missing(line, "iterable"))?)?;
            let body = build_block(parts.next().ok_or_else(|| missing(line, "for body"))?)?;
            Ok(Stmt::For {
                line,
                var,
                iterable,
                body,
            })
        }
        Rule::def_stmt => {
            let mut parts = children(pair).into_iter();
            let name = parts
                .next()
                .ok_or_else(|| missing(line, "function name"))?
                .as_str()
                .to_string();
            let next = parts.next().ok_or_else(|| missing(line, "function body"))?;
            let (params, block) = if next.as_rule() == Rule::params {
                let params = next.into_inner().map(|p| p.as_str().to_string()).collect::<Vec<_>>();
                let block = parts.next().ok_or_else(|| missing(line, "function body"))?;
                (params, block)
            } else {
                (vec![], next)
            };
            check_unique_params(&name, &params, line)?;
            Ok(Stmt::Def {
                line,
                name,
                params,
                body: build_block(block)?,
            })
        }
        Rule::return_stmt => {
            let value = children(pair).into_iter().next().map(build_expr).transpose()?;
            Ok(Stmt::Return { line, value })
        }
        Rule::break_stmt => Ok(Stmt::Break { line }),
        Rule::continue_stmt => Ok(Stmt::Continue { line }),
        Rule::pass_stmt => Ok(Stmt::Pass { line }),
        Rule::assign_stmt => {
            // assign_stmt = { target ~ "=" ~ expr }, target = { ident ~ subscript? }
            let mut parts = pair.into_inner();
            let target = expect_next(&mut parts, "assignment target", line)?;
            let value = build_expr(expect_next(&mut parts, "assigned value", line)?)?;
            let mut target_parts = target.into_inner();
            let name = expect_next(&mut target_parts, "name", line)?.as_str().to_string();
            match target_parts.next() {
                Some(subscript) => {
                    let mut sub = subscript.into_inner();
                    let index = build_expr(expect_next(&mut sub, "index", line)?)?;
                    Ok(Stmt::SetIndex {
                        line,
                        name,
                        index,
                        value,
                    })
                }
                None => Ok(Stmt::Assign { line, name, value }),
            }
        }
        Rule::expr_stmt => {
            let mut inner = pair.into_inner();
            let expr = build_expr(expect_next(&mut inner, "expression", line)?)?;
            Ok(Stmt::Expr { line, expr })
        }
        other => Err(ParseError::Build {
            line,
            message: format!("unexpected statement rule: {:?}", other),
        }),
    }
}

fn build_if(pair: Pair<Rule>) -> ParseResult<Stmt> {
    // if_stmt = { kw_if ~ expr ~ block ~ elif_clause* ~ else_clause? }
    let line = line_of(&pair);
    let mut parts = children(pair).into_iter();
    let test = build_expr(parts.next().ok_or_else(|| missing(line, "if condition"))?)?;
    let body = build_block(parts.next().ok_or_else(|| missing(line, "if body"))?)?;

    let mut branches = vec![Branch { line, test, body }];
    let mut else_body = None;

    for clause in parts {
        match clause.as_rule() {
            Rule::elif_clause => {
                let clause_line = line_of(&clause);
                let mut inner = children(clause).into_iter();
                let test = build_expr(inner.next().ok_or_else(|| missing(clause_line, "elif condition"))?)?;
                let body = build_block(inner.next().ok_or_else(|| missing(clause_line, "elif body"))?)?;
                branches.push(Branch {
                    line: clause_line,
                    test,
                    body,
                });
            }
            Rule::else_clause => {
                let clause_line = line_of(&clause);
                let block = children(clause)
                    .into_iter()
                    .next()
                    .ok_or_else(|| missing(clause_line, "else body"))?;
                else_body = Some(build_block(block)?);
            }
            other => {
                return Err(ParseError::Build {
                    line,
                    message: format!("unexpected if clause: {:?}", other),
                })
            }
        }
    }

    Ok(Stmt::If {
        line,
        branches,
        else_body,
    })
}

fn build_expr(pair: Pair<Rule>) -> ParseResult<Expr> {
    let line = line_of(&pair);
    match pair.as_rule() {
        Rule::expr => {
            let mut inner = pair.into_inner();
            build_expr(expect_next(&mut inner, "expression", line)?)
        }
        Rule::or_expr => build_logical(pair, LogicOp::Or),
        Rule::and_expr => build_logical(pair, LogicOp::And),
        Rule::not_expr => {
            let mut parts = pair.into_inner();
            let first = expect_next(&mut parts, "operand", line)?;
            if first.as_rule() == Rule::kw_not {
                let operand = build_expr(expect_next(&mut parts, "operand of 'not'", line)?)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            } else {
                build_expr(first)
            }
        }
        Rule::comparison | Rule::sum | Rule::term => build_binary_chain(pair),
        Rule::unary => {
            let mut parts = pair.into_inner();
            let first = expect_next(&mut parts, "operand", line)?;
            if first.as_rule() == Rule::neg_op {
                let operand = build_expr(expect_next(&mut parts, "operand of '-'", line)?)?;
                Ok(match operand {
                    Expr::Int { v } => Expr::Int { v: -v },
                    Expr::Float { v } => Expr::Float { v: -v },
                    operand => Expr::Unary {
                        op: UnaryOp::Neg,
                        operand: Box::new(operand),
                    },
                })
            } else {
                build_expr(first)
            }
        }
        Rule::postfix => {
            let mut parts = pair.into_inner();
            let mut expr = build_expr(expect_next(&mut parts, "primary expression", line)?)?;
            for suffix in parts {
                expr = match suffix.as_rule() {
                    Rule::call_args => Expr::Call {
                        callee: Box::new(expr),
                        args: suffix.into_inner().map(build_expr).collect::<ParseResult<_>>()?,
                    },
                    Rule::subscript => {
                        let mut sub = suffix.into_inner();
                        Expr::Index {
                            object: Box::new(expr),
                            index: Box::new(build_expr(expect_next(&mut sub, "index", line)?)?),
                        }
                    }
                    other => {
                        return Err(ParseError::Build {
                            line,
                            message: format!("unexpected suffix: {:?}", other),
                        })
                    }
                };
            }
            Ok(expr)
        }
        Rule::list => Ok(Expr::List {
            items: pair.into_inner().map(build_expr).collect::<ParseResult<_>>()?,
        }),
        Rule::ident => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
        }),
        Rule::int => {
            let text = pair.as_str();
            let v = text.parse::<i64>().map_err(|e| ParseError::Build {
                line,
                message: format!("invalid integer literal '{}': {}", text, e),
            })?;
            Ok(Expr::Int { v })
        }
        Rule::float => {
            let text = pair.as_str();
            let v = text.parse::<f64>().map_err(|e| ParseError::Build {
                line,
                message: format!("invalid float literal '{}': {}", text, e),
            })?;
            Ok(Expr::Float { v })
        }
        Rule::string => {
            let mut inner = pair.into_inner();
            let content = expect_next(&mut inner, "string content", line)?;
            Ok(Expr::Str {
                v: unescape(content.as_str()),
            })
        }
        Rule::kw_true => Ok(Expr::Bool { v: true }),
        Rule::kw_false => Ok(Expr::Bool { v: false }),
        Rule::kw_none => Ok(Expr::None),
        other => Err(ParseError::Build {
            line,
            message: format!("unexpected expression rule: {:?}", other),
        }),
    }
}

/// `a or b or c` / `a and b` - left associative
fn build_logical(pair: Pair<Rule>, op: LogicOp) -> ParseResult<Expr> {
    let line = line_of(&pair);
    let mut operands = children(pair).into_iter();
    let mut expr = build_expr(operands.next().ok_or_else(|| missing(line, "operand"))?)?;
    for right in operands {
        expr = Expr::Logical {
            op,
            left: Box::new(expr),
            right: Box::new(build_expr(right)?),
        };
    }
    Ok(expr)
}

/// `operand (op operand)*` - left associative
fn build_binary_chain(pair: Pair<Rule>) -> ParseResult<Expr> {
    let line = line_of(&pair);
    let mut parts = pair.into_inner();
    let mut expr = build_expr(expect_next(&mut parts, "operand", line)?)?;
    while let Some(op_pair) = parts.next() {
        let op = binary_op(op_pair.as_str()).ok_or_else(|| ParseError::Build {
            line,
            message: format!("unknown operator '{}'", op_pair.as_str()),
        })?;
        let right = build_expr(expect_next(&mut parts, "right operand", line)?)?;
        expr = Expr::Binary {
            op,
            left: Box::new(expr),
            right: Box::new(right),
        };
    }
    Ok(expr)
}

fn binary_op(symbol: &str) -> Option<BinOp> {
    Some(match symbol {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "//" => BinOp::FloorDiv,
        "%" => BinOp::Mod,
        "==" => BinOp::Eq,
        "!=" => BinOp::Ne,
        "<" => BinOp::Lt,
        "<=" => BinOp::Le,
        ">" => BinOp::Gt,
        ">=" => BinOp::Ge,
        _ => return None,
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn check_unique_params(name: &str, params: &[String], line: Line) -> ParseResult<()> {
    for (i, param) in params.iter().enumerate() {
        if params[..i].contains(param) {
            return Err(ParseError::Build {
                line,
                message: format!("duplicate argument '{}' in function definition '{}'", param, name),
            });
        }
    }
    Ok(())
}

fn missing(line: Line, what: &str) -> ParseError {
    ParseError::Build {
        line,
        message: format!("expected {}", what),
    }
}
