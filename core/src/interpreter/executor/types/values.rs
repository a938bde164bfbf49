//! Runtime value types
//!
//! Values cross the session boundary only as display strings; the
//! conversions here are the single place that rendering is defined.

use super::instr::CodeObject;
use crate::interpreter::executor::stdlib::Builtin;
use std::fmt;
use std::sync::Arc;

/// Runtime value type
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Val>),
    Func(Arc<CodeObject>),
    Builtin(Builtin),
}

impl Val {
    /// Check if value is truthy (for conditionals and `and`/`or`)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::None => false,
            Val::Bool(b) => *b,
            Val::Int(i) => *i != 0,
            Val::Float(f) => *f != 0.0,
            Val::Str(s) => !s.is_empty(),
            Val::List(items) => !items.is_empty(),
            Val::Func(_) | Val::Builtin(_) => true,
        }
    }

    /// Name of the value's type as scripts see it
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::None => "NoneType",
            Val::Bool(_) => "bool",
            Val::Int(_) => "int",
            Val::Float(_) => "float",
            Val::Str(_) => "str",
            Val::List(_) => "list",
            Val::Func(_) => "function",
            Val::Builtin(_) => "builtin_function_or_method",
        }
    }

    /// Quoted form, used for strings nested inside containers
    pub fn repr(&self) -> String {
        match self {
            Val::Str(s) => quote(s),
            other => other.to_string(),
        }
    }

    /// Numeric view for mixed int/float arithmetic
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Val::Int(i) => Some(*i as f64),
            Val::Float(f) => Some(*f),
            Val::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::None => write!(f, "None"),
            Val::Bool(true) => write!(f, "True"),
            Val::Bool(false) => write!(f, "False"),
            Val::Int(i) => write!(f, "{}", i),
            Val::Float(x) => write!(f, "{}", format_float(*x)),
            Val::Str(s) => write!(f, "{}", s),
            Val::List(items) => {
                let parts: Vec<String> = items.iter().map(Val::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Val::Func(code) => write!(f, "<function {}>", code.name),
            Val::Builtin(builtin) => write!(f, "<built-in function {}>", builtin.name()),
        }
    }
}

fn format_float(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        if x > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

fn quote(s: &str) -> String {
    let quote_char = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote_char);
    for ch in s.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            c if c == quote_char => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote_char);
    out
}
