//! Operator semantics: arithmetic, comparison, indexing

use super::errors::{type_error, FaultKind, FaultResult, RuntimeFault};
use super::types::{BinOp, UnaryOp, Val};
use std::cmp::Ordering;

/// Largest list/string a repetition may build
const MAX_SEQUENCE_LEN: usize = 10_000_000;

pub fn unary(op: UnaryOp, operand: &Val) -> FaultResult<Val> {
    match op {
        UnaryOp::Not => Ok(Val::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Val::Int(i) => i
                .checked_neg()
                .map(Val::Int)
                .ok_or_else(|| overflow()),
            Val::Float(f) => Ok(Val::Float(-f)),
            Val::Bool(b) => Ok(Val::Int(-(*b as i64))),
            other => Err(type_error(format!(
                "bad operand type for unary -: '{}'",
                other.type_name()
            ))),
        },
    }
}

pub fn binary(op: BinOp, left: &Val, right: &Val) -> FaultResult<Val> {
    match op {
        BinOp::Eq => Ok(Val::Bool(values_equal(left, right))),
        BinOp::Ne => Ok(Val::Bool(!values_equal(left, right))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(left, right).ok_or_else(|| {
                type_error(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                ))
            })?;
            Ok(Val::Bool(match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::Le => ordering != Ordering::Greater,
                BinOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinOp::Add => add(left, right),
        BinOp::Sub => arithmetic(op, left, right, i64::checked_sub, |a, b| a - b),
        BinOp::Mul => multiply(left, right),
        BinOp::Div => {
            let (a, b) = numeric_pair(op, left, right)?;
            if b == 0.0 {
                return Err(RuntimeFault::new(FaultKind::ZeroDivisionError, "division by zero"));
            }
            Ok(Val::Float(a / b))
        }
        BinOp::FloorDiv => match (left, right) {
            (Val::Int(a), Val::Int(b)) => {
                if *b == 0 {
                    return Err(int_zero_division());
                }
                floor_div(*a, *b).map(Val::Int).ok_or_else(overflow)
            }
            _ => {
                let (a, b) = numeric_pair(op, left, right)?;
                if b == 0.0 {
                    return Err(RuntimeFault::new(FaultKind::ZeroDivisionError, "float floor division by zero"));
                }
                Ok(Val::Float((a / b).floor()))
            }
        },
        BinOp::Mod => match (left, right) {
            (Val::Int(a), Val::Int(b)) => {
                if *b == 0 {
                    return Err(int_zero_division());
                }
                let r = a.wrapping_rem(*b);
                Ok(Val::Int(if r != 0 && ((r < 0) != (*b < 0)) { r + b } else { r }))
            }
            _ => {
                let (a, b) = numeric_pair(op, left, right)?;
                if b == 0.0 {
                    return Err(RuntimeFault::new(FaultKind::ZeroDivisionError, "float modulo"));
                }
                Ok(Val::Float(a - b * (a / b).floor()))
            }
        },
    }
}

/// `object[index]`
pub fn index(object: &Val, index: &Val) -> FaultResult<Val> {
    match object {
        Val::List(items) => {
            let i = resolve_index(index, items.len(), "list")?;
            Ok(items[i].clone())
        }
        Val::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = resolve_index(index, chars.len(), "string")?;
            Ok(Val::Str(chars[i].to_string()))
        }
        other => Err(type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// `object[index] = value`, returning the updated container
pub fn set_index(object: Val, index: &Val, value: Val) -> FaultResult<Val> {
    match object {
        Val::List(mut items) => {
            let i = resolve_index(index, items.len(), "list assignment")?;
            items[i] = value;
            Ok(Val::List(items))
        }
        other => Err(type_error(format!(
            "'{}' object does not support item assignment",
            other.type_name()
        ))),
    }
}

/// Equality across numeric types; structural for containers
pub fn values_equal(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (Val::List(a), Val::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Val::Str(a), Val::Str(b)) => a == b,
        (Val::None, Val::None) => true,
        (Val::Func(a), Val::Func(b)) => std::sync::Arc::ptr_eq(a, b),
        (Val::Builtin(a), Val::Builtin(b)) => a == b,
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => match (left, right) {
                (Val::Int(x), Val::Int(y)) => x == y,
                _ => a == b,
            },
            _ => false,
        },
    }
}

/// Ordering for `<`-style comparisons; `None` when the types don't order
pub fn compare(left: &Val, right: &Val) -> Option<Ordering> {
    match (left, right) {
        (Val::Int(a), Val::Int(b)) => Some(a.cmp(b)),
        (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
        (Val::List(a), Val::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                if values_equal(x, y) {
                    continue;
                }
                return compare(x, y);
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

/* ===================== Helpers ===================== */

fn add(left: &Val, right: &Val) -> FaultResult<Val> {
    match (left, right) {
        (Val::Str(a), Val::Str(b)) => Ok(Val::Str(format!("{}{}", a, b))),
        (Val::List(a), Val::List(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            Ok(Val::List(items))
        }
        _ => arithmetic(BinOp::Add, left, right, i64::checked_add, |a, b| a + b),
    }
}

fn multiply(left: &Val, right: &Val) -> FaultResult<Val> {
    match (left, right) {
        (Val::Str(s), Val::Int(n)) | (Val::Int(n), Val::Str(s)) => {
            let count = repeat_count(*n, s.len())?;
            Ok(Val::Str(s.repeat(count)))
        }
        (Val::List(items), Val::Int(n)) | (Val::Int(n), Val::List(items)) => {
            let count = repeat_count(*n, items.len())?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Ok(Val::List(out))
        }
        _ => arithmetic(BinOp::Mul, left, right, i64::checked_mul, |a, b| a * b),
    }
}

fn repeat_count(n: i64, unit_len: usize) -> FaultResult<usize> {
    let count = n.max(0) as usize;
    if unit_len.saturating_mul(count) > MAX_SEQUENCE_LEN {
        return Err(RuntimeFault::new(FaultKind::MemoryError, "repeated sequence is too large"));
    }
    Ok(count)
}

fn arithmetic(
    op: BinOp,
    left: &Val,
    right: &Val,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> FaultResult<Val> {
    match (left, right) {
        (Val::Int(a), Val::Int(b)) => int_op(*a, *b).map(Val::Int).ok_or_else(overflow),
        _ => {
            let (a, b) = numeric_pair(op, left, right)?;
            Ok(Val::Float(float_op(a, b)))
        }
    }
}

fn numeric_pair(op: BinOp, left: &Val, right: &Val) -> FaultResult<(f64, f64)> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn resolve_index(index: &Val, len: usize, what: &str) -> FaultResult<usize> {
    let i = match index {
        Val::Int(i) => *i,
        Val::Bool(b) => *b as i64,
        other => {
            return Err(type_error(format!(
                "{} indices must be integers, not {}",
                what.split(' ').next().unwrap_or(what),
                other.type_name()
            )))
        }
    };
    let resolved = if i < 0 { i + len as i64 } else { i };
    if resolved < 0 || resolved >= len as i64 {
        return Err(RuntimeFault::new(
            FaultKind::IndexError,
            format!("{} index out of range", what),
        ));
    }
    Ok(resolved as usize)
}

fn int_zero_division() -> RuntimeFault {
    RuntimeFault::new(FaultKind::ZeroDivisionError, "integer division or modulo by zero")
}

fn overflow() -> RuntimeFault {
    RuntimeFault::new(FaultKind::OverflowError, "integer overflow")
}
