//! Sequence and numeric builtins: len(), range(), abs(), min(), max(), append()

use super::Builtin;
use crate::interpreter::executor::errors::{type_error, value_error, FaultKind, FaultResult, RuntimeFault};
use crate::interpreter::executor::operators::compare;
use crate::interpreter::executor::types::Val;
use std::cmp::Ordering;

/// Largest list `range()` will materialize
const MAX_RANGE_LEN: i64 = 10_000_000;

pub fn len(v: Val) -> FaultResult<Val> {
    match v {
        Val::Str(s) => Ok(Val::Int(s.chars().count() as i64)),
        Val::List(items) => Ok(Val::Int(items.len() as i64)),
        other => Err(type_error(format!(
            "object of type '{}' has no len()",
            other.type_name()
        ))),
    }
}

/// range(stop) / range(start, stop) / range(start, stop, step)
pub fn range(args: &[Val]) -> FaultResult<Val> {
    let ints = args
        .iter()
        .map(|a| match a {
            Val::Int(i) => Ok(*i),
            Val::Bool(b) => Ok(*b as i64),
            other => Err(type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ))),
        })
        .collect::<FaultResult<Vec<i64>>>()?;

    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(type_error(format!(
                "range expected 1 to 3 arguments, got {}",
                ints.len()
            )))
        }
    };
    if step == 0 {
        return Err(value_error("range() arg 3 must not be zero"));
    }

    let span = if step > 0 {
        stop.saturating_sub(start)
    } else {
        start.saturating_sub(stop)
    };
    let count = if span <= 0 {
        0
    } else {
        (span - 1) / step.saturating_abs() + 1
    };
    if count > MAX_RANGE_LEN {
        return Err(RuntimeFault::new(FaultKind::MemoryError, "range() result is too large"));
    }

    let mut items = Vec::with_capacity(count as usize);
    let mut current = start;
    for _ in 0..count {
        items.push(Val::Int(current));
        current = current.saturating_add(step);
    }
    Ok(Val::List(items))
}

pub fn abs(v: Val) -> FaultResult<Val> {
    match v {
        Val::Int(i) => i
            .checked_abs()
            .map(Val::Int)
            .ok_or_else(|| RuntimeFault::new(FaultKind::OverflowError, "integer overflow")),
        Val::Float(f) => Ok(Val::Float(f.abs())),
        Val::Bool(b) => Ok(Val::Int(b as i64)),
        other => Err(type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// min()/max() over either one list argument or several arguments
pub fn extreme(builtin: Builtin, args: Vec<Val>, wanted: Ordering) -> FaultResult<Val> {
    let candidates = if args.len() == 1 {
        match args.into_iter().next() {
            Some(Val::List(items)) => items,
            Some(other) => {
                return Err(type_error(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
            None => Vec::new(),
        }
    } else {
        args
    };

    let mut iter = candidates.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| value_error(format!("{}() arg is an empty sequence", builtin.name())))?;
    for candidate in iter {
        let ordering = compare(&candidate, &best).ok_or_else(|| {
            type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                if wanted == Ordering::Less { "<" } else { ">" },
                candidate.type_name(),
                best.type_name()
            ))
        })?;
        if ordering == wanted {
            best = candidate;
        }
    }
    Ok(best)
}

/// append(list, item) returns a new list; values have copy semantics
pub fn append(builtin: Builtin, args: Vec<Val>) -> FaultResult<Val> {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(Val::List(mut items)), Some(item), None) => {
            items.push(item);
            Ok(Val::List(items))
        }
        (Some(other), Some(_), None) => Err(type_error(format!(
            "{}() first argument must be a list, not '{}'",
            builtin.name(),
            other.type_name()
        ))),
        _ => Err(type_error(format!("{}() takes exactly 2 arguments", builtin.name()))),
    }
}
