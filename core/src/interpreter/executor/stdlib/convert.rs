//! Conversion builtins: str(), int(), float()

use crate::interpreter::executor::errors::{type_error, value_error, FaultResult};
use crate::interpreter::executor::types::Val;

pub fn to_str(v: Val) -> FaultResult<Val> {
    Ok(match v {
        Val::Str(s) => Val::Str(s),
        other => Val::Str(other.to_string()),
    })
}

pub fn to_int(v: Val) -> FaultResult<Val> {
    match v {
        Val::Int(i) => Ok(Val::Int(i)),
        Val::Bool(b) => Ok(Val::Int(b as i64)),
        Val::Float(f) => {
            if !f.is_finite() {
                return Err(value_error(format!("cannot convert float {} to integer", Val::Float(f))));
            }
            Ok(Val::Int(f.trunc() as i64))
        }
        Val::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Val::Int)
            .map_err(|_| value_error(format!("invalid literal for int() with base 10: '{}'", s))),
        other => Err(type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

pub fn to_float(v: Val) -> FaultResult<Val> {
    match v {
        Val::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Val::Float)
            .map_err(|_| value_error(format!("could not convert string to float: '{}'", s))),
        other => other.as_f64().map(Val::Float).ok_or_else(|| {
            type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}
