//! Standard library (builtin) functions
//!
//! Builtins are resolved after locals and globals, so user code can
//! shadow them. They never appear in variable snapshots.

pub mod convert;
pub mod sequences;

use super::errors::{type_error, FaultResult};
use super::types::Val;

/* ===================== Builtin Identifiers ===================== */

/// Builtin function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Str,
    Int,
    Float,
    Len,
    Range,
    Abs,
    Min,
    Max,
    Append,
    Type,
}

const ALL: [Builtin; 11] = [
    Builtin::Print,
    Builtin::Str,
    Builtin::Int,
    Builtin::Float,
    Builtin::Len,
    Builtin::Range,
    Builtin::Abs,
    Builtin::Min,
    Builtin::Max,
    Builtin::Append,
    Builtin::Type,
];

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Len => "len",
            Builtin::Range => "range",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Append => "append",
            Builtin::Type => "type",
        }
    }

    pub fn lookup(name: &str) -> Option<Builtin> {
        ALL.iter().copied().find(|b| b.name() == name)
    }
}

/* ===================== Dispatcher ===================== */

/// Where `print` writes
pub trait Output {
    fn write(&mut self, text: &str);
}

/// Call a builtin with already-evaluated arguments
pub fn call_builtin(builtin: Builtin, args: Vec<Val>, out: &mut dyn Output) -> FaultResult<Val> {
    match builtin {
        Builtin::Print => {
            let text = args.iter().map(Val::to_string).collect::<Vec<_>>().join(" ");
            out.write(&text);
            Ok(Val::None)
        }
        Builtin::Str => convert::to_str(single(builtin, args)?),
        Builtin::Int => convert::to_int(single(builtin, args)?),
        Builtin::Float => convert::to_float(single(builtin, args)?),
        Builtin::Type => Ok(Val::Str(format!(
            "<class '{}'>",
            single(builtin, args)?.type_name()
        ))),
        Builtin::Len => sequences::len(single(builtin, args)?),
        Builtin::Range => sequences::range(&args),
        Builtin::Abs => sequences::abs(single(builtin, args)?),
        Builtin::Min => sequences::extreme(builtin, args, std::cmp::Ordering::Less),
        Builtin::Max => sequences::extreme(builtin, args, std::cmp::Ordering::Greater),
        Builtin::Append => sequences::append(builtin, args),
    }
}

/// Unpack exactly one argument
fn single(builtin: Builtin, mut args: Vec<Val>) -> FaultResult<Val> {
    if args.len() != 1 {
        return Err(type_error(format!(
            "{}() takes exactly one argument ({} given)",
            builtin.name(),
            args.len()
        )));
    }
    Ok(args.remove(0))
}
