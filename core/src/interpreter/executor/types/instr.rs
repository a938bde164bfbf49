//! Flat instruction set the VM executes
//!
//! Each code object (the module body or one function) is compiled to a
//! straight list of instructions with absolute jump targets. `Line`
//! instructions mark statement boundaries and are where the trace hook
//! fires.

use super::ast::{BinOp, Line, UnaryOp};
use super::values::Val;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// Statement boundary: fire the line hook (if any) for this line
    Line(Line),
    Const(Val),
    Load(String),
    Store(String),
    /// Pops value then index; stores `name[index] = value`
    StoreIndex(String),
    BuildList(usize),
    /// Pops index then object; pushes `object[index]`
    Index,
    Unary(UnaryOp),
    Binary(BinOp),
    Jump(usize),
    /// Pops the condition
    JumpIfFalse(usize),
    /// `and`: if top is falsy jump and keep it, otherwise pop it
    JumpIfFalseOrPop(usize),
    /// `or`: if top is truthy jump and keep it, otherwise pop it
    JumpIfTrueOrPop(usize),
    /// Pops `argc` arguments and then the callee
    Call(usize),
    /// Pops the return value and leaves the current frame
    Return,
    Pop,
    MakeFunction(Arc<CodeObject>),
    /// Pops an iterable and opens a loop iterator on the frame
    IterStart,
    /// Pushes the next item, or closes the iterator and jumps when exhausted
    IterNext(usize),
    /// Closes the innermost iterator (used by `break` out of a `for`)
    IterDrop,
}

/// A compiled unit: the module body or a function
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    pub name: String,
    pub params: Vec<String>,
    pub instrs: Vec<Instr>,
    /// Line of the `def` (0 for the module)
    pub first_line: Line,
}

impl CodeObject {
    pub fn is_module(&self) -> bool {
        self.name == MODULE_NAME
    }
}

pub const MODULE_NAME: &str = "<module>";
