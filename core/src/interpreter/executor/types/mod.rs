//! Type definitions for the executor
//!
//! This module contains all the core types used by the executor:
//! - AST nodes (Stmt, Expr)
//! - Compiled instructions and code objects
//! - Runtime values (Val)

pub mod ast;
pub mod instr;
pub mod values;

// Re-export all types for convenient access
pub use ast::{BinOp, Branch, Expr, Line, LogicOp, Stmt, UnaryOp};
pub use instr::{CodeObject, Instr, MODULE_NAME};
pub use values::Val;
