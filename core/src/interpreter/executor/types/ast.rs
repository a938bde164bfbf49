//! Abstract Syntax Tree node types
//!
//! Every statement remembers the 1-based source line it starts on; the
//! compiler turns that into the `Line` instructions the trace hook fires on.

use serde::{Deserialize, Serialize};

/// 1-based source line number
pub type Line = u32;

/// Statement AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Stmt {
    Expr {
        line: Line,
        expr: Expr,
    },
    Assign {
        line: Line,
        name: String,
        value: Expr,
    },
    SetIndex {
        line: Line,
        name: String,
        index: Expr,
        value: Expr,
    },
    If {
        line: Line,
        branches: Vec<Branch>,
        else_body: Option<Vec<Stmt>>,
    },
    While {
        line: Line,
        test: Expr,
        body: Vec<Stmt>,
    },
    For {
        line: Line,
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Def {
        line: Line,
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Return {
        line: Line,
        value: Option<Expr>,
    },
    Break {
        line: Line,
    },
    Continue {
        line: Line,
    },
    Pass {
        line: Line,
    },
}

impl Stmt {
    pub fn line(&self) -> Line {
        match self {
            Stmt::Expr { line, .. }
            | Stmt::Assign { line, .. }
            | Stmt::SetIndex { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Def { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::Break { line }
            | Stmt::Continue { line }
            | Stmt::Pass { line } => *line,
        }
    }
}

/// One `if`/`elif` arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub line: Line,
    pub test: Expr,
    pub body: Vec<Stmt>,
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Expr {
    Int { v: i64 },
    Float { v: f64 },
    Str { v: String },
    Bool { v: bool },
    None,
    List { items: Vec<Expr> },
    Ident { name: String },
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    Logical { op: LogicOp, left: Box<Expr>, right: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Source spelling, used in fault messages
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Short-circuit operators; they yield one of their operands, not a bool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    And,
    Or,
}
