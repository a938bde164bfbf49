//! AST → instruction compiler
//!
//! Emits a `Line` marker before every statement that starts a new source
//! line, and before every re-evaluation of a loop header, so the hook fires
//! once per executed line in program order.

use super::errors::{FaultKind, RuntimeFault};
use super::types::{CodeObject, Expr, Instr, Line, LogicOp, Stmt, Val, MODULE_NAME};
use std::sync::Arc;

/* ===================== Public API ===================== */

/// Compile a parsed program into the module code object
pub fn compile_program(program: &[Stmt]) -> Result<CodeObject, RuntimeFault> {
    let mut compiler = Compiler::new(false);
    compiler.block(program, 0)?;
    Ok(CodeObject {
        name: MODULE_NAME.to_string(),
        params: vec![],
        instrs: compiler.instrs,
        first_line: 0,
    })
}

/* ===================== Compiler ===================== */

/// Jump targets of the loop currently being compiled
struct LoopContext {
    /// Where `continue` jumps
    head: usize,
    /// Indices of `Jump` placeholders that `break` emitted
    breaks: Vec<usize>,
    /// `for` loops keep an iterator open that `break` must close
    has_iterator: bool,
}

struct Compiler {
    instrs: Vec<Instr>,
    loops: Vec<LoopContext>,
    in_function: bool,
}

impl Compiler {
    fn new(in_function: bool) -> Self {
        Self {
            instrs: Vec::new(),
            loops: Vec::new(),
            in_function,
        }
    }

    fn emit(&mut self, instr: Instr) -> usize {
        self.instrs.push(instr);
        self.instrs.len() - 1
    }

    fn here(&self) -> usize {
        self.instrs.len()
    }

    /// Point a previously emitted jump at `target`
    fn patch(&mut self, at: usize, target: usize) {
        match &mut self.instrs[at] {
            Instr::Jump(t)
            | Instr::JumpIfFalse(t)
            | Instr::JumpIfFalseOrPop(t)
            | Instr::JumpIfTrueOrPop(t)
            | Instr::IterNext(t) => *t = target,
            _ => {}
        }
    }

    /// Compile a statement list. `prev_line` is the line of whatever ran
    /// just before the block (its header), so a body sharing the header's
    /// line does not fire twice.
    fn block(&mut self, stmts: &[Stmt], prev_line: Line) -> Result<(), RuntimeFault> {
        let mut last = prev_line;
        for stmt in stmts {
            if stmt.line() != last {
                self.emit(Instr::Line(stmt.line()));
                last = stmt.line();
            }
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Stmt) -> Result<(), RuntimeFault> {
        match stmt {
            Stmt::Expr { expr, .. } => {
                self.expr(expr);
                self.emit(Instr::Pop);
            }
            Stmt::Assign { name, value, .. } => {
                self.expr(value);
                self.emit(Instr::Store(name.clone()));
            }
            Stmt::SetIndex {
                name, index, value, ..
            } => {
                self.expr(index);
                self.expr(value);
                self.emit(Instr::StoreIndex(name.clone()));
            }
            Stmt::If {
                branches,
                else_body,
                ..
            } => {
                let mut exits = Vec::new();
                for (i, branch) in branches.iter().enumerate() {
                    // The `if` line itself was marked by the enclosing block
                    if i > 0 {
                        self.emit(Instr::Line(branch.line));
                    }
                    self.expr(&branch.test);
                    let skip = self.emit(Instr::JumpIfFalse(0));
                    self.block(&branch.body, branch.line)?;
                    exits.push(self.emit(Instr::Jump(0)));
                    let next = self.here();
                    self.patch(skip, next);
                }
                if let Some(body) = else_body {
                    self.block(body, 0)?;
                }
                let end = self.here();
                for exit in exits {
                    self.patch(exit, end);
                }
            }
            Stmt::While { line, test, body } => {
                // The first header line comes from the enclosing block; every
                // later evaluation re-enters through `head`.
                let first_test = self.emit(Instr::Jump(0));
                let head = self.emit(Instr::Line(*line));
                let test_at = self.here();
                self.patch(first_test, test_at);
                self.expr(test);
                let exit = self.emit(Instr::JumpIfFalse(0));

                self.loops.push(LoopContext {
                    head,
                    breaks: vec![],
                    has_iterator: false,
                });
                self.block(body, *line)?;
                self.emit(Instr::Jump(head));
                let ctx = self.loops.pop();

                let end = self.here();
                self.patch(exit, end);
                for b in ctx.map(|c| c.breaks).unwrap_or_default() {
                    self.patch(b, end);
                }
            }
            Stmt::For {
                line,
                var,
                iterable,
                body,
            } => {
                self.expr(iterable);
                self.emit(Instr::IterStart);
                let first_next = self.emit(Instr::Jump(0));
                let head = self.emit(Instr::Line(*line));
                let next_at = self.here();
                self.patch(first_next, next_at);
                let next = self.emit(Instr::IterNext(0));
                self.emit(Instr::Store(var.clone()));

                self.loops.push(LoopContext {
                    head,
                    breaks: vec![],
                    has_iterator: true,
                });
                self.block(body, *line)?;
                self.emit(Instr::Jump(head));
                let ctx = self.loops.pop();

                let end = self.here();
                self.patch(next, end);
                for b in ctx.map(|c| c.breaks).unwrap_or_default() {
                    self.patch(b, end);
                }
            }
            Stmt::Def {
                line,
                name,
                params,
                body,
            } => {
                let mut inner = Compiler::new(true);
                inner.block(body, *line)?;
                inner.emit(Instr::Const(Val::None));
                inner.emit(Instr::Return);
                let code = CodeObject {
                    name: name.clone(),
                    params: params.clone(),
                    instrs: inner.instrs,
                    first_line: *line,
                };
                self.emit(Instr::MakeFunction(Arc::new(code)));
                self.emit(Instr::Store(name.clone()));
            }
            Stmt::Return { line, value } => {
                if !self.in_function {
                    return Err(syntax_error("'return' outside function", *line));
                }
                match value {
                    Some(expr) => self.expr(expr),
                    None => {
                        self.emit(Instr::Const(Val::None));
                    }
                }
                self.emit(Instr::Return);
            }
            Stmt::Break { line } => {
                let has_iterator = match self.loops.last() {
                    Some(ctx) => ctx.has_iterator,
                    None => return Err(syntax_error("'break' outside loop", *line)),
                };
                if has_iterator {
                    self.emit(Instr::IterDrop);
                }
                let jump = self.emit(Instr::Jump(0));
                if let Some(ctx) = self.loops.last_mut() {
                    ctx.breaks.push(jump);
                }
            }
            Stmt::Continue { line } => {
                let head = match self.loops.last() {
                    Some(ctx) => ctx.head,
                    None => return Err(syntax_error("'continue' not properly in loop", *line)),
                };
                self.emit(Instr::Jump(head));
            }
            Stmt::Pass { .. } => {}
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Int { v } => {
                self.emit(Instr::Const(Val::Int(*v)));
            }
            Expr::Float { v } => {
                self.emit(Instr::Const(Val::Float(*v)));
            }
            Expr::Str { v } => {
                self.emit(Instr::Const(Val::Str(v.clone())));
            }
            Expr::Bool { v } => {
                self.emit(Instr::Const(Val::Bool(*v)));
            }
            Expr::None => {
                self.emit(Instr::Const(Val::None));
            }
            Expr::List { items } => {
                for item in items {
                    self.expr(item);
                }
                self.emit(Instr::BuildList(items.len()));
            }
            Expr::Ident { name } => {
                self.emit(Instr::Load(name.clone()));
            }
            Expr::Index { object, index } => {
                self.expr(object);
                self.expr(index);
                self.emit(Instr::Index);
            }
            Expr::Call { callee, args } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
                self.emit(Instr::Call(args.len()));
            }
            Expr::Unary { op, operand } => {
                self.expr(operand);
                self.emit(Instr::Unary(*op));
            }
            Expr::Binary { op, left, right } => {
                self.expr(left);
                self.expr(right);
                self.emit(Instr::Binary(*op));
            }
            Expr::Logical { op, left, right } => {
                self.expr(left);
                let jump = match op {
                    LogicOp::And => self.emit(Instr::JumpIfFalseOrPop(0)),
                    LogicOp::Or => self.emit(Instr::JumpIfTrueOrPop(0)),
                };
                self.expr(right);
                let end = self.here();
                self.patch(jump, end);
            }
        }
    }
}

fn syntax_error(message: &str, line: Line) -> RuntimeFault {
    RuntimeFault::new(FaultKind::SyntaxError, message).at_line(line)
}
