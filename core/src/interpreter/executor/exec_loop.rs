//! Core execution loop
//!
//! `step()` executes exactly one instruction of the innermost frame.
//! `resume()` drives `step()` until the line hook pauses the VM or the
//! program terminates; `run_until_done()` keeps resuming through pauses.

use super::errors::{name_error, type_error, FaultKind, FaultResult, RuntimeFault};
use super::hook::{OutputSink, TraceCaptureError};
use super::operators;
use super::stdlib::{call_builtin, Builtin, Output};
use super::types::{CodeObject, Instr, Line, Val};
use super::vm::{frame_view, CallFrame, Control, LoopIter, Step, Vm};
use std::collections::BTreeMap;
use std::sync::Arc;

/* ===================== Public API ===================== */

/// Why `resume()` returned
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Suspended before executing `line`
    Paused { line: Line },
    Finished,
    Faulted(RuntimeFault),
    /// The hook failed and was removed; the VM is still runnable untraced
    TraceFailed(TraceCaptureError),
}

/// Run the VM to termination, resuming through every pause
pub fn run_until_done(vm: &mut Vm) -> RunOutcome {
    loop {
        match resume(vm) {
            RunOutcome::Paused { .. } | RunOutcome::TraceFailed(_) => continue,
            other => return other,
        }
    }
}

/// Run until the next pause or termination
///
/// Terminal outcomes are sticky: resuming a finished or faulted VM
/// reports the same outcome again without executing anything.
pub fn resume(vm: &mut Vm) -> RunOutcome {
    if let Control::Fault(fault) = &vm.control {
        return RunOutcome::Faulted(fault.clone());
    }
    if vm.control == Control::Done {
        return RunOutcome::Finished;
    }
    vm.control = Control::None;

    loop {
        match step(vm) {
            Step::Continue => continue,
            Step::Paused(line) => {
                vm.control = Control::Paused(line);
                return RunOutcome::Paused { line };
            }
            Step::Done => return RunOutcome::Finished,
            Step::Fault(fault) => return RunOutcome::Faulted(fault),
            Step::TraceFailed(err) => return RunOutcome::TraceFailed(err),
        }
    }
}

/// Execute one instruction
pub fn step(vm: &mut Vm) -> Step {
    let Some(frame) = vm.frames.last_mut() else {
        return finish(vm);
    };

    let code = Arc::clone(&frame.code);
    let line = frame.current_line;
    let Some(instr) = code.instrs.get(frame.pc) else {
        // Module body exhausted (functions always end in `Return`)
        if code.is_module() {
            return finish(vm);
        }
        return fault(vm, system_error("fell off the end of a function"), line);
    };
    frame.pc += 1;

    match execute(vm, instr) {
        Ok(step) => step,
        Err(err) => fault(vm, err, line),
    }
}

/* ===================== Termination ===================== */

fn finish(vm: &mut Vm) -> Step {
    vm.control = Control::Done;
    vm.hook = None;
    Step::Done
}

fn fault(vm: &mut Vm, err: RuntimeFault, line: Line) -> Step {
    let err = err.at_line(line);
    tracing::debug!(fault = %err, "uncaught fault");
    vm.control = Control::Fault(err.clone());
    vm.hook = None;
    Step::Fault(err)
}

/* ===================== Dispatch ===================== */

fn execute(vm: &mut Vm, instr: &Instr) -> FaultResult<Step> {
    match instr {
        Instr::Line(line) => {
            top(vm)?.current_line = *line;
            return Ok(fire_hook(vm, *line));
        }
        Instr::Const(value) => push(vm, value.clone())?,
        Instr::Load(name) => {
            let value = lookup(vm, name)?;
            push(vm, value)?;
        }
        Instr::Store(name) => {
            let value = pop(vm)?;
            store(vm, name, value)?;
        }
        Instr::StoreIndex(name) => {
            let value = pop(vm)?;
            let index = pop(vm)?;
            store_index(vm, name, &index, value)?;
        }
        Instr::BuildList(count) => {
            let items = pop_n(vm, *count)?;
            push(vm, Val::List(items))?;
        }
        Instr::Index => {
            let index = pop(vm)?;
            let object = pop(vm)?;
            push(vm, operators::index(&object, &index)?)?;
        }
        Instr::Unary(op) => {
            let operand = pop(vm)?;
            push(vm, operators::unary(*op, &operand)?)?;
        }
        Instr::Binary(op) => {
            let right = pop(vm)?;
            let left = pop(vm)?;
            push(vm, operators::binary(*op, &left, &right)?)?;
        }
        Instr::Jump(target) => top(vm)?.pc = *target,
        Instr::JumpIfFalse(target) => {
            let cond = pop(vm)?;
            if !cond.is_truthy() {
                top(vm)?.pc = *target;
            }
        }
        Instr::JumpIfFalseOrPop(target) => short_circuit(vm, *target, false)?,
        Instr::JumpIfTrueOrPop(target) => short_circuit(vm, *target, true)?,
        Instr::Call(argc) => {
            let args = pop_n(vm, *argc)?;
            let callee = pop(vm)?;
            call(vm, callee, args)?;
        }
        Instr::Return => {
            let value = pop(vm)?;
            vm.frames.pop();
            if vm.frames.is_empty() {
                return Ok(finish(vm));
            }
            push(vm, value)?;
        }
        Instr::Pop => {
            pop(vm)?;
        }
        Instr::MakeFunction(code) => push(vm, Val::Func(Arc::clone(code)))?,
        Instr::IterStart => {
            let iterable = pop(vm)?;
            let items = iterate(iterable)?;
            top(vm)?.iters.push(LoopIter { items, next: 0 });
        }
        Instr::IterNext(end) => {
            let frame = top(vm)?;
            let Some(iter) = frame.iters.last_mut() else {
                return Err(system_error("no open loop iterator"));
            };
            match iter.items.get(iter.next).cloned() {
                Some(item) => {
                    iter.next += 1;
                    frame.stack.push(item);
                }
                None => {
                    frame.iters.pop();
                    frame.pc = *end;
                }
            }
        }
        Instr::IterDrop => {
            top(vm)?.iters.pop();
        }
    }
    Ok(Step::Continue)
}

/// Offer the line to the hook. Accepting it pauses the VM; the `Line`
/// instruction has already been consumed, so the next resume runs the line.
fn fire_hook(vm: &mut Vm, line: Line) -> Step {
    let Some(hook) = vm.hook.as_mut() else {
        return Step::Continue;
    };
    let view = frame_view(&vm.frames, &vm.globals, line);
    match hook.on_line(&view) {
        Ok(()) => Step::Paused(line),
        Err(err) => {
            tracing::warn!(line, error = %err, "line hook failed, tracing disabled");
            vm.hook = None;
            Step::TraceFailed(err)
        }
    }
}

/* ===================== Calls ===================== */

fn call(vm: &mut Vm, callee: Val, args: Vec<Val>) -> FaultResult<()> {
    match callee {
        Val::Builtin(builtin) => {
            let mut out = SinkOutput(vm.output.as_ref());
            let result = call_builtin(builtin, args, &mut out)?;
            push(vm, result)
        }
        Val::Func(code) => enter_function(vm, code, args),
        other => Err(type_error(format!(
            "'{}' object is not callable",
            other.type_name()
        ))),
    }
}

fn enter_function(vm: &mut Vm, code: Arc<CodeObject>, args: Vec<Val>) -> FaultResult<()> {
    if args.len() != code.params.len() {
        return Err(type_error(format!(
            "{}() takes {} positional argument{} but {} {} given",
            code.name,
            code.params.len(),
            if code.params.len() == 1 { "" } else { "s" },
            args.len(),
            if args.len() == 1 { "was" } else { "were" },
        )));
    }
    if vm.frames.len() >= vm.limits.max_call_depth {
        return Err(RuntimeFault::new(
            FaultKind::RecursionError,
            "maximum recursion depth exceeded",
        ));
    }

    let locals: BTreeMap<String, Val> = code.params.iter().cloned().zip(args).collect();
    vm.frames.push(CallFrame::new(code, locals));
    Ok(())
}

/// `print` destination backed by the VM's redirected sink
struct SinkOutput<'a>(Option<&'a OutputSink>);

impl Output for SinkOutput<'_> {
    fn write(&mut self, text: &str) {
        if let Some(sink) = self.0 {
            sink(text);
        }
    }
}

/* ===================== Names ===================== */

/// Resolve a name: locals, then globals, then builtins
fn lookup(vm: &Vm, name: &str) -> FaultResult<Val> {
    if let Some(frame) = vm.frames.last().filter(|f| !f.code.is_module()) {
        if let Some(value) = frame.locals.get(name) {
            return Ok(value.clone());
        }
    }
    if let Some(value) = vm.globals.get(name) {
        return Ok(value.clone());
    }
    Builtin::lookup(name)
        .map(Val::Builtin)
        .ok_or_else(|| name_error(name))
}

/// Bind in the current scope (globals at module level)
fn store(vm: &mut Vm, name: &str, value: Val) -> FaultResult<()> {
    let frame = top(vm)?;
    if frame.code.is_module() {
        vm.globals.insert(name.to_string(), value);
    } else {
        frame.locals.insert(name.to_string(), value);
    }
    Ok(())
}

/// `name[index] = value`, written back to the scope that holds `name`
fn store_index(vm: &mut Vm, name: &str, index: &Val, value: Val) -> FaultResult<()> {
    let in_locals = vm
        .frames
        .last()
        .is_some_and(|f| !f.code.is_module() && f.locals.contains_key(name));
    let scope = if in_locals {
        &mut top(vm)?.locals
    } else if vm.globals.contains_key(name) {
        &mut vm.globals
    } else if let Some(builtin) = Builtin::lookup(name) {
        // Builtins are not containers; let set_index report the type
        operators::set_index(Val::Builtin(builtin), index, value)?;
        return Ok(());
    } else {
        return Err(name_error(name));
    };

    let Some(container) = scope.remove(name) else {
        return Err(name_error(name));
    };
    let updated = operators::set_index(container.clone(), index, value);
    match updated {
        Ok(updated) => {
            scope.insert(name.to_string(), updated);
            Ok(())
        }
        Err(err) => {
            scope.insert(name.to_string(), container);
            Err(err)
        }
    }
}

/* ===================== Operand Stack ===================== */

fn top(vm: &mut Vm) -> FaultResult<&mut CallFrame> {
    vm.frames
        .last_mut()
        .ok_or_else(|| system_error("no active frame"))
}

fn push(vm: &mut Vm, value: Val) -> FaultResult<()> {
    top(vm)?.stack.push(value);
    Ok(())
}

fn pop(vm: &mut Vm) -> FaultResult<Val> {
    top(vm)?
        .stack
        .pop()
        .ok_or_else(|| system_error("operand stack underflow"))
}

fn pop_n(vm: &mut Vm, count: usize) -> FaultResult<Vec<Val>> {
    let stack = &mut top(vm)?.stack;
    if stack.len() < count {
        return Err(system_error("operand stack underflow"));
    }
    let at = stack.len() - count;
    Ok(stack.split_off(at))
}

fn short_circuit(vm: &mut Vm, target: usize, jump_when: bool) -> FaultResult<()> {
    let frame = top(vm)?;
    let Some(value) = frame.stack.last() else {
        return Err(system_error("operand stack underflow"));
    };
    if value.is_truthy() == jump_when {
        frame.pc = target;
    } else {
        frame.stack.pop();
    }
    Ok(())
}

/* ===================== Helpers ===================== */

fn iterate(iterable: Val) -> FaultResult<Vec<Val>> {
    match iterable {
        Val::List(items) => Ok(items),
        Val::Str(s) => Ok(s.chars().map(|c| Val::Str(c.to_string())).collect()),
        other => Err(type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

fn system_error(message: &str) -> RuntimeFault {
    RuntimeFault::new(FaultKind::SystemError, message)
}
