//! Tests for builtin functions

use super::helpers::{build_vm, global};
use crate::interpreter::executor::{run_until_done, FaultKind, RunOutcome, Val};

fn eval(expr: &str) -> Val {
    let mut vm = build_vm(&format!("r = {}", expr));
    match run_until_done(&mut vm) {
        RunOutcome::Finished => global(&vm, "r").expect("r is bound"),
        other => panic!("{} failed: {:?}", expr, other),
    }
}

fn ints(values: &[i64]) -> Val {
    Val::List(values.iter().copied().map(Val::Int).collect())
}

#[test]
fn test_conversions() {
    assert_eq!(eval("str(12)"), Val::Str("12".into()));
    assert_eq!(eval("str([1, 'a'])"), Val::Str("[1, 'a']".into()));
    assert_eq!(eval("int('42')"), Val::Int(42));
    assert_eq!(eval("int(3.9)"), Val::Int(3));
    assert_eq!(eval("float('2.5')"), Val::Float(2.5));
    assert_eq!(eval("float(2)"), Val::Float(2.0));
    assert_eq!(eval("type(1.5)"), Val::Str("<class 'float'>".into()));
}

#[test]
fn test_range_forms() {
    assert_eq!(eval("range(3)"), ints(&[0, 1, 2]));
    assert_eq!(eval("range(2, 5)"), ints(&[2, 3, 4]));
    assert_eq!(eval("range(5, 0, -2)"), ints(&[5, 3, 1]));
    assert_eq!(eval("range(3, 1)"), ints(&[]));
}

#[test]
fn test_range_zero_step_is_value_error() {
    let mut vm = build_vm("r = range(1, 5, 0)");
    let RunOutcome::Faulted(fault) = run_until_done(&mut vm) else {
        panic!("Expected fault");
    };
    assert_eq!(fault.kind, FaultKind::ValueError);
}

#[test]
fn test_len_abs_min_max() {
    assert_eq!(eval("len('héllo')"), Val::Int(5));
    assert_eq!(eval("len([1, 2])"), Val::Int(2));
    assert_eq!(eval("abs(-3)"), Val::Int(3));
    assert_eq!(eval("abs(-2.5)"), Val::Float(2.5));
    assert_eq!(eval("min(3, 1, 2)"), Val::Int(1));
    assert_eq!(eval("max([3, 9, 2])"), Val::Int(9));
    assert_eq!(eval("max('b', 'a')"), Val::Str("b".into()));
}

#[test]
fn test_min_of_empty_list_fails() {
    let mut vm = build_vm("r = min([])");
    let RunOutcome::Faulted(fault) = run_until_done(&mut vm) else {
        panic!("Expected fault");
    };
    assert_eq!(fault.kind, FaultKind::ValueError);
    assert_eq!(fault.message, "min() arg is an empty sequence");
}

#[test]
fn test_append_returns_new_list() {
    let mut vm = build_vm("a = [1]\nb = append(a, 2)");
    run_until_done(&mut vm);

    assert_eq!(global(&vm, "a"), Some(ints(&[1])));
    assert_eq!(global(&vm, "b"), Some(ints(&[1, 2])));
}
