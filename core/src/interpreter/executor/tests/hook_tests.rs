//! Tests for the line hook: per-line pausing, frame views and hook failure

use super::helpers::{build_vm, capture_output, global, install_recorder, step_through};
use crate::interpreter::executor::{
    resume, FaultKind, FrameView, LineHook, RunOutcome, TraceCaptureError, Val,
};
use maplit::btreemap;

#[test]
fn test_hook_pauses_before_each_line() {
    let mut vm = build_vm("x = 1\nx = 2\nprint(x)");
    let output = capture_output(&mut vm);
    let seen = install_recorder(&mut vm);

    assert_eq!(resume(&mut vm), RunOutcome::Paused { line: 1 });
    assert_eq!(global(&vm, "x"), None);
    assert_eq!(vm.paused_line(), Some(1));

    assert_eq!(resume(&mut vm), RunOutcome::Paused { line: 2 });
    assert_eq!(global(&vm, "x"), Some(Val::Int(1)));

    assert_eq!(resume(&mut vm), RunOutcome::Paused { line: 3 });
    assert!(output.lock().unwrap().is_empty());

    assert_eq!(resume(&mut vm), RunOutcome::Finished);
    assert_eq!(*output.lock().unwrap(), vec!["2".to_string()]);

    let vars: Vec<_> = seen.lock().unwrap().iter().map(|s| s.vars.clone()).collect();
    assert_eq!(
        vars,
        vec![
            btreemap! {},
            btreemap! { "x".to_string() => "1".to_string() },
            btreemap! { "x".to_string() => "2".to_string() },
        ]
    );
}

#[test]
fn test_loop_header_fires_on_every_evaluation() {
    let mut vm = build_vm("i = 0\nwhile i < 2 {\n  i = i + 1\n}\ndone = 1");
    install_recorder(&mut vm);

    let (lines, outcome) = step_through(&mut vm);
    assert_eq!(lines, vec![1, 2, 3, 2, 3, 2, 5]);
    assert_eq!(outcome, RunOutcome::Finished);
}

#[test]
fn test_for_header_fires_per_item_and_on_exhaustion() {
    let mut vm = build_vm("for n in [10, 20] {\n  last = n\n}");
    install_recorder(&mut vm);

    let (lines, _) = step_through(&mut vm);
    assert_eq!(lines, vec![1, 2, 1, 2, 1]);
}

#[test]
fn test_statements_sharing_a_line_fire_once() {
    let mut vm = build_vm("a = 1; b = 2\nc = a + b");
    install_recorder(&mut vm);

    let (lines, _) = step_through(&mut vm);
    assert_eq!(lines, vec![1, 2]);
    assert_eq!(global(&vm, "c"), Some(Val::Int(3)));
}

#[test]
fn test_function_lines_show_local_scope() {
    let mut vm = build_vm("def f(a) {\n  b = a * 2\n  return b\n}\nr = f(1)");
    let seen = install_recorder(&mut vm);

    let (lines, outcome) = step_through(&mut vm);
    assert_eq!(lines, vec![1, 5, 2, 3]);
    assert_eq!(outcome, RunOutcome::Finished);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[1].function, "<module>");
    assert_eq!(seen[1].depth, 1);
    assert_eq!(
        seen[1].vars,
        btreemap! { "f".to_string() => "<function f>".to_string() }
    );
    assert_eq!(seen[2].function, "f");
    assert_eq!(seen[2].depth, 2);
    assert_eq!(seen[3].depth, 2);
    assert_eq!(seen[2].vars, btreemap! { "a".to_string() => "1".to_string() });
    assert_eq!(
        seen[3].vars,
        btreemap! { "a".to_string() => "1".to_string(), "b".to_string() => "2".to_string() }
    );
}

#[test]
fn test_fault_after_pausing_on_faulting_line() {
    let mut vm = build_vm("x = 1\ny = x / 0\nz = 3");
    install_recorder(&mut vm);

    let (lines, outcome) = step_through(&mut vm);
    assert_eq!(lines, vec![1, 2]);
    let RunOutcome::Faulted(fault) = outcome else {
        panic!("Expected fault, got {:?}", outcome);
    };
    assert_eq!(fault.kind, FaultKind::ZeroDivisionError);
    assert!(!vm.has_line_hook());
}

#[test]
fn test_frame_view_is_stable_while_paused() {
    let mut vm = build_vm("xs = [1, 'a']\ny = 2");
    install_recorder(&mut vm);

    resume(&mut vm);
    resume(&mut vm);

    let render = |view: FrameView<'_>| -> Vec<(String, String)> {
        view.locals().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    };
    let first = render(vm.frame_view().expect("paused frame"));
    let second = render(vm.frame_view().expect("paused frame"));
    assert_eq!(first, second);
    assert_eq!(first, vec![("xs".to_string(), "[1, 'a']".to_string())]);
}

/// Fails on the n-th line it sees
struct FailingHook {
    fail_at: usize,
    calls: usize,
}

impl LineHook for FailingHook {
    fn on_line(&mut self, _frame: &FrameView<'_>) -> Result<(), TraceCaptureError> {
        self.calls += 1;
        if self.calls == self.fail_at {
            return Err(TraceCaptureError("snapshot too large".into()));
        }
        Ok(())
    }
}

#[test]
fn test_hook_failure_disables_tracing_and_run_completes() {
    let mut vm = build_vm("a = 1\nb = 2\nprint(a + b)");
    let output = capture_output(&mut vm);
    vm.install_line_hook(Box::new(FailingHook { fail_at: 2, calls: 0 }));

    assert_eq!(resume(&mut vm), RunOutcome::Paused { line: 1 });
    assert_eq!(
        resume(&mut vm),
        RunOutcome::TraceFailed(TraceCaptureError("snapshot too large".into()))
    );
    assert!(!vm.has_line_hook());

    assert_eq!(resume(&mut vm), RunOutcome::Finished);
    assert_eq!(*output.lock().unwrap(), vec!["3".to_string()]);
}
