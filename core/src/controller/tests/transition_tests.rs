//! Tests for the pure transition function and control derivation

use crate::controller::state::{paused_message, starting_message, FINISHED_MESSAGE, RESET_MESSAGE};
use crate::controller::{transition, Breakpoints, ControlState, ControllerState, Effect, Input, RunMode};
use crate::protocol::{Command, Event};
use maplit::btreemap;

fn line(line: u32) -> Input {
    Input::Event(Event::LineExecuted {
        line,
        variables: btreemap! {},
    })
}

fn run() -> Input {
    Input::Run {
        source: "x = 1".into(),
    }
}

fn step() -> Input {
    Input::Step {
        source: "x = 1".into(),
    }
}

const AWAIT_RUN: ControllerState = ControllerState::AwaitingPause { mode: RunMode::Run };
const AWAIT_STEP: ControllerState = ControllerState::AwaitingPause { mode: RunMode::Step };

/* ===================== Run Mode ===================== */

#[test]
fn test_run_mode_stops_only_at_breakpoints() {
    let bps: Breakpoints = [4].into_iter().collect();
    assert!(!RunMode::Run.should_stop_at(3, &bps));
    assert!(RunMode::Run.should_stop_at(4, &bps));
    assert!(RunMode::Step.should_stop_at(3, &bps));
}

/* ===================== Starting ===================== */

#[test]
fn test_ready_enters_idle() {
    let (state, effects) = transition(&ControllerState::Loading, Input::Event(Event::Ready), &Breakpoints::new());
    assert_eq!(state, ControllerState::Idle);
    assert!(effects.is_empty());
}

#[test]
fn test_run_from_idle_resets_log_and_starts() {
    let (state, effects) = transition(&ControllerState::Idle, run(), &Breakpoints::new());
    assert_eq!(state, AWAIT_RUN);
    assert_eq!(
        effects,
        vec![
            Effect::ClearOutput,
            Effect::ClearVariables,
            Effect::AppendOutput(starting_message(RunMode::Run)),
            Effect::Send(Command::StartExecution {
                source: "x = 1".into()
            }),
        ]
    );
}

#[test]
fn test_step_from_idle_starts_in_step_mode() {
    let (state, effects) = transition(&ControllerState::Idle, step(), &Breakpoints::new());
    assert_eq!(state, AWAIT_STEP);
    assert!(effects.contains(&Effect::AppendOutput("Starting execution in Step mode...".into())));
}

#[test]
fn test_errored_allows_run_but_not_step() {
    let (state, effects) = transition(&ControllerState::Errored, run(), &Breakpoints::new());
    assert_eq!(state, AWAIT_RUN);
    assert!(!effects.is_empty());

    let (state, effects) = transition(&ControllerState::Errored, step(), &Breakpoints::new());
    assert_eq!(state, ControllerState::Errored);
    assert!(effects.is_empty());
}

/* ===================== Pausing ===================== */

#[test]
fn test_step_mode_pauses_on_every_line() {
    let (state, effects) = transition(&AWAIT_STEP, line(1), &Breakpoints::new());
    assert_eq!(state, ControllerState::Paused { line: 1 });
    assert_eq!(
        effects,
        vec![
            Effect::ShowVariables {
                line: 1,
                variables: btreemap! {}
            },
            Effect::AppendOutput(paused_message(1)),
        ]
    );
}

#[test]
fn test_run_mode_auto_continues_past_non_breakpoints() {
    let bps: Breakpoints = [2].into_iter().collect();

    let (state, effects) = transition(&AWAIT_RUN, line(1), &bps);
    assert_eq!(state, AWAIT_RUN);
    assert_eq!(effects.last(), Some(&Effect::Send(Command::ContinueExecution)));

    let (state, effects) = transition(&AWAIT_RUN, line(2), &bps);
    assert_eq!(state, ControllerState::Paused { line: 2 });
    assert!(!effects.contains(&Effect::Send(Command::ContinueExecution)));
}

#[test]
fn test_resume_from_pause_keeps_log() {
    let paused = ControllerState::Paused { line: 2 };

    let (state, effects) = transition(&paused, run(), &Breakpoints::new());
    assert_eq!(state, AWAIT_RUN);
    assert_eq!(effects, vec![Effect::Send(Command::ContinueExecution)]);

    let (state, effects) = transition(&paused, step(), &Breakpoints::new());
    assert_eq!(state, AWAIT_STEP);
    assert_eq!(effects, vec![Effect::Send(Command::ContinueExecution)]);
}

#[test]
fn test_no_request_while_one_is_outstanding() {
    for state in [AWAIT_RUN, AWAIT_STEP] {
        for input in [run(), step()] {
            let (next, effects) = transition(&state, input, &Breakpoints::new());
            assert_eq!(next, state);
            assert!(effects.is_empty());
        }
    }
}

/* ===================== Terminal Events ===================== */

#[test]
fn test_program_end_finishes() {
    for state in [AWAIT_RUN, ControllerState::Paused { line: 3 }] {
        let (next, effects) = transition(&state, Input::Event(Event::ProgramEnd), &Breakpoints::new());
        assert_eq!(next, ControllerState::Finished);
        assert_eq!(effects, vec![Effect::AppendOutput(FINISHED_MESSAGE.into())]);
    }
}

#[test]
fn test_finished_ignores_run_and_step() {
    for input in [run(), step()] {
        let (state, effects) = transition(&ControllerState::Finished, input, &Breakpoints::new());
        assert_eq!(state, ControllerState::Finished);
        assert!(effects.is_empty());
    }
}

#[test]
fn test_error_event_surfaces_message() {
    let input = Input::Event(Event::Error {
        message: "NameError: name 'y' is not defined (line 2)".into(),
    });
    let (state, effects) = transition(&AWAIT_STEP, input, &Breakpoints::new());
    assert_eq!(state, ControllerState::Errored);
    assert_eq!(
        effects,
        vec![Effect::AppendOutput(
            "RUNTIME ERROR: NameError: name 'y' is not defined (line 2)".into()
        )]
    );
}

#[test]
fn test_error_while_loading_keeps_state() {
    let input = Input::Event(Event::Error {
        message: "InvalidStateError: cannot continue".into(),
    });
    let (state, effects) = transition(&ControllerState::Loading, input, &Breakpoints::new());
    assert_eq!(state, ControllerState::Loading);
    assert_eq!(effects.len(), 1);
}

#[test]
fn test_load_failed_blocks_runs() {
    let input = Input::Event(Event::LoadFailed {
        message: "no runtime".into(),
    });
    let (state, effects) = transition(&ControllerState::Loading, input, &Breakpoints::new());
    assert_eq!(state, ControllerState::LoadFailed);
    assert_eq!(effects, vec![Effect::AppendOutput("LOAD ERROR: no runtime".into())]);

    let (state, effects) = transition(&ControllerState::LoadFailed, run(), &Breakpoints::new());
    assert_eq!(state, ControllerState::LoadFailed);
    assert!(effects.is_empty());
}

#[test]
fn test_worker_fault_crashes_from_any_state() {
    for state in [ControllerState::Idle, AWAIT_RUN, ControllerState::Paused { line: 1 }] {
        let (next, effects) = transition(&state, Input::WorkerFault("gone".into()), &Breakpoints::new());
        assert_eq!(next, ControllerState::Crashed);
        assert_eq!(effects, vec![Effect::AppendOutput("WORKER ERROR: gone".into())]);
    }
}

#[test]
fn test_output_is_accepted_everywhere() {
    for state in [ControllerState::Loading, AWAIT_RUN, ControllerState::Finished] {
        let input = Input::Event(Event::Output { text: "hi".into() });
        let (next, effects) = transition(&state, input, &Breakpoints::new());
        assert_eq!(next, state);
        assert_eq!(effects, vec![Effect::AppendOutput("hi".into())]);
    }
}

#[test]
fn test_reset_from_every_state() {
    let states = [
        ControllerState::Loading,
        ControllerState::LoadFailed,
        ControllerState::Idle,
        AWAIT_RUN,
        ControllerState::Paused { line: 2 },
        ControllerState::Finished,
        ControllerState::Errored,
        ControllerState::Crashed,
    ];
    for state in states {
        let (next, effects) = transition(&state, Input::Reset, &Breakpoints::new());
        assert_eq!(next, ControllerState::Loading);
        assert_eq!(
            effects,
            vec![
                Effect::ClearOutput,
                Effect::ClearVariables,
                Effect::RespawnWorker,
                Effect::AppendOutput(RESET_MESSAGE.into()),
                Effect::Send(Command::Initialize),
            ]
        );
    }
}

/* ===================== Controls ===================== */

#[test]
fn test_control_state_per_state() {
    let enabled = |state: ControllerState| {
        let c = ControlState::for_state(&state);
        assert!(c.reset && c.add_breakpoint);
        (c.run, c.step)
    };

    assert_eq!(enabled(ControllerState::Loading), (false, false));
    assert_eq!(enabled(ControllerState::LoadFailed), (false, false));
    assert_eq!(enabled(ControllerState::Idle), (true, true));
    assert_eq!(enabled(AWAIT_STEP), (false, false));
    assert_eq!(enabled(ControllerState::Paused { line: 1 }), (true, true));
    assert_eq!(enabled(ControllerState::Finished), (false, false));
    assert_eq!(enabled(ControllerState::Errored), (true, false));
    assert_eq!(enabled(ControllerState::Crashed), (false, false));
}
