//! Host loops
//!
//! `run_host` serves an interactive front end: user actions and worker
//! events are handled one at a time on a single task, so the controller
//! never needs a lock. `drive` is the headless variant where a policy
//! closure plays the user.

use super::state::ControllerState;
use super::ui::UiSurface;
use super::ExecutionController;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Run,
    Step,
    Reset,
    /// Raw breakpoint input, parsed by the controller
    AddBreakpoint(String),
    RemoveBreakpoint(u32),
    /// Re-render the breakpoint list
    ListBreakpoints,
    Quit,
}

impl<U: UiSurface> ExecutionController<U> {
    pub fn handle_action(&mut self, action: UserAction) {
        debug!(?action, "user action");
        match action {
            UserAction::Run => self.run(),
            UserAction::Step => self.step(),
            UserAction::Reset => self.reset(),
            UserAction::AddBreakpoint(input) => {
                self.add_breakpoint_input(&input);
            }
            UserAction::RemoveBreakpoint(line) => {
                self.remove_breakpoint(line);
            }
            UserAction::ListBreakpoints => {
                let lines = self.breakpoints().lines();
                self.ui_mut().show_breakpoints(&lines);
            }
            UserAction::Quit => {}
        }
    }
}

/// Serve user actions and worker events until `Quit` or the action
/// channel closes. Returns the controller for inspection.
pub async fn run_host<U: UiSurface>(
    mut controller: ExecutionController<U>,
    mut actions: UnboundedReceiver<UserAction>,
) -> ExecutionController<U> {
    info!(session = %controller.session(), "host loop started");

    loop {
        tokio::select! {
            action = actions.recv() => match action {
                Some(UserAction::Quit) | None => break,
                Some(action) => controller.handle_action(action),
            },
            message = controller.next_wire(), if controller.is_listening() => {
                controller.handle_wire(message);
            }
        }
    }

    info!(state = ?controller.state(), "host loop stopped");
    controller
}

/// What a headless policy wants to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Handle the next worker event
    Wait,
    Run,
    Step,
    Stop,
}

/// Drive the controller with `policy` standing in for the user. The policy
/// sees the state before every decision. Waiting on a crashed controller
/// stops the loop.
pub async fn drive<U, F>(controller: &mut ExecutionController<U>, mut policy: F) -> ControllerState
where
    U: UiSurface,
    F: FnMut(&ControllerState) -> Directive,
{
    loop {
        match policy(controller.state()) {
            Directive::Stop => break,
            Directive::Run => controller.run(),
            Directive::Step => controller.step(),
            Directive::Wait => {
                if !controller.is_listening() {
                    break;
                }
                controller.process_next().await;
            }
        }
    }
    controller.state().clone()
}
