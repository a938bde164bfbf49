//! Test helpers: fake workers wired through raw channels

use crate::controller::{ExecutionController, RecordingSurface, WorkerSpawner};
use crate::protocol::{self, Command, Envelope, Event, SessionId};
use crate::session::WorkerHandle;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const SOURCE: &str = "x = 1\nx = 2\nprint(x)";

/// The worker side of a handle built with `WorkerHandle::from_parts`
pub struct FakeWorker {
    pub id: SessionId,
    pub commands: UnboundedReceiver<String>,
    pub events: UnboundedSender<String>,
}

impl FakeWorker {
    /// Commands received since the last call
    pub fn sent(&mut self) -> Vec<Command> {
        let mut sent = Vec::new();
        while let Ok(text) = self.commands.try_recv() {
            sent.push(protocol::decode(&text).expect("valid command"));
        }
        sent
    }

    /// Wire form of `event` stamped with this worker's id
    pub fn wire(&self, event: Event) -> Option<String> {
        let envelope = Envelope {
            session: self.id,
            event,
        };
        Some(protocol::encode(&envelope).expect("encodable"))
    }
}

/// Records every fake worker the spawner creates
#[derive(Clone, Default)]
pub struct FakeWorkers {
    spawned: Arc<Mutex<Vec<FakeWorker>>>,
}

impl FakeWorkers {
    pub fn spawner(&self) -> WorkerSpawner {
        let spawned = self.spawned.clone();
        Arc::new(move || {
            let id = SessionId::new();
            let (command_tx, command_rx) = mpsc::unbounded_channel();
            let (event_tx, event_rx) = mpsc::unbounded_channel();
            spawned.lock().unwrap().push(FakeWorker {
                id,
                commands: command_rx,
                events: event_tx,
            });
            WorkerHandle::from_parts(id, command_tx, event_rx)
        })
    }

    /// Remove and return the most recently spawned worker
    pub fn take_latest(&self) -> FakeWorker {
        self.spawned.lock().unwrap().pop().expect("a worker was spawned")
    }

    pub fn count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }
}

/// Controller over `SOURCE` whose worker has already reported ready
pub fn ready_controller() -> (ExecutionController<RecordingSurface>, FakeWorker, FakeWorkers) {
    let workers = FakeWorkers::default();
    let mut controller = ExecutionController::new(RecordingSurface::with_source(SOURCE), workers.spawner());
    let mut worker = workers.take_latest();
    assert_eq!(worker.sent(), vec![Command::Initialize]);
    controller.handle_wire(worker.wire(Event::Ready));
    (controller, worker, workers)
}

pub fn line_event(line: u32, pairs: &[(&str, &str)]) -> Event {
    Event::LineExecuted {
        line,
        variables: pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    }
}
