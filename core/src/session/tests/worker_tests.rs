//! Tests for the worker task and its JSON channels

use crate::interpreter::ConfiguredLoader;
use crate::protocol::{self, Command, Envelope, Event};
use crate::session::traced::{LOADED_MESSAGE, LOADING_MESSAGE};
use crate::session::{spawn_worker, SessionOptions, WorkerHandle};
use std::sync::Arc;
use std::time::Duration;

fn spawn() -> WorkerHandle {
    spawn_worker(Arc::new(ConfiguredLoader::default()), SessionOptions::default())
}

async fn next_envelope(worker: &mut WorkerHandle) -> Envelope {
    let text = tokio::time::timeout(Duration::from_secs(5), worker.recv())
        .await
        .expect("worker answered in time")
        .expect("worker still running");
    protocol::decode(&text).expect("valid envelope")
}

#[tokio::test]
async fn test_worker_bootstraps_and_stamps_events() {
    let mut worker = spawn();
    worker.send(&Command::Initialize).unwrap();

    let mut events = Vec::new();
    for _ in 0..3 {
        let envelope = next_envelope(&mut worker).await;
        assert_eq!(envelope.session, worker.id());
        events.push(envelope.event);
    }
    assert_eq!(
        events,
        vec![
            Event::Output {
                text: LOADING_MESSAGE.into()
            },
            Event::Output {
                text: LOADED_MESSAGE.into()
            },
            Event::Ready,
        ]
    );
}

#[tokio::test]
async fn test_worker_runs_program_over_channels() {
    let mut worker = spawn();
    worker.send(&Command::Initialize).unwrap();
    for _ in 0..3 {
        next_envelope(&mut worker).await;
    }

    worker
        .send(&Command::StartExecution {
            source: "print('hi')".into(),
        })
        .unwrap();
    let first = next_envelope(&mut worker).await.event;
    assert!(matches!(first, Event::LineExecuted { line: 1, .. }));

    worker.send(&Command::ContinueExecution).unwrap();
    assert_eq!(
        next_envelope(&mut worker).await.event,
        Event::Output { text: "hi".into() }
    );
    assert_eq!(next_envelope(&mut worker).await.event, Event::ProgramEnd);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_worker_survives_deeply_nested_source() {
    let mut worker = spawn();
    worker.send(&Command::Initialize).unwrap();
    for _ in 0..3 {
        next_envelope(&mut worker).await;
    }

    let source = format!("x = {}1{}", "(".repeat(10_000), ")".repeat(10_000));
    worker.send(&Command::StartExecution { source }).unwrap();
    let Event::Error { message } = next_envelope(&mut worker).await.event else {
        panic!("Expected error event");
    };
    assert!(message.starts_with("SyntaxError: too many nested parentheses"), "got {}", message);

    // The worker is still alive and accepts a fresh run
    worker
        .send(&Command::StartExecution {
            source: "x = ((1))".into(),
        })
        .unwrap();
    assert!(matches!(
        next_envelope(&mut worker).await.event,
        Event::LineExecuted { line: 1, .. }
    ));
}

#[tokio::test]
async fn test_malformed_command_becomes_error_event() {
    let mut worker = spawn();
    worker.send_raw("{\"command\":\"self_destruct\"}".into()).unwrap();

    let Event::Error { message } = next_envelope(&mut worker).await.event else {
        panic!("Expected error event");
    };
    assert!(message.starts_with("malformed message:"), "got {}", message);
}

#[tokio::test]
async fn test_workers_have_distinct_ids() {
    let a = spawn();
    let b = spawn();
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_aborted_worker_closes_event_channel() {
    let mut worker = spawn();
    worker.abort();

    let closed = tokio::time::timeout(Duration::from_secs(5), worker.recv())
        .await
        .expect("channel closed in time");
    assert_eq!(closed, None);
}
