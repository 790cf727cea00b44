//! End-to-end startup and shutdown through the real watcher and signal relay.
//!
//! Separate binary: it sends SIGTERM to itself.

use std::sync::Arc;
use std::time::Duration;

use rewatch_core::{Context, KillSignal};
use rewatch_supervisor::Supervisor;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_change_starts_postponed_child_and_sigterm_stops() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let mut ctx = Context::new("sleep", vec!["30".to_string()], root.clone());
    ctx.watch = vec![root.clone()];
    ctx.postpone = true;

    let (mut supervisor, controller) = Supervisor::start(Arc::new(ctx)).unwrap();
    assert!(!supervisor.context().raw);
    let task = tokio::spawn(controller.run());

    tokio::time::sleep(Duration::from_millis(200)).await;
    std::fs::write(root.join("main.go"), "package main\n").unwrap();

    let mut started = false;
    for _ in 0..500 {
        let pids = rewatch_proc::DescendantSource::descendants(
            &rewatch_proc::Discovery::platform(),
            std::process::id(),
        )
        .unwrap();
        if !pids.is_empty() {
            started = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(started, "no subprocess after file change");

    unsafe {
        libc::kill(libc::getpid(), libc::SIGTERM);
    }
    let sig = tokio::time::timeout(Duration::from_secs(10), task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sig, KillSignal::Terminate);

    supervisor.deinit();
    supervisor.deinit();
}
