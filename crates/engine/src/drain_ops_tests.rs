// SPDX-License-Identifier: MIT

use super::*;
use gc_adapters::FakeSessionAdapter;
use gc_core::{SessionConfig, SessionName};

fn session() -> SessionName {
    SessionName::new("acme--pool-1")
}

fn ops() -> (FakeSessionAdapter, SessionName, SessionDrainOps<FakeSessionAdapter>) {
    let backend = FakeSessionAdapter::new();
    let s = session();
    backend.seed_session(&s, SessionConfig::new("echo", "/tmp"), true);
    let ops = SessionDrainOps::new(backend.clone());
    (backend, s, ops)
}

#[tokio::test]
async fn not_draining_by_default() {
    let (_backend, s, ops) = ops();
    assert!(!ops.is_draining(&s).await);
    assert!(ops.drain_start_time(&s).await.is_none());
}

#[tokio::test]
async fn set_drain_marks_draining_with_timestamp() {
    let (_backend, s, ops) = ops();
    ops.set_drain(&s, 12345).await;
    assert!(ops.is_draining(&s).await);
    assert_eq!(ops.drain_start_time(&s).await, Some(12345));
}

#[tokio::test]
async fn clear_drain_removes_drain_and_ack() {
    let (_backend, s, ops) = ops();
    ops.set_drain(&s, 1).await;
    ops.set_drain_ack(&s).await;
    ops.clear_drain(&s).await;

    assert!(!ops.is_draining(&s).await);
    assert!(!ops.is_drain_acked(&s).await);
}

#[tokio::test]
async fn drain_ack_roundtrips() {
    let (_backend, s, ops) = ops();
    assert!(!ops.is_drain_acked(&s).await);
    ops.set_drain_ack(&s).await;
    assert!(ops.is_drain_acked(&s).await);
}

#[tokio::test]
async fn restart_requested_roundtrips_and_clears() {
    let (_backend, s, ops) = ops();
    assert!(!ops.is_restart_requested(&s).await);
    ops.set_restart_requested(&s).await;
    assert!(ops.is_restart_requested(&s).await);
    ops.clear_restart_requested(&s).await;
    assert!(!ops.is_restart_requested(&s).await);
}

#[tokio::test]
async fn metadata_read_failure_on_missing_session_means_not_set() {
    let backend = FakeSessionAdapter::new();
    let s = session(); // never seeded — get_meta on an absent session
    let ops = SessionDrainOps::new(backend);

    assert!(!ops.is_draining(&s).await);
    assert!(!ops.is_drain_acked(&s).await);
    assert!(!ops.is_restart_requested(&s).await);
}
