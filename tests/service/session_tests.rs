use crate::common::{self, engine, request, service_on};
use lanemac::security::MacErrorKind;
use lanemac::service::{Command, SyscallStatus};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn first_call_creates_one_session_and_later_calls_reuse_it() {
    common::init_test_logging();
    test_phase!("first_call_creates_one_session_and_later_calls_reuse_it");
    let engine = engine();
    let service = service_on(&engine);
    assert_eq!(service.session(6).unwrap(), None);

    let mut buffer = request(40, b"reuse");
    service.generate(6, &mut buffer, 40).unwrap();
    let handle = service.session(6).unwrap();
    assert_with_log!(handle.is_some(), "session cached", true, handle);

    for _ in 0..10 {
        service.verify(6, &buffer, 40).unwrap();
    }
    assert_eq!(service.session(6).unwrap(), handle);
    assert_eq!(engine.accounting().sessions_created(), 1);
    assert_eq!(service.stats().snapshot().sessions_created, 1);
    test_complete!("first_call_creates_one_session_and_later_calls_reuse_it");
}

#[test]
fn failed_creation_leaves_lane_unset_and_is_retried() {
    common::init_test_logging();
    test_phase!("failed_creation_leaves_lane_unset_and_is_retried");
    let engine = engine();
    let service = service_on(&engine);
    engine.inject_session_failures(2);

    let mut buffer = request(25, b"hello");
    let mut length = 25u16;
    for _ in 0..2 {
        let status = service.authenticate(2, Command::Write, &mut length, &mut buffer);
        assert_with_log!(
            status == SyscallStatus::SessionCreationFailed,
            "creation failure surfaces",
            SyscallStatus::SessionCreationFailed,
            status
        );
        assert_eq!(status.code(), 5);
        assert_eq!(service.session(2).unwrap(), None);
    }
    assert_eq!(engine.accounting().jobs_acquired(), 0);

    let status = service.authenticate(2, Command::Write, &mut length, &mut buffer);
    assert!(status.is_success());
    assert!(service.session(2).unwrap().is_some());
    assert_eq!(service.stats().snapshot().session_failures, 2);
    test_complete!("failed_creation_leaves_lane_unset_and_is_retried");
}

#[test]
fn concurrent_first_calls_on_one_lane_open_one_session() {
    common::init_test_logging();
    test_phase!("concurrent_first_calls_on_one_lane_open_one_session");
    let engine = engine();
    let service = Arc::new(service_on(&engine));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                service.ensure_session(5).unwrap()
            })
        })
        .collect();
    let sessions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(sessions.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(engine.session_count(), 1);
    test_complete!("concurrent_first_calls_on_one_lane_open_one_session");
}

#[test]
fn lanes_hold_independent_sessions() {
    common::init_test_logging();
    test_phase!("lanes_hold_independent_sessions");
    let engine = engine();
    let service = service_on(&engine);
    let a = service.ensure_session(0).unwrap();
    let b = service.ensure_session(14).unwrap();
    assert_ne!(a, b);
    assert_eq!(engine.session_count(), 2);
    assert_eq!(
        service.ensure_session(15).unwrap_err().kind(),
        MacErrorKind::InvalidLane
    );
    test_complete!("lanes_hold_independent_sessions");
}
