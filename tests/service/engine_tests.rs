use crate::common::{self, engine, engine_with, request, retrying, service_on, service_with};
use lanemac::engine::{ENGINE_BUSY, errno};
use lanemac::security::MacErrorKind;
use lanemac::service::{Command, SyscallStatus};
use lanemac::util::DetRng;

#[test]
fn busy_completions_are_retried_invisibly() {
    common::init_test_logging();
    test_phase!("busy_completions_are_retried_invisibly");
    let engine = engine();
    let service = service_on(&engine);
    let mut buffer = request(25, b"hello");
    service.generate(0, &mut buffer, 25).unwrap();

    engine.inject_busy(5);
    service.verify(0, &buffer, 25).unwrap();

    let retries = service.stats().snapshot().busy_retries;
    assert_with_log!(retries == 5, "five resubmissions", 5, retries);
    assert_eq!(engine.accounting().busy_outcomes(), 5);
    assert_eq!(engine.accounting().jobs_outstanding(), 0);
    test_complete!("busy_completions_are_retried_invisibly");
}

#[test]
fn busy_retry_exhaustion_surfaces_engine_busy() {
    common::init_test_logging();
    test_phase!("busy_retry_exhaustion_surfaces_engine_busy");
    let engine = engine();
    let service = service_with(&engine, retrying(2));
    engine.inject_busy(3);

    let mut buffer = request(25, b"hello");
    let mut length = 25u16;
    let status = service.authenticate(1, Command::Write, &mut length, &mut buffer);
    assert_with_log!(
        status == SyscallStatus::EngineFailed(ENGINE_BUSY),
        "exhaustion reported",
        SyscallStatus::EngineFailed(ENGINE_BUSY),
        status
    );
    assert_eq!(status.code(), 35);
    assert_eq!(length, 25);
    assert_eq!(&buffer[4..20], &[0u8; 16]);
    assert_eq!(service.stats().snapshot().busy_retries, 2);
    assert_eq!(engine.accounting().jobs_outstanding(), 0);

    assert!(service.authenticate(1, Command::Write, &mut length, &mut buffer).is_success());
    test_complete!("busy_retry_exhaustion_surfaces_engine_busy");
}

#[test]
fn terminal_engine_failure_passes_code_through() {
    common::init_test_logging();
    test_phase!("terminal_engine_failure_passes_code_through");
    let engine = engine();
    let service = service_on(&engine);
    engine.inject_job_failures(1, 61);

    let mut buffer = request(25, b"hello");
    let mut length = 25u16;
    let status = service.authenticate(0, Command::Read, &mut length, &mut buffer);
    assert_eq!(status, SyscallStatus::EngineFailed(61));
    assert_eq!(status.code(), 61);
    assert_eq!(length, 25);
    assert_eq!(engine.accounting().jobs_outstanding(), 0);
    test_complete!("terminal_engine_failure_passes_code_through");
}

#[test]
fn non_positive_engine_codes_report_io_error() {
    common::init_test_logging();
    test_phase!("non_positive_engine_codes_report_io_error");
    let engine = engine();
    let service = service_on(&engine);

    for code in [0, -3] {
        engine.inject_job_failures(1, code);
        let mut buffer = request(25, b"hello");
        let mut length = 25u16;
        let status = service.authenticate(0, Command::Write, &mut length, &mut buffer);
        assert_with_log!(
            status == SyscallStatus::EngineFailed(errno::EIO),
            "failure stays visible",
            SyscallStatus::EngineFailed(errno::EIO),
            status
        );
        assert!(!status.is_success());
        assert_eq!(status.code(), 5);
        assert_eq!(length, 25);
        assert_eq!(&buffer[4..20], &[0u8; 16]);
    }
    assert_eq!(engine.accounting().jobs_outstanding(), 0);
    test_complete!("non_positive_engine_codes_report_io_error");
}

#[test]
fn empty_job_pool_reports_unavailable() {
    common::init_test_logging();
    test_phase!("empty_job_pool_reports_unavailable");
    let engine = engine_with(0);
    let service = service_on(&engine);

    let mut buffer = request(25, b"hello");
    let mut length = 25u16;
    let status = service.authenticate(0, Command::Write, &mut length, &mut buffer);
    assert_eq!(status, SyscallStatus::EngineUnavailable);
    assert_eq!(status.code(), errno::ENOBUFS);
    assert_eq!(engine.accounting().acquire_failures(), 1);
    assert_eq!(
        service.verify(0, &buffer, 25).unwrap_err().kind(),
        MacErrorKind::EngineUnavailable
    );
    test_complete!("empty_job_pool_reports_unavailable");
}

#[test]
fn shut_down_engine_fails_calls() {
    common::init_test_logging();
    test_phase!("shut_down_engine_fails_calls");
    let engine = engine();
    let service = service_on(&engine);
    service.ensure_session(0).unwrap();
    engine.shutdown();

    let mut buffer = request(25, b"hello");
    let err = service.generate(0, &mut buffer, 25).unwrap_err();
    assert_eq!(err.kind(), MacErrorKind::EngineFailed(errno::ESHUTDOWN));
    assert_eq!(engine.accounting().jobs_outstanding(), 0);
    test_complete!("shut_down_engine_fails_calls");
}

#[test]
fn no_job_growth_across_mixed_calls() {
    common::init_test_logging();
    test_phase!("no_job_growth_across_mixed_calls");
    let engine = engine_with(2);
    let service = service_on(&engine);

    let mut rng = DetRng::new(0xfa17);
    for round in 0..40u8 {
        let lane = u8::try_from(rng.next_below(15)).unwrap();
        let mut buffer = request(33, &[round; 9]);
        let mut length = 33u16;
        assert!(service.authenticate(lane, Command::Write, &mut length, &mut buffer).is_success());
        assert!(service.authenticate(lane, Command::Read, &mut length, &mut buffer).is_success());

        buffer[30] ^= 1;
        let status = service.authenticate(lane, Command::Read, &mut length, &mut buffer);
        assert_eq!(status, SyscallStatus::AuthenticationMismatch);

        let mut short = 12u16;
        let status = service.authenticate(lane, Command::Read, &mut short, &mut buffer);
        assert_eq!(status, SyscallStatus::MalformedRequest);

        if rng.next_below(4) == 0 {
            engine.inject_job_failures(1, errno::EIO);
            let mut length = 33u16;
            let status = service.authenticate(lane, Command::Write, &mut length, &mut buffer);
            assert_eq!(status, SyscallStatus::EngineFailed(errno::EIO));
        }
    }

    let accounting = engine.accounting();
    assert_with_log!(
        accounting.jobs_outstanding() == 0,
        "every job released",
        0,
        accounting.jobs_outstanding()
    );
    assert_eq!(accounting.jobs_acquired(), accounting.jobs_released());
    assert!(accounting.jobs_peak() <= 1);
    assert_eq!(accounting.acquire_failures(), 0);
    test_complete!("no_job_growth_across_mixed_calls");
}
