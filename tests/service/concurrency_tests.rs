use crate::common::{self, engine, request, service_on, service_with};
use lanemac::service::{Command, SyscallStatus};
use lanemac::{RetryPolicy, ServiceConfig};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn lanes_run_in_parallel_without_interference() {
    common::init_test_logging();
    test_phase!("lanes_run_in_parallel_without_interference");
    let engine = engine();
    let service = Arc::new(service_on(&engine));
    let lanes = 8u8;
    let barrier = Arc::new(Barrier::new(usize::from(lanes)));

    let handles: Vec<_> = (0..lanes)
        .map(|lane| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..25u8 {
                    let mut buffer = request(64, &[lane, round, lane ^ round]);
                    let mut length = 64u16;
                    assert!(service.authenticate(lane, Command::Write, &mut length, &mut buffer).is_success());
                    assert!(service.authenticate(lane, Command::Read, &mut length, &mut buffer).is_success());
                    buffer[63] ^= 0xff;
                    let status = service.authenticate(lane, Command::Read, &mut length, &mut buffer);
                    assert_eq!(status, SyscallStatus::AuthenticationMismatch);
                    assert_eq!(length, 0);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = service.stats().snapshot();
    assert_with_log!(stats.generated == 200, "all writes counted", 200, stats.generated);
    assert_eq!(stats.verified_ok, 200);
    assert_eq!(stats.verified_fail, 200);
    assert_eq!(engine.session_count(), usize::from(lanes));
    assert_eq!(engine.accounting().jobs_outstanding(), 0);
    test_complete!("lanes_run_in_parallel_without_interference");
}

#[test]
fn concurrent_reads_on_one_lane_stay_consistent() {
    common::init_test_logging();
    test_phase!("concurrent_reads_on_one_lane_stay_consistent");
    let engine = engine();
    let service = Arc::new(service_on(&engine));

    let mut good = request(48, b"shared lane");
    service.generate(7, &mut good, 48).unwrap();
    let mut bad = good.clone();
    bad[40] ^= 0x10;
    let good = Arc::new(good);
    let bad = Arc::new(bad);

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let service = Arc::clone(&service);
            let buffer = if i % 2 == 0 { Arc::clone(&good) } else { Arc::clone(&bad) };
            thread::spawn(move || {
                for _ in 0..30 {
                    let result = service.verify(7, &buffer, 48);
                    assert_eq!(result.is_ok(), i % 2 == 0);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = service.stats().snapshot();
    assert_eq!(stats.verified_ok, 90);
    assert_eq!(stats.verified_fail, 90);
    assert_eq!(engine.session_count(), 1);
    test_complete!("concurrent_reads_on_one_lane_stay_consistent");
}

#[test]
fn busy_backoff_on_one_lane_does_not_delay_another() {
    common::init_test_logging();
    test_phase!("busy_backoff_on_one_lane_does_not_delay_another");
    let engine = engine();
    let config = ServiceConfig {
        retry: RetryPolicy::bounded(4).with_backoff_ms(800),
        ..ServiceConfig::default()
    };
    let service = Arc::new(service_with(&engine, config));
    service.ensure_session(0).unwrap();
    service.ensure_session(1).unwrap();
    engine.inject_busy(1);

    let slow = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            let mut buffer = request(25, b"lane zero");
            service.generate(0, &mut buffer, 25)
        })
    };
    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.accounting().busy_outcomes() == 0 {
        assert!(Instant::now() < deadline, "lane 0 never saw a busy completion");
        thread::sleep(Duration::from_millis(1));
    }

    let started = Instant::now();
    let mut buffer = request(25, b"lane one");
    service.generate(1, &mut buffer, 25).unwrap();
    let elapsed = started.elapsed();
    assert_with_log!(
        elapsed < Duration::from_millis(400),
        "lane 1 served during lane 0 backoff",
        "< 400ms",
        elapsed
    );

    slow.join().unwrap().unwrap();
    assert_eq!(service.stats().snapshot().busy_retries, 1);
    assert_eq!(engine.accounting().jobs_outstanding(), 0);
    test_complete!("busy_backoff_on_one_lane_does_not_delay_another");
}
