//! Property-based tests for generate/verify.
//!
//! - A freshly written tag always verifies
//! - Any single-bit change inside the tag or payload is rejected
//! - Lengths below the minimum never reach the engine

use crate::common::{engine, service_on};
use lanemac::engine::SoftEngine;
use lanemac::security::MacErrorKind;
use lanemac::service::MacService;
use proptest::prelude::*;
use std::sync::{Arc, OnceLock};

fn shared() -> &'static (Arc<SoftEngine>, MacService) {
    static SHARED: OnceLock<(Arc<SoftEngine>, MacService)> = OnceLock::new();
    SHARED.get_or_init(|| {
        let engine = engine();
        let service = service_on(&engine);
        (engine, service)
    })
}

// Strategy for a request: lane, payload bytes after the tag, slack at the end
// of the buffer.
fn request_strategy() -> impl Strategy<Value = (u8, Vec<u8>, usize)> {
    (0u8..15, prop::collection::vec(any::<u8>(), 0..96), 0usize..8)
}

#[test]
fn prop_generated_tag_verifies() {
    let (_, service) = shared();
    proptest!(|((lane, payload, slack) in request_strategy())| {
        let total = 20 + payload.len();
        let mut buffer = vec![0u8; total + slack];
        buffer[20..total].copy_from_slice(&payload);

        service.generate(lane, &mut buffer, total).unwrap();
        prop_assert!(service.verify(lane, &buffer, total).is_ok());
        prop_assert_eq!(&buffer[20..total], payload.as_slice());
    });
}

#[test]
fn prop_single_bit_flip_is_rejected() {
    let (_, service) = shared();
    proptest!(|((lane, payload, _slack) in request_strategy(), pick in any::<prop::sample::Index>(), bit in 0u8..8)| {
        let total = 20 + payload.len();
        let mut buffer = vec![0u8; total];
        buffer[20..].copy_from_slice(&payload);
        service.generate(lane, &mut buffer, total).unwrap();

        let index = 4 + pick.index(total - 4);
        buffer[index] ^= 1 << bit;
        let err = service.verify(lane, &buffer, total).unwrap_err();
        prop_assert_eq!(err.kind(), MacErrorKind::AuthenticationMismatch);
    });
}

#[test]
fn prop_short_lengths_never_reach_engine() {
    let engine = engine();
    let service = service_on(&engine);
    proptest!(|(lane in 0u8..15, length in 0usize..20)| {
        let mut buffer = vec![0u8; 64];
        let err = service.generate(lane, &mut buffer, length).unwrap_err();
        prop_assert_eq!(err.kind(), MacErrorKind::MalformedRequest);
        prop_assert!(service.verify(lane, &buffer, length).is_err());
    });
    assert_eq!(engine.accounting().jobs_acquired(), 0);
    assert_eq!(engine.session_count(), 0);
}
