use crate::common::{self, engine, request};
use lanemac::config::{ConfigError, ServiceConfig};
use lanemac::security::{AuthKey, WireLayout};
use lanemac::service::MacService;
use lanemac::RetryPolicy;
use std::time::Duration;

#[test]
fn toml_document_overrides_defaults() {
    common::init_test_logging();
    test_phase!("toml_document_overrides_defaults");
    let text = r#"
        lane_count = 4
        wait_timeout_ms = 250

        [layout]
        reference_prefix_len = 8
        tag_offset = 2

        [retry]
        max_busy_retries = 3
        busy_backoff_ms = 1
    "#;
    let config: ServiceConfig = toml::from_str(text).unwrap();
    config.validate().unwrap();
    assert_eq!(config.lane_count, 4);
    assert_eq!(config.layout, WireLayout::new(8, 2));
    assert_eq!(config.retry, RetryPolicy::bounded(3).with_backoff_ms(1));
    assert_eq!(config.wait_timeout(), Some(Duration::from_millis(250)));
    test_complete!("toml_document_overrides_defaults");
}

#[test]
fn empty_toml_document_is_default() {
    let config: ServiceConfig = toml::from_str("").unwrap();
    assert_eq!(config, ServiceConfig::default());
}

#[test]
fn builder_rejects_tag_outside_frame() {
    common::init_test_logging();
    let err = MacService::builder(engine())
        .key(AuthKey::from_seed(1))
        .layout(WireLayout::new(4, 5))
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::TagOutsideFrame { tag_offset: 5, .. }));
}

#[test]
fn custom_layout_with_tag_inside_prefix_round_trips() {
    common::init_test_logging();
    test_phase!("custom_layout_with_tag_inside_prefix_round_trips");
    let engine = engine();
    let service = MacService::builder(engine.clone())
        .key(AuthKey::from_seed(common::TEST_KEY_SEED))
        .layout(WireLayout::new(20, 4))
        .build()
        .unwrap();

    // Prefix 20 puts the whole tag region outside the covered payload.
    let mut buffer = request(36, b"sixteen byte msg");
    assert!(service.generate(0, &mut buffer, 35).is_err());
    let mut buffer = request(36, b"sixteen byte msg");
    service.generate(0, &mut buffer, 36).unwrap();
    service.verify(0, &buffer, 36).unwrap();

    buffer[0] ^= 1;
    service.verify(0, &buffer, 36).unwrap();
    buffer[25] ^= 1;
    assert!(service.verify(0, &buffer, 36).unwrap_err().is_mismatch());
    test_complete!("custom_layout_with_tag_inside_prefix_round_trips");
}

#[test]
fn custom_layout_with_overlapping_tag_round_trips() {
    common::init_test_logging();
    let engine = engine();
    let service = MacService::builder(engine.clone())
        .key(AuthKey::from_seed(common::TEST_KEY_SEED))
        .layout(WireLayout::new(8, 2))
        .build()
        .unwrap();

    let mut buffer = request(40, b"overlap");
    service.generate(1, &mut buffer, 40).unwrap();
    service.verify(1, &buffer, 40).unwrap();
    buffer[12] ^= 1;
    assert!(service.verify(1, &buffer, 40).unwrap_err().is_mismatch());
}
