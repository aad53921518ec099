use super::{AppConfig, EngineConfig};
use clap::Parser;

fn base_config() -> AppConfig {
    AppConfig::parse_from(["test-app", "--text", "The quick brown fox."])
}

#[test]
fn requires_practice_text_unless_listing_devices() {
    let cfg = AppConfig::parse_from(["test-app"]);
    assert!(cfg.validate().is_err());

    let cfg = AppConfig::parse_from(["test-app", "--list-input-devices"]);
    assert!(cfg.validate().is_ok());

    assert!(base_config().validate().is_ok());
}

#[test]
fn rejects_text_and_text_file_together() {
    let cfg = AppConfig::parse_from([
        "test-app",
        "--text",
        "hello",
        "--text-file",
        "/tmp/story.txt",
    ]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_empty_text() {
    let cfg = AppConfig::parse_from(["test-app", "--text", "   "]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_missing_text_file() {
    let cfg = AppConfig::parse_from([
        "test-app",
        "--text-file",
        "/nonexistent/definitely-not-here.txt",
    ]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_speech_threshold_out_of_bounds() {
    let mut cfg = base_config();
    cfg.speech_threshold = 0.0;
    assert!(cfg.validate().is_err());
    cfg.speech_threshold = 1.5;
    assert!(cfg.validate().is_err());
    cfg.speech_threshold = 0.035;
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_silence_timeout_out_of_bounds() {
    let mut cfg = base_config();
    cfg.silence_timeout_ms = 100;
    assert!(cfg.validate().is_err());
    cfg.silence_timeout_ms = cfg.max_capture_ms + 1;
    assert!(cfg.validate().is_err());
    cfg.silence_timeout_ms = 6_000;
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_warmup_longer_than_max_capture() {
    let mut cfg = base_config();
    cfg.warmup_ms = cfg.max_capture_ms + 1;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_header_sized_min_clip() {
    let mut cfg = base_config();
    cfg.min_clip_bytes = 44;
    assert!(cfg.validate().is_err());
    cfg.min_clip_bytes = 45;
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_channel_capacity_out_of_bounds() {
    let mut cfg = base_config();
    cfg.channel_capacity = 4;
    assert!(cfg.validate().is_err());
    cfg.channel_capacity = 2_048;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_non_http_recognizer_url() {
    let mut cfg = base_config();
    cfg.recognizer_url = "ftp://example.com/stt".to_string();
    assert!(cfg.validate().is_err());
}

#[test]
fn engine_config_mirrors_cli_values() {
    let cfg = AppConfig::parse_from([
        "test-app",
        "--text",
        "hello",
        "--silence-timeout-ms",
        "6000",
        "--speech-threshold",
        "0.05",
        "--warmup-ms",
        "2000",
    ]);
    let engine = cfg.engine_config();
    assert_eq!(engine.silence_timeout_ms, 6_000);
    assert!((engine.speech_threshold - 0.05).abs() < 1e-6);
    assert_eq!(engine.warmup_ms, 2_000);
    assert_eq!(engine.sample_rate, crate::audio::TARGET_RATE);
}

#[test]
fn engine_config_defaults_match_flag_defaults() {
    let defaults = EngineConfig::default();
    let from_cli = base_config().engine_config();
    assert_eq!(defaults.silence_timeout_ms, from_cli.silence_timeout_ms);
    assert_eq!(defaults.min_clip_bytes, from_cli.min_clip_bytes);
    assert_eq!(
        defaults.advance_block_threshold,
        from_cli.advance_block_threshold
    );
}

#[test]
fn practice_text_prefers_inline_flag() {
    let cfg = base_config();
    assert_eq!(cfg.practice_text().unwrap(), "The quick brown fox.");
}
