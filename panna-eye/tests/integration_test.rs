//! Integration tests for panna-eye public API

use panna_core::Error;
use panna_eye::config::{CameraConfig, DetectionConfig, MirrorMethod};
use panna_eye::error::VisionError;
use panna_eye::VisionPipeline;

#[test]
fn test_default_config_builds_pipeline() {
    let pipeline = VisionPipeline::new(DetectionConfig::default());
    assert!(pipeline.is_ok());
}

#[test]
fn test_config_serialization() {
    let config = DetectionConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let deserialized: DetectionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, deserialized);
}

#[test]
fn test_mirror_method_serialization() {
    for method in [MirrorMethod::Hough, MirrorMethod::Contour] {
        let json = serde_json::to_string(&method).unwrap();
        let back: MirrorMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(method, back);
    }
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let mut config = DetectionConfig::default();
    config.mirror.detection_interval = 0;
    match VisionPipeline::new(config) {
        Err(VisionError::Config(msg)) => assert!(msg.contains("detection_interval")),
        _ => panic!("Expected config error"),
    }
}

#[test]
fn test_config_error_converts_to_core_error() {
    let mut config = DetectionConfig::default();
    config.mirror.fallback_center = (0, 0);
    let err = VisionPipeline::new(config).err().unwrap();
    let core_err: Error = err.into();
    match core_err {
        Error::Configuration(msg) => assert!(msg.contains("fallback_center")),
        _ => panic!("Expected Configuration error"),
    }
}

#[test]
fn test_error_display() {
    let err = VisionError::Camera("test error".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Camera error"));
    assert!(display.contains("test error"));
}

#[test]
fn test_camera_config_defaults() {
    let config = CameraConfig::default();
    assert_eq!(config.camera_id, 0);
    assert_eq!(config.frame_rate, 30);
    assert_eq!(config.resolution, (640, 480));
    assert!(config.validate().is_ok());
}
