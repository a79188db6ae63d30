use std::path::Path;

use v4l2capture::{Config, FieldOrder, FourCC};

#[test]
fn defaults_match_reference_session() {
    let config = Config::default();

    assert_eq!(config.device, Path::new("/dev/video0"));
    assert_eq!((config.width, config.height), (640, 480));
    assert_eq!(config.fourcc, FourCC::YUYV);
    assert_eq!(config.field, FieldOrder::Any);
    assert_eq!(config.buffers, 4);
    assert_eq!(config.frames, 100);
    assert_eq!(config.output_dir, Path::new("."));
    assert_eq!(config.prefix, "frame");
    assert!(config.extension.is_none());
    assert!(config.timeout.is_none());
}

#[test]
fn parses_pixel_formats() {
    assert_eq!("MJPG".parse::<FourCC>().unwrap(), FourCC::MJPG);
    assert_eq!("GREY".parse::<FourCC>().unwrap(), FourCC::new(b"GREY"));
    assert!("".parse::<FourCC>().is_err());
    assert!("YUYV2".parse::<FourCC>().is_err());
}

#[test]
fn default_sink_names_frames_after_prefix() {
    let config = Config {
        output_dir: "captures".into(),
        extension: Some("raw".to_string()),
        ..Config::default()
    };

    assert_eq!(config.sink().path(41), Path::new("captures/frame41.raw"));
}
