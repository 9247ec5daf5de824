use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        resolution: Resolution::new(4, 2),
        fps: Fps::whole(10),
        audio: None,
        settings: EncodeSettings::from_config(&RenderConfig::default()),
    }
}

#[test]
fn settings_follow_profile_thread_cap_unless_overridden() {
    let low = RenderConfig {
        profile: crate::config::Profile::Low,
        ..RenderConfig::default()
    };
    assert_eq!(EncodeSettings::from_config(&low).threads, Some(1));
    assert_eq!(EncodeSettings::from_config(&RenderConfig::default()).threads, None);

    let mut pinned = low.clone();
    pinned.encoder.threads = Some(4);
    let s = EncodeSettings::from_config(&pinned);
    assert_eq!(s.threads, Some(4));
    assert_eq!(s.preset, "ultrafast");
    assert_eq!(s.crf, 23);
}

#[test]
fn config_validation_catches_bad_values() {
    let mut c = cfg();
    c.resolution = Resolution::new(5, 2);
    assert!(c.validate().is_err());

    let mut c = cfg();
    c.audio = Some(AudioInputConfig {
        path: PathBuf::from("a.f32le"),
        sample_rate: 0,
        channels: 2,
    });
    assert!(c.validate().is_err());
    assert!(cfg().validate().is_ok());
}

#[test]
fn in_memory_sink_records_frames_and_checks_size() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &RgbImage::new(4, 2)).is_err());

    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &RgbImage::new(4, 2)).unwrap();
    sink.push_frame(FrameIndex(1), &RgbImage::new(4, 2)).unwrap();
    assert!(sink.push_frame(FrameIndex(2), &RgbImage::new(2, 2)).is_err());
    sink.end().unwrap();

    assert!(sink.is_ended());
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.config().unwrap().fps, Fps::whole(10));
}
