use super::*;

fn cfg() -> RenderConfig {
    RenderConfig {
        profile: crate::config::Profile::Low,
        ..RenderConfig::default()
    }
}

fn tone(secs: f64) -> AudioPcm {
    let frames = (secs * 48_000.0).round() as usize;
    AudioPcm {
        sample_rate: 48_000,
        channels: 2,
        interleaved_f32: vec![0.25; frames * 2],
    }
}

fn still() -> RgbImage {
    RgbImage::from_pixel(640, 360, image::Rgb([10, 20, 30]))
}

#[test]
fn duration_is_audio_plus_pad_rounded_up_to_frames() {
    let clip = ClipBuilder::from_config(&cfg())
        .build(0, still(), tone(2.0))
        .unwrap();
    // 2.0s + 0.4s at 10 fps.
    assert_eq!(clip.frame_count, 24);
    assert!((clip.duration_sec() - 2.4).abs() < 1e-9);
    assert!((clip.audio_duration_sec - 2.0).abs() < 1e-9);

    let clip = ClipBuilder::from_config(&cfg())
        .build(0, still(), tone(2.03))
        .unwrap();
    assert_eq!(clip.frame_count, 25);
    assert!(clip.duration_sec() >= 2.03 + 0.4);
}

#[test]
fn narration_is_padded_with_silence_not_stretched() {
    let clip = ClipBuilder::from_config(&cfg())
        .build(0, still(), tone(1.0))
        .unwrap();
    let audio = clip.audio().unwrap();
    assert_eq!(audio.sample_rate, 48_000);
    assert_eq!(audio.frames(), 48_000 * 14 / 10);
    assert_eq!(audio.interleaved_f32[0], 0.25);
    assert_eq!(audio.interleaved_f32[2 * 48_000 - 1], 0.25);
    assert_eq!(*audio.interleaved_f32.last().unwrap(), 0.0);
}

#[test]
fn rejects_mismatched_still_and_silent_audio() {
    let b = ClipBuilder::from_config(&cfg());
    assert!(b.build(0, RgbImage::new(64, 36), tone(1.0)).is_err());
    assert!(b.build(0, still(), tone(0.0)).is_err());
    let mut wrong_rate = tone(1.0);
    wrong_rate.sample_rate = 44_100;
    assert!(b.build(0, still(), wrong_rate).is_err());
}

#[test]
fn frames_zoom_over_time_at_fixed_size() {
    let mut src = RgbImage::from_pixel(640, 360, image::Rgb([0, 0, 0]));
    for y in 0..360 {
        for x in 0..8 {
            src.put_pixel(x, y, image::Rgb([255, 255, 255]));
        }
    }
    let clip = ClipBuilder::from_config(&cfg())
        .build(0, src, tone(3.0))
        .unwrap();
    let first = clip.render_frame(0).unwrap();
    let last = clip.render_frame(clip.frame_count - 1).unwrap();
    assert_eq!(first.dimensions(), (640, 360));
    assert_eq!(last.dimensions(), (640, 360));
    assert_eq!(first.get_pixel(0, 180).0, [255, 255, 255]);
    assert_eq!(last.get_pixel(0, 180).0, [0, 0, 0]);
    assert!(clip.render_frame(clip.frame_count).is_err());
}

#[test]
fn disk_clip_keeps_timing_and_drops_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, b"x").unwrap();
    let clip = ClipBuilder::from_config(&cfg())
        .build(2, still(), tone(1.0))
        .unwrap();
    let frames = clip.frame_count;
    let clip = clip.into_disk(ScratchFile::new(&path));
    assert!(clip.is_on_disk());
    assert_eq!(clip.frame_count, frames);
    assert_eq!(clip.path(), Some(path.as_path()));
    assert!(clip.audio().is_none());
    assert!(clip.render_frame(0).is_err());
    drop(clip);
    assert!(!path.exists());
}
