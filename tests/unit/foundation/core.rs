use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
    assert_eq!(Fps::new(24, 1).unwrap(), Fps::whole(24));
}

#[test]
fn fps_secs_to_frames_rounds_to_nearest() {
    let fps = Fps::whole(24);
    assert_eq!(fps.secs_to_frames_round(1.0), 24);
    assert_eq!(fps.secs_to_frames_round(1.02), 24);
    assert_eq!(fps.secs_to_frames_round(1.03), 25);
    assert_eq!(fps.secs_to_frames_round(-1.0), 0);
}

#[test]
fn resolution_requires_even_dimensions() {
    assert!(Resolution::new(1280, 720).validate().is_ok());
    assert!(Resolution::new(1281, 720).validate().is_err());
    assert!(Resolution::new(0, 720).validate().is_err());
}

#[test]
fn frame_to_sample_uses_rational_fps() {
    let fps = Fps::new(30000, 1001).unwrap();
    let samples = frame_to_sample(300, fps, 48_000);
    assert!(samples > 470_000 && samples < 490_000);
    assert_eq!(frame_to_sample(24, Fps::whole(24), 48_000), 48_000);
}

#[test]
fn fps_secs_to_frames_ceil_covers_duration() {
    let fps = Fps::whole(15);
    assert_eq!(fps.secs_to_frames_ceil(1.0), 15);
    assert_eq!(fps.secs_to_frames_ceil(1.01), 16);
    assert_eq!(fps.secs_to_frames_ceil(2.4), 36);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
}
