use super::*;

#[test]
fn pcm_duration_counts_frames_not_samples() {
    let pcm = AudioPcm::silence(48_000, 2, 24_000);
    assert_eq!(pcm.frames(), 24_000);
    assert!((pcm.duration_secs() - 0.5).abs() < 1e-12);
}

#[test]
fn fit_to_frames_pads_and_truncates() {
    let mut pcm = AudioPcm {
        sample_rate: 4,
        channels: 2,
        interleaved_f32: vec![0.5; 4],
    };
    pcm.fit_to_frames(4);
    assert_eq!(pcm.interleaved_f32, vec![0.5, 0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);
    pcm.fit_to_frames(1);
    assert_eq!(pcm.interleaved_f32, vec![0.5, 0.5]);
}

#[test]
fn write_f32le_is_little_endian_raw() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("mix.f32le");
    let pcm = AudioPcm {
        sample_rate: 48_000,
        channels: 2,
        interleaved_f32: vec![1.0, -0.5],
    };
    pcm.write_f32le(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes(bytes[4..8].try_into().unwrap()), -0.5);
}

#[test]
fn parse_ff_ratio_accepts_rational_and_whole() {
    assert_eq!(parse_ff_ratio("24/1"), Some((24, 1)));
    assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
    assert_eq!(parse_ff_ratio("15"), Some((15, 1)));
    assert_eq!(parse_ff_ratio("0/0"), None);
}
