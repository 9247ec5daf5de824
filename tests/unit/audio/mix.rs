use super::*;
use crate::assets::media::MIX_CHANNELS;
use crate::clip::builder::ClipBuilder;
use crate::config::JoinMode;
use crate::test_support::{FakeMedia, Fixture, TONE_LEVEL, test_config};
use crate::timeline::{Assembled, TimelineAssembler};

const SR: u32 = 1_000;

fn pcm(samples: &[f32]) -> AudioPcm {
    // Mono content duplicated to stereo.
    AudioPcm {
        sample_rate: SR,
        channels: MIX_CHANNELS,
        interleaved_f32: samples.iter().flat_map(|s| [*s, *s]).collect(),
    }
}

fn left(p: &AudioPcm) -> Vec<f32> {
    p.interleaved_f32.iter().step_by(2).copied().collect()
}

#[test]
fn loop_covers_the_whole_length_without_silence() {
    let bg = pcm(&[0.1, 0.2, 0.3]);
    let looped = loop_to_length(&bg, 10).unwrap();
    assert_eq!(looped.frames(), 10);
    assert_eq!(
        left(&looped),
        vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1]
    );
}

#[test]
fn loop_truncates_a_long_background() {
    let bg = pcm(&[0.5; 100]);
    assert_eq!(loop_to_length(&bg, 7).unwrap().frames(), 7);
}

#[test]
fn loop_rejects_an_empty_background() {
    let bg = pcm(&[]);
    assert!(loop_to_length(&bg, 5).is_err());
}

#[test]
fn mix_attenuates_background_only() {
    let narration = pcm(&[0.5, 0.0, -0.5, 0.25]);
    let bg = pcm(&[1.0, -1.0]);
    let out = mix_tracks(&narration, &bg, 0.12).unwrap();
    assert_eq!(out.frames(), narration.frames());
    let got = left(&out);
    let want = [0.62, -0.12, -0.38, 0.13];
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-6, "{got:?}");
    }
}

#[test]
fn mix_clamps_the_sum() {
    let narration = pcm(&[0.95, -0.95]);
    let bg = pcm(&[1.0, -1.0]);
    let out = mix_tracks(&narration, &bg, 0.5).unwrap();
    assert_eq!(left(&out), vec![1.0, -1.0]);
}

#[test]
fn mix_rejects_mismatched_layouts() {
    let narration = pcm(&[0.1; 4]);
    let bg = AudioPcm {
        sample_rate: 44_100,
        ..pcm(&[0.1; 4])
    };
    assert!(mix_tracks(&narration, &bg, 0.12).is_err());
}

#[test]
fn tracks_are_summed_at_their_offsets() {
    let a = pcm(&[0.5, 0.5, 0.5]);
    let b = pcm(&[0.75, 0.75]);
    let out = lay_out_tracks([(0, &a), (2, &b), (9, &b)], 5, SR, MIX_CHANNELS);
    assert_eq!(left(&out), vec![0.5, 0.5, 1.0, 0.75, 0.0]);
}

fn memory_timeline(fx: &Fixture) -> Timeline {
    let cfg = &fx.ctx.config;
    let res = cfg.resolution();
    let builder = ClipBuilder::from_config(cfg);
    let clips = (0..2)
        .map(|i| {
            let still = image::RgbImage::from_pixel(res.width, res.height, image::Rgb([9, 9, 9]));
            let audio = AudioPcm {
                sample_rate: cfg.sample_rate,
                channels: MIX_CHANNELS,
                interleaved_f32: vec![0.25; cfg.sample_rate as usize * 2],
            };
            builder.build(i, still, audio).unwrap()
        })
        .collect();
    let media = FakeMedia::new();
    match TimelineAssembler::new(&fx.ctx, &media)
        .assemble(clips, JoinMode::Compose)
        .unwrap()
    {
        Assembled::Ready(t) => t,
        Assembled::NoContent => panic!("expected a timeline"),
    }
}

#[test]
fn mixer_sums_background_into_the_timeline_narration() {
    let fx = Fixture::new(test_config());
    let timeline = memory_timeline(&fx);
    let bg = fx.ctx.dirs.bgm_dir.join("loop.mp3");
    std::fs::write(&bg, "tone:0.7").unwrap();

    let media = FakeMedia::new();
    let out = AudioMixer::new(&media, 48_000, 0.12).mix(&timeline, Some(&bg));
    let MixedAudio::Mixed(pcm) = out else {
        panic!("background should mix");
    };
    let expected_frames = crate::foundation::core::frame_to_sample(
        timeline.frame_count(),
        timeline.fps(),
        48_000,
    ) as usize;
    assert_eq!(pcm.frames(), expected_frames);
    // Narration sample plus the attenuated tone.
    assert!((pcm.interleaved_f32[0] - (0.25 + 0.12 * TONE_LEVEL)).abs() < 1e-6);
    // Background keeps playing in the trailing pad of the last clip.
    let last = *pcm.interleaved_f32.last().unwrap();
    assert!((last - 0.12 * TONE_LEVEL).abs() < 1e-6, "{last}");
}

#[test]
fn missing_or_broken_background_degrades_to_narration() {
    let fx = Fixture::new(test_config());
    let timeline = memory_timeline(&fx);
    let media = FakeMedia::new();
    let mixer = AudioMixer::new(&media, 48_000, 0.12);

    assert_eq!(mixer.mix(&timeline, None), MixedAudio::NarrationOnly);
    let missing = fx.ctx.dirs.bgm_dir.join("gone.mp3");
    assert_eq!(mixer.mix(&timeline, Some(&missing)), MixedAudio::NarrationOnly);

    let garbage = fx.ctx.dirs.bgm_dir.join("garbage.mp3");
    std::fs::write(&garbage, "not audio").unwrap();
    assert!(!mixer.mix(&timeline, Some(&garbage)).has_background());
}
