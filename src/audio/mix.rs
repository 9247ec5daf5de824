//! Narration track assembly and background music mixing.
//!
//! Tracks are summed, never replaced, and the sum is clamped to `[-1, 1]`. Narration gain
//! is never touched; only the background is attenuated.

use std::path::Path;

use crate::assets::media::AudioPcm;
use crate::foundation::error::{SlideError, SlideResult};
use crate::media::MediaTools;
use crate::timeline::Timeline;

/// What the exporter should pair with the picture.
#[derive(Clone, Debug, PartialEq)]
pub enum MixedAudio {
    /// The narration track, unchanged.
    NarrationOnly,
    /// Narration with the attenuated background summed in.
    Mixed(AudioPcm),
}

impl MixedAudio {
    pub fn has_background(&self) -> bool {
        matches!(self, Self::Mixed(_))
    }
}

/// Sum `(sample_offset, track)` pairs into a silent buffer of `total_frames`.
pub(crate) fn lay_out_tracks<'t>(
    tracks: impl IntoIterator<Item = (usize, &'t AudioPcm)>,
    total_frames: usize,
    sample_rate: u32,
    channels: u16,
) -> AudioPcm {
    let mut out = AudioPcm::silence(sample_rate, channels, total_frames);
    let ch = usize::from(channels);
    for (offset, track) in tracks {
        if track.channels != channels || offset >= total_frames {
            continue;
        }
        let start = offset * ch;
        let end = (start + track.interleaved_f32.len()).min(out.interleaved_f32.len());
        for (dst, src) in out.interleaved_f32[start..end]
            .iter_mut()
            .zip(&track.interleaved_f32)
        {
            *dst += *src;
        }
    }
    for s in &mut out.interleaved_f32 {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

/// Whole copies of `bg` end to end, `ceil(total / bg) + 1` of them, cut to `total_frames`.
pub fn loop_to_length(bg: &AudioPcm, total_frames: usize) -> SlideResult<AudioPcm> {
    let bg_frames = bg.frames();
    if bg_frames == 0 {
        return Err(SlideError::media("background track has no samples"));
    }
    let copies = total_frames.div_ceil(bg_frames) + 1;
    let mut samples = Vec::with_capacity(copies * bg.interleaved_f32.len());
    for _ in 0..copies {
        samples.extend_from_slice(&bg.interleaved_f32);
    }
    let mut looped = AudioPcm {
        sample_rate: bg.sample_rate,
        channels: bg.channels,
        interleaved_f32: samples,
    };
    looped.fit_to_frames(total_frames);
    Ok(looped)
}

/// `narration + gain * loop(bg)`, clamped, exactly as long as the narration.
pub fn mix_tracks(narration: &AudioPcm, bg: &AudioPcm, gain: f32) -> SlideResult<AudioPcm> {
    if !narration.same_layout(bg) {
        return Err(SlideError::media(format!(
            "background is {} Hz x{}, narration is {} Hz x{}",
            bg.sample_rate, bg.channels, narration.sample_rate, narration.channels
        )));
    }
    let looped = loop_to_length(bg, narration.frames())?;
    let mut out = narration.clone();
    for (dst, b) in out.interleaved_f32.iter_mut().zip(&looped.interleaved_f32) {
        *dst = (*dst + b * gain).clamp(-1.0, 1.0);
    }
    Ok(out)
}

pub struct AudioMixer<'a> {
    media: &'a dyn MediaTools,
    sample_rate: u32,
    gain: f32,
}

impl<'a> AudioMixer<'a> {
    pub fn new(media: &'a dyn MediaTools, sample_rate: u32, gain: f32) -> Self {
        Self {
            media,
            sample_rate,
            gain,
        }
    }

    /// Never fails: any problem with the background degrades to narration only.
    #[tracing::instrument(skip_all, fields(background = ?background.map(Path::display)))]
    pub fn mix(&self, timeline: &Timeline, background: Option<&Path>) -> MixedAudio {
        let Some(path) = background else {
            return MixedAudio::NarrationOnly;
        };
        match self.try_mix(timeline, path) {
            Ok(pcm) => {
                tracing::info!(gain = self.gain, "background mixed");
                MixedAudio::Mixed(pcm)
            }
            Err(err) => {
                tracing::warn!(%err, "background mix failed, exporting narration only");
                MixedAudio::NarrationOnly
            }
        }
    }

    fn try_mix(&self, timeline: &Timeline, path: &Path) -> SlideResult<AudioPcm> {
        let narration = match timeline {
            Timeline::InMemory(t) => t.narration(self.sample_rate),
            Timeline::OnDisk(t) => {
                let mut pcm = self.media.decode_audio(t.file().path(), self.sample_rate)?;
                let frames = crate::foundation::core::frame_to_sample(
                    timeline.frame_count(),
                    timeline.fps(),
                    self.sample_rate,
                ) as usize;
                pcm.fit_to_frames(frames);
                pcm
            }
        };
        let bg = self.media.decode_audio(path, self.sample_rate)?;
        mix_tracks(&narration, &bg, self.gain)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
