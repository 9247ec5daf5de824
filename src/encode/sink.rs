use std::path::PathBuf;

use image::RgbImage;

use crate::config::RenderConfig;
use crate::foundation::core::{Fps, FrameIndex, Resolution};
use crate::foundation::error::{SlideError, SlideResult};

/// Codec choices for every encode a run performs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeSettings {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_bitrate: String,
    pub threads: Option<u32>,
}

impl EncodeSettings {
    pub fn from_config(cfg: &RenderConfig) -> Self {
        let enc = &cfg.encoder;
        Self {
            video_codec: enc.video_codec.clone(),
            audio_codec: enc.audio_codec.clone(),
            preset: enc.preset.clone(),
            crf: enc.crf,
            audio_bitrate: enc.audio_bitrate.clone(),
            threads: cfg.encoder_threads(),
        }
    }
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkConfig {
    pub resolution: Resolution,
    /// Always explicit; the encoder is never left to pick a rate.
    pub fps: Fps,
    /// Optional raw PCM track muxed alongside the frames.
    pub audio: Option<AudioInputConfig>,
    pub settings: EncodeSettings,
}

impl SinkConfig {
    pub fn validate(&self) -> SlideResult<()> {
        self.resolution.validate()?;
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(SlideError::validation("fps must be non-zero"));
        }
        if let Some(audio) = &self.audio {
            if audio.sample_rate == 0 {
                return Err(SlideError::validation(
                    "audio sample_rate must be non-zero when audio is enabled",
                ));
            }
            if audio.channels == 0 {
                return Err(SlideError::validation(
                    "audio channels must be non-zero when audio is enabled",
                ));
            }
        }
        Ok(())
    }
}

/// Interleaved `f32le` PCM file input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioInputConfig {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Consumer of opaque RGB frames in timeline order.
///
/// `push_frame` is called with strictly increasing indices between one `begin` and `end`.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> SlideResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> SlideResult<()>;
    fn end(&mut self) -> SlideResult<()>;
}

/// Keeps every frame; for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    pub(crate) frames: Vec<(FrameIndex, RgbImage)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, RgbImage)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SlideResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> SlideResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| SlideError::validation("sink not started"))?;
        check_frame(cfg, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> SlideResult<()> {
        self.ended = true;
        Ok(())
    }
}

pub(crate) fn check_frame(cfg: &SinkConfig, frame: &RgbImage) -> SlideResult<()> {
    if frame.dimensions() != (cfg.resolution.width, cfg.resolution.height) {
        return Err(SlideError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}",
            frame.width(),
            frame.height(),
            cfg.resolution
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
