//! Render configuration bundle.
//!
//! Every field has a default, so an empty JSON object is a complete configuration. The
//! constants observed across deployments (cross-fade, zoom rate, tail pad, background gain)
//! are tunables here rather than fixed contracts.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{SlideError, SlideResult};

/// Deployment profile selecting output resolution and frame rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Constrained/cloud environments.
    Low,
    /// Default desktop profile; matches the 1024x576 stills produced upstream.
    #[default]
    Medium,
    /// Local/interactive use.
    High,
}

impl Profile {
    pub fn resolution(self) -> Resolution {
        match self {
            Self::Low => Resolution::new(640, 360),
            Self::Medium => Resolution::new(1024, 576),
            Self::High => Resolution::new(1280, 720),
        }
    }

    pub fn fps(self) -> Fps {
        match self {
            Self::Low => Fps::whole(10),
            Self::Medium => Fps::whole(15),
            Self::High => Fps::whole(24),
        }
    }

    /// Encoder thread cap; `None` leaves it to ffmpeg.
    pub fn encoder_threads(self) -> Option<u32> {
        match self {
            Self::Low => Some(1),
            Self::Medium | Self::High => None,
        }
    }

    pub fn subtitle_style(self) -> SubtitleStyle {
        match self {
            Self::Low => SubtitleStyle::Plate,
            Self::Medium | Self::High => SubtitleStyle::Stroke,
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = SlideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(SlideError::validation(format!("unknown profile '{other}'"))),
        }
    }
}

/// When compiled clips leave memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushStrategy {
    /// Encode every clip to an intermediate file before the next scene starts.
    Eager,
    /// Hold every clip in memory until assembly.
    #[default]
    Deferred,
}

impl std::str::FromStr for FlushStrategy {
    type Err = SlideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "deferred" => Ok(Self::Deferred),
            other => Err(SlideError::validation(format!(
                "unknown flush strategy '{other}'"
            ))),
        }
    }
}

/// How compiled clips are joined into one track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// Back-to-back join of uniform clips, no overlap.
    Chain,
    /// Re-timed join with a cross-dissolve overlap between neighbours.
    Compose,
}

impl std::str::FromStr for JoinMode {
    type Err = SlideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chain" => Ok(Self::Chain),
            "compose" => Ok(Self::Compose),
            other => Err(SlideError::validation(format!("unknown join mode '{other}'"))),
        }
    }
}

/// Subtitle legibility treatment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleStyle {
    /// White glyphs with a heavy black outline.
    Stroke,
    /// Plain white glyphs over a semi-transparent dark plate.
    Plate,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// `None` picks the profile's style.
    pub style: Option<SubtitleStyle>,
    /// Font size as a fraction of frame height.
    pub font_size_ratio: f32,
    /// Distance from the bottom edge to the text block, as a fraction of frame height.
    pub bottom_margin_ratio: f32,
    /// Outline width as a fraction of font size (stroke style).
    pub stroke_ratio: f32,
    /// Line height as a multiple of font size.
    pub line_height: f32,
    /// Characters per line for logographic scripts.
    pub max_chars_logographic: usize,
    /// Characters per line for space-delimited scripts.
    pub max_chars_spaced: usize,
    /// Plate opacity (plate style).
    pub plate_alpha: u8,
    /// Bundled font file; relative paths resolve against the work dir.
    pub font_path: Option<PathBuf>,
    /// Platform font family tried when the bundled font is unusable.
    pub platform_family: String,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            style: None,
            font_size_ratio: 0.095,
            bottom_margin_ratio: 0.17,
            stroke_ratio: 0.075,
            line_height: 1.25,
            max_chars_logographic: 16,
            max_chars_spaced: 32,
            plate_alpha: 150,
            font_path: Some(PathBuf::from("font.ttf")),
            platform_family: "Noto Sans CJK SC".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub video_codec: String,
    pub audio_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_bitrate: String,
    /// `None` picks the profile's thread cap.
    pub threads: Option<u32>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "ultrafast".to_string(),
            crf: 23,
            audio_bitrate: "128k".to_string(),
            threads: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub profile: Profile,
    pub flush: FlushStrategy,
    /// `None` follows the flush strategy: eager joins by chain, deferred by compose.
    pub join: Option<JoinMode>,
    /// Silence appended after each narration.
    pub tail_pad_sec: f64,
    pub zoom: bool,
    pub zoom_rate_per_sec: f64,
    /// Fade-in at clip start; cosmetic, never changes clip duration.
    pub crossfade_sec: f64,
    /// Overlap between neighbouring clips in compose mode.
    pub overlap_sec: f64,
    pub background_gain: f32,
    pub sample_rate: u32,
    pub subtitle: SubtitleConfig,
    pub encoder: EncoderConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            flush: FlushStrategy::default(),
            join: None,
            tail_pad_sec: 0.4,
            zoom: true,
            zoom_rate_per_sec: 0.04,
            crossfade_sec: 0.3,
            overlap_sec: 0.3,
            background_gain: 0.12,
            sample_rate: 48_000,
            subtitle: SubtitleConfig::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_path(path: &Path) -> SlideResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read render config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            SlideError::serde(format!("parse render config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn join_mode(&self) -> JoinMode {
        self.join.unwrap_or(match self.flush {
            FlushStrategy::Eager => JoinMode::Chain,
            FlushStrategy::Deferred => JoinMode::Compose,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.profile.resolution()
    }

    pub fn fps(&self) -> Fps {
        self.profile.fps()
    }

    pub fn subtitle_style(&self) -> SubtitleStyle {
        self.subtitle
            .style
            .unwrap_or_else(|| self.profile.subtitle_style())
    }

    /// Overlap actually applied between neighbours; chain joins never overlap.
    pub fn effective_overlap_sec(&self) -> f64 {
        match self.join_mode() {
            JoinMode::Chain => 0.0,
            JoinMode::Compose => self.overlap_sec,
        }
    }

    pub fn encoder_threads(&self) -> Option<u32> {
        self.encoder
            .threads
            .or_else(|| self.profile.encoder_threads())
    }

    pub fn validate(&self) -> SlideResult<()> {
        fn non_negative(name: &str, v: f64) -> SlideResult<()> {
            if !v.is_finite() || v < 0.0 {
                return Err(SlideError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
            Ok(())
        }

        self.resolution().validate()?;
        non_negative("tail_pad_sec", self.tail_pad_sec)?;
        non_negative("zoom_rate_per_sec", self.zoom_rate_per_sec)?;
        non_negative("crossfade_sec", self.crossfade_sec)?;
        non_negative("overlap_sec", self.overlap_sec)?;
        if !self.background_gain.is_finite() || !(0.0..=1.0).contains(&self.background_gain) {
            return Err(SlideError::validation(
                "background_gain must be within [0, 1]",
            ));
        }
        if self.sample_rate == 0 {
            return Err(SlideError::validation("sample_rate must be non-zero"));
        }
        let sub = &self.subtitle;
        if sub.max_chars_logographic == 0 || sub.max_chars_spaced == 0 {
            return Err(SlideError::validation(
                "subtitle line budgets must be non-zero",
            ));
        }
        if !(sub.font_size_ratio > 0.0 && sub.font_size_ratio < 1.0) {
            return Err(SlideError::validation(
                "subtitle font_size_ratio must be within (0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&sub.bottom_margin_ratio) {
            return Err(SlideError::validation(
                "subtitle bottom_margin_ratio must be within [0, 1)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
