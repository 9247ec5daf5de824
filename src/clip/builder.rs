//! Binds a composited still to its narration as one timed clip.
//!
//! The clip's length is driven by the narration: `audio + tail pad`, rounded up to whole
//! frames. Audio is only ever padded with silence, never resampled or stretched.

use std::path::Path;

use image::RgbImage;

use crate::assets::media::AudioPcm;
use crate::clip::motion::{Motion, zoomed_frame};
use crate::config::RenderConfig;
use crate::foundation::core::{Fps, Resolution, frame_to_sample};
use crate::foundation::error::{SlideError, SlideResult};
use crate::foundation::scratch::ScratchFile;

/// Where a clip's pixels and samples live.
#[derive(Debug)]
pub enum ClipBody {
    /// Still plus padded narration; frames are sampled on demand.
    Memory { still: RgbImage, audio: AudioPcm },
    /// Self-contained intermediate video with its own audio track.
    Disk(ScratchFile),
}

#[derive(Debug)]
pub struct CompiledClip {
    pub scene_index: usize,
    pub resolution: Resolution,
    pub fps: Fps,
    pub frame_count: u64,
    /// Length of the decoded narration, before padding.
    pub audio_duration_sec: f64,
    pub motion: Motion,
    pub body: ClipBody,
}

impl CompiledClip {
    /// Frame-aligned clip length; never shorter than narration plus tail pad.
    pub fn duration_sec(&self) -> f64 {
        self.fps.frames_to_secs(self.frame_count)
    }

    pub fn is_on_disk(&self) -> bool {
        matches!(self.body, ClipBody::Disk(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.body {
            ClipBody::Disk(file) => Some(file.path()),
            ClipBody::Memory { .. } => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioPcm> {
        match &self.body {
            ClipBody::Memory { audio, .. } => Some(audio),
            ClipBody::Disk(_) => None,
        }
    }

    /// Clip-local frame `local` with the zoom applied and no fade.
    pub fn render_frame(&self, local: u64) -> SlideResult<RgbImage> {
        let ClipBody::Memory { still, .. } = &self.body else {
            return Err(SlideError::validation(format!(
                "scene {} was flushed to disk; its frames are not in memory",
                self.scene_index + 1
            )));
        };
        if local >= self.frame_count {
            return Err(SlideError::validation(format!(
                "frame {local} is past the end of scene {} ({} frames)",
                self.scene_index + 1,
                self.frame_count
            )));
        }
        Ok(zoomed_frame(still, self.motion.scale_at_frame(local, self.fps)))
    }

    /// Swap the in-memory body for an encoded intermediate, releasing the still and samples.
    pub fn into_disk(self, file: ScratchFile) -> Self {
        Self {
            body: ClipBody::Disk(file),
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClipBuilder {
    resolution: Resolution,
    fps: Fps,
    sample_rate: u32,
    tail_pad_sec: f64,
    motion: Motion,
}

impl ClipBuilder {
    pub fn from_config(cfg: &RenderConfig) -> Self {
        Self {
            resolution: cfg.resolution(),
            fps: cfg.fps(),
            sample_rate: cfg.sample_rate,
            tail_pad_sec: cfg.tail_pad_sec,
            motion: Motion::from_config(cfg),
        }
    }

    pub fn build(
        &self,
        scene_index: usize,
        still: RgbImage,
        mut narration: AudioPcm,
    ) -> SlideResult<CompiledClip> {
        if still.dimensions() != (self.resolution.width, self.resolution.height) {
            return Err(SlideError::validation(format!(
                "still is {}x{}, run resolution is {}",
                still.width(),
                still.height(),
                self.resolution
            )));
        }
        if narration.sample_rate != self.sample_rate {
            return Err(SlideError::validation(format!(
                "narration is {} Hz, run expects {} Hz",
                narration.sample_rate, self.sample_rate
            )));
        }
        if narration.frames() == 0 {
            return Err(SlideError::media("narration has no samples"));
        }

        let audio_duration_sec = narration.duration_secs();
        let frame_count = self
            .fps
            .secs_to_frames_ceil(audio_duration_sec + self.tail_pad_sec)
            .max(1);
        let samples = frame_to_sample(frame_count, self.fps, self.sample_rate) as usize;
        narration.fit_to_frames(samples.max(narration.frames()));

        tracing::debug!(
            scene = scene_index + 1,
            audio_sec = audio_duration_sec,
            frames = frame_count,
            "clip built"
        );

        Ok(CompiledClip {
            scene_index,
            resolution: self.resolution,
            fps: self.fps,
            frame_count,
            audio_duration_sec,
            motion: self.motion,
            body: ClipBody::Memory {
                still,
                audio: narration,
            },
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clip/builder.rs"]
mod tests;
