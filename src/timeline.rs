//! Timeline Assembler: joins the surviving clips into one continuous track.
//!
//! In-memory clips stay lazy: the timeline only records where each clip starts and renders
//! frames on demand during export. Disk-backed clips are joined by ffmpeg into one
//! run-scoped file, and their intermediates are removed once the join is done.

use std::path::PathBuf;

use image::RgbImage;

use crate::assets::media::{AudioPcm, MIX_CHANNELS};
use crate::audio::mix::lay_out_tracks;
use crate::clip::builder::CompiledClip;
use crate::clip::motion::{fade_from_black, fade_over};
use crate::config::JoinMode;
use crate::encode::sink::EncodeSettings;
use crate::foundation::core::{Fps, Resolution, frame_to_sample};
use crate::foundation::error::{SlideError, SlideResult};
use crate::foundation::scratch::ScratchFile;
use crate::media::MediaTools;
use crate::run::RunContext;

#[derive(Debug)]
pub struct MemoryTimeline {
    clips: Vec<CompiledClip>,
    starts: Vec<u64>,
    overlap_frames: u64,
    total_frames: u64,
    resolution: Resolution,
    fps: Fps,
}

impl MemoryTimeline {
    fn new(clips: Vec<CompiledClip>, overlap_frames: u64, resolution: Resolution, fps: Fps) -> Self {
        let mut starts = Vec::with_capacity(clips.len());
        let mut cursor = 0u64;
        for (i, clip) in clips.iter().enumerate() {
            if i > 0 {
                cursor -= overlap_frames;
            }
            starts.push(cursor);
            cursor += clip.frame_count;
        }
        Self {
            clips,
            starts,
            overlap_frames,
            total_frames: cursor,
            resolution,
            fps,
        }
    }

    pub fn clips(&self) -> &[CompiledClip] {
        &self.clips
    }

    /// Global start frame of each clip.
    pub fn starts(&self) -> &[u64] {
        &self.starts
    }

    pub fn overlap_frames(&self) -> u64 {
        self.overlap_frames
    }

    /// Global frame `k`. Inside an overlap the incoming clip dissolves over the outgoing
    /// one; elsewhere a clip's opening frames fade in from black.
    pub fn render_frame(&self, k: u64) -> SlideResult<RgbImage> {
        if k >= self.total_frames {
            return Err(SlideError::validation(format!(
                "frame {k} is past the end of the timeline ({} frames)",
                self.total_frames
            )));
        }
        let i = self
            .starts
            .partition_point(|&s| s <= k)
            .checked_sub(1)
            .ok_or_else(|| SlideError::validation("timeline has no clip at frame 0"))?;
        let clip = &self.clips[i];
        let local = k - self.starts[i];
        let mut frame = clip.render_frame(local)?;

        if i > 0 && local < self.overlap_frames {
            let prev = &self.clips[i - 1];
            let under = prev.render_frame(k - self.starts[i - 1])?;
            let alpha = (local + 1) as f32 / (self.overlap_frames + 1) as f32;
            fade_over(&mut frame, &under, alpha)?;
        } else if i == 0 || self.overlap_frames == 0 {
            fade_from_black(&mut frame, clip.motion.fade_in_alpha_at_frame(local, self.fps));
        }
        Ok(frame)
    }

    /// Every clip's padded narration placed at its start, summed into one track.
    pub fn narration(&self, sample_rate: u32) -> AudioPcm {
        let total = frame_to_sample(self.total_frames, self.fps, sample_rate) as usize;
        let tracks = self.clips.iter().zip(&self.starts).filter_map(|(clip, &start)| {
            clip.audio()
                .map(|pcm| (frame_to_sample(start, self.fps, sample_rate) as usize, pcm))
        });
        lay_out_tracks(tracks, total, sample_rate, MIX_CHANNELS)
    }
}

#[derive(Debug)]
pub struct DiskTimeline {
    file: ScratchFile,
    frames: u64,
    resolution: Resolution,
    fps: Fps,
}

impl DiskTimeline {
    pub fn file(&self) -> &ScratchFile {
        &self.file
    }
}

#[derive(Debug)]
pub enum Timeline {
    InMemory(MemoryTimeline),
    OnDisk(DiskTimeline),
}

impl Timeline {
    pub fn frame_count(&self) -> u64 {
        match self {
            Self::InMemory(t) => t.total_frames,
            Self::OnDisk(t) => t.frames,
        }
    }

    pub fn fps(&self) -> Fps {
        match self {
            Self::InMemory(t) => t.fps,
            Self::OnDisk(t) => t.fps,
        }
    }

    pub fn resolution(&self) -> Resolution {
        match self {
            Self::InMemory(t) => t.resolution,
            Self::OnDisk(t) => t.resolution,
        }
    }

    pub fn duration_sec(&self) -> f64 {
        self.fps().frames_to_secs(self.frame_count())
    }
}

/// Result of assembly. `NoContent` is an ordinary outcome, not an error.
#[derive(Debug)]
pub enum Assembled {
    Ready(Timeline),
    NoContent,
}

pub struct TimelineAssembler<'a> {
    ctx: &'a RunContext,
    media: &'a dyn MediaTools,
}

impl<'a> TimelineAssembler<'a> {
    pub fn new(ctx: &'a RunContext, media: &'a dyn MediaTools) -> Self {
        Self { ctx, media }
    }

    #[tracing::instrument(skip_all, fields(run = %self.ctx.identity, clips = clips.len(), join = ?join))]
    pub fn assemble(&self, clips: Vec<CompiledClip>, join: JoinMode) -> SlideResult<Assembled> {
        if clips.is_empty() {
            return Ok(Assembled::NoContent);
        }
        let resolution = self.ctx.config.resolution();
        let fps = self.ctx.config.fps();
        for clip in &clips {
            if clip.resolution != resolution || clip.fps != fps {
                return Err(SlideError::validation(format!(
                    "scene {} is {}@{}, run expects {}@{}",
                    clip.scene_index + 1,
                    clip.resolution,
                    clip.fps,
                    resolution,
                    fps
                )));
            }
        }

        let overlap_frames = match join {
            JoinMode::Chain => 0,
            JoinMode::Compose => overlap_frames(&clips, self.ctx.config.overlap_sec, fps),
        };

        let on_disk = clips.iter().filter(|c| c.is_on_disk()).count();
        let timeline = if on_disk == 0 {
            Timeline::InMemory(MemoryTimeline::new(clips, overlap_frames, resolution, fps))
        } else if on_disk == clips.len() {
            match join {
                JoinMode::Chain => self.concat(clips)?,
                JoinMode::Compose => self.crossfade(clips, overlap_frames)?,
            }
        } else {
            return Err(SlideError::validation(
                "cannot join a mix of in-memory and disk-backed clips",
            ));
        };

        tracing::info!(
            frames = timeline.frame_count(),
            duration_sec = timeline.duration_sec(),
            "timeline assembled"
        );
        Ok(Assembled::Ready(timeline))
    }

    fn concat(&self, clips: Vec<CompiledClip>) -> SlideResult<Timeline> {
        let resolution = self.ctx.config.resolution();
        let fps = self.ctx.config.fps();
        let mut inputs = Vec::with_capacity(clips.len());
        for clip in &clips {
            let path = clip_path(clip)?;
            let info = self.media.probe_video(&path)?;
            if info.width != resolution.width || info.height != resolution.height || info.fps != fps
            {
                return Err(SlideError::validation(format!(
                    "chain join needs uniform clips: scene {} is {}x{}@{}, expected {}@{}",
                    clip.scene_index + 1,
                    info.width,
                    info.height,
                    info.fps,
                    resolution,
                    fps
                )));
            }
            if !info.has_audio {
                return Err(SlideError::validation(format!(
                    "chain join needs an audio track in every clip; scene {} has none",
                    clip.scene_index + 1
                )));
            }
            inputs.push(path);
        }

        let list = ScratchFile::new(self.ctx.concat_list_path());
        let file = ScratchFile::new(self.ctx.timeline_path());
        self.media.concat_copy(list.path(), &inputs, file.path())?;
        Ok(Timeline::OnDisk(DiskTimeline {
            file,
            frames: clips.iter().map(|c| c.frame_count).sum(),
            resolution,
            fps,
        }))
    }

    fn crossfade(&self, clips: Vec<CompiledClip>, overlap_frames: u64) -> SlideResult<Timeline> {
        let fps = self.ctx.config.fps();
        let inputs = clips
            .iter()
            .map(|clip| Ok((clip_path(clip)?, clip.duration_sec())))
            .collect::<SlideResult<Vec<_>>>()?;
        let file = ScratchFile::new(self.ctx.timeline_path());
        self.media.crossfade_join(
            &inputs,
            fps.frames_to_secs(overlap_frames),
            fps,
            &EncodeSettings::from_config(&self.ctx.config),
            file.path(),
        )?;
        let total: u64 = clips.iter().map(|c| c.frame_count).sum();
        let joins = clips.len() as u64 - 1;
        Ok(Timeline::OnDisk(DiskTimeline {
            file,
            frames: total - joins * overlap_frames,
            resolution: self.ctx.config.resolution(),
            fps,
        }))
    }
}

/// Requested overlap in frames, limited so no clip is swallowed by its neighbours.
fn overlap_frames(clips: &[CompiledClip], overlap_sec: f64, fps: Fps) -> u64 {
    if clips.len() < 2 {
        return 0;
    }
    let shortest = clips.iter().map(|c| c.frame_count).min().unwrap_or(0);
    fps.secs_to_frames_round(overlap_sec).min(shortest / 2)
}

fn clip_path(clip: &CompiledClip) -> SlideResult<PathBuf> {
    clip.path().map(|p| p.to_path_buf()).ok_or_else(|| {
        SlideError::validation(format!("scene {} has no intermediate file", clip.scene_index + 1))
    })
}

#[cfg(test)]
#[path = "../tests/unit/timeline.rs"]
mod tests;
