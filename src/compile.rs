//! Scene Compiler: resolve → composite → build → flush, one scene at a time.
//!
//! Each scene walks its own small state machine. A scene that fails at any step is
//! recorded as a [`SceneFailure`] and left out; it never aborts the run.

use crate::assets::decode::decode_still;
use crate::assets::resolve::{AssetResolver, SceneAsset};
use crate::clip::builder::{ClipBody, ClipBuilder, CompiledClip};
use crate::clip::motion::fade_from_black;
use crate::config::{FlushStrategy, JoinMode};
use crate::encode::sink::{AudioInputConfig, EncodeSettings, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::SlideResult;
use crate::foundation::scratch::ScratchFile;
use crate::media::MediaTools;
use crate::progress::ProgressTracker;
use crate::run::RunContext;
use crate::scene::Scene;
use crate::subtitle::compose::SubtitleCompositor;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    Pending,
    AssetsResolved,
    Composited,
    ClipBuilt,
    /// Encoded to a run-scoped intermediate file.
    Flushed,
    /// Held in memory until assembly.
    Cached,
    Done,
    Failed,
}

impl SceneState {
    pub fn can_advance_to(self, next: SceneState) -> bool {
        use SceneState::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Pending, AssetsResolved)
            | (AssetsResolved, Composited)
            | (Composited, ClipBuilt)
            | (ClipBuilt, Flushed | Cached)
            | (Flushed | Cached, Done) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// Audio or image absent, or present but undecodable.
    AssetMissing,
    /// Subtitle drawing failed with every font in the chain.
    CompositeFailure,
    /// Clip timing or intermediate encode failed.
    ClipFailure,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::AssetMissing => "asset missing",
            Self::CompositeFailure => "composite failure",
            Self::ClipFailure => "clip failure",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneFailure {
    pub index: usize,
    /// Last state the scene reached before failing.
    pub stage: SceneState,
    pub reason: FailureReason,
    pub detail: String,
}

impl std::fmt::Display for SceneFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scene {}: {} (after {:?}): {}",
            self.index + 1,
            self.reason,
            self.stage,
            self.detail
        )
    }
}

/// The run was cancelled at a scene boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("run cancelled after {completed} of {total} scenes")]
pub struct Cancelled {
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
pub struct CompileReport {
    /// Surviving clips in scene order.
    pub clips: Vec<CompiledClip>,
    pub failures: Vec<SceneFailure>,
    /// States visited by each scene, in input order.
    pub trails: Vec<Vec<SceneState>>,
    pub attempted: usize,
}

struct SceneTrack {
    index: usize,
    state: SceneState,
    trail: Vec<SceneState>,
}

impl SceneTrack {
    fn new(index: usize) -> Self {
        Self {
            index,
            state: SceneState::Pending,
            trail: vec![SceneState::Pending],
        }
    }

    fn advance(&mut self, next: SceneState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal scene transition {:?} -> {next:?}",
            self.state
        );
        self.state = next;
        self.trail.push(next);
    }

    fn fail(&mut self, reason: FailureReason, detail: impl std::fmt::Display) -> SceneFailure {
        let failure = SceneFailure {
            index: self.index,
            stage: self.state,
            reason,
            detail: detail.to_string(),
        };
        self.advance(SceneState::Failed);
        failure
    }
}

pub struct SceneCompiler<'a> {
    ctx: &'a RunContext,
    media: &'a dyn MediaTools,
    resolver: AssetResolver,
    compositor: SubtitleCompositor,
    builder: ClipBuilder,
    settings: EncodeSettings,
}

impl<'a> SceneCompiler<'a> {
    pub fn new(
        ctx: &'a RunContext,
        media: &'a dyn MediaTools,
        compositor: SubtitleCompositor,
    ) -> Self {
        Self {
            resolver: AssetResolver::new(&ctx.dirs),
            builder: ClipBuilder::from_config(&ctx.config),
            settings: EncodeSettings::from_config(&ctx.config),
            ctx,
            media,
            compositor,
        }
    }

    #[tracing::instrument(skip_all, fields(run = %self.ctx.identity, scenes = scenes.len()))]
    pub fn compile(
        &self,
        scenes: &[Scene],
        progress: &mut ProgressTracker<'_>,
    ) -> Result<CompileReport, Cancelled> {
        let total = scenes.len();
        let mut report = CompileReport {
            attempted: total,
            ..CompileReport::default()
        };
        if total == 0 {
            progress.scene_finished(0, 0, "no scenes to compile");
            return Ok(report);
        }

        for (done, scene) in scenes.iter().enumerate() {
            if self.ctx.cancel.is_cancelled() {
                tracing::info!(completed = done, total, "cancelled at scene boundary");
                return Err(Cancelled {
                    completed: done,
                    total,
                });
            }

            let mut track = SceneTrack::new(scene.index);
            let first_clip = report.clips.is_empty();
            let message = match self.compile_scene(scene, &mut track, first_clip) {
                Ok(clip) => {
                    track.advance(SceneState::Done);
                    tracing::info!(
                        scene = scene.index + 1,
                        frames = clip.frame_count,
                        on_disk = clip.is_on_disk(),
                        "scene compiled"
                    );
                    report.clips.push(clip);
                    format!("scene {} of {total} compiled", done + 1)
                }
                Err(failure) => {
                    tracing::warn!(
                        scene = failure.index + 1,
                        reason = %failure.reason,
                        stage = ?failure.stage,
                        detail = %failure.detail,
                        "scene excluded"
                    );
                    let message = format!("scene {} of {total} skipped: {}", done + 1, failure.reason);
                    report.failures.push(failure);
                    message
                }
            };
            report.trails.push(track.trail);
            progress.scene_finished(done + 1, total, message);
        }
        Ok(report)
    }

    fn compile_scene(
        &self,
        scene: &Scene,
        track: &mut SceneTrack,
        first_clip: bool,
    ) -> Result<CompiledClip, SceneFailure> {
        use FailureReason::*;

        let (audio_path, image_path) = match self.resolver.resolve(scene.index, &self.ctx.identity) {
            SceneAsset::Complete { audio, image } => (audio, image),
            other => {
                return Err(track.fail(AssetMissing, format!("no {} file", other.missing_parts())));
            }
        };
        track.advance(SceneState::AssetsResolved);

        let image = decode_still(&image_path).map_err(|e| track.fail(AssetMissing, e))?;
        let narration = self
            .media
            .decode_audio(&audio_path, self.ctx.config.sample_rate)
            .map_err(|e| track.fail(AssetMissing, e))?;

        let still = self
            .compositor
            .compose(&image, &scene.narration)
            .map_err(|e| track.fail(CompositeFailure, e))?;
        drop(image);
        track.advance(SceneState::Composited);

        let clip = self
            .builder
            .build(scene.index, still, narration)
            .map_err(|e| track.fail(ClipFailure, e))?;
        track.advance(SceneState::ClipBuilt);

        match self.ctx.config.flush {
            FlushStrategy::Deferred => {
                track.advance(SceneState::Cached);
                Ok(clip)
            }
            FlushStrategy::Eager => {
                // A cross-fade join dissolves neighbours itself; only the opening clip fades
                // in from black there.
                let fade_in = self.ctx.config.join_mode() == JoinMode::Chain || first_clip;
                let clip = self
                    .flush(clip, fade_in)
                    .map_err(|e| track.fail(ClipFailure, e))?;
                track.advance(SceneState::Flushed);
                Ok(clip)
            }
        }
    }

    /// Encode `clip` to its run-scoped intermediate and release the in-memory body.
    fn flush(&self, clip: CompiledClip, fade_in: bool) -> SlideResult<CompiledClip> {
        let ClipBody::Memory { audio, .. } = &clip.body else {
            return Ok(clip);
        };

        let pcm = ScratchFile::new(self.ctx.clip_audio_path(clip.scene_index));
        audio.write_f32le(pcm.path())?;
        let video = ScratchFile::new(self.ctx.clip_path(clip.scene_index));

        let mut sink = self.media.open_sink(video.path())?;
        sink.begin(SinkConfig {
            resolution: clip.resolution,
            fps: clip.fps,
            audio: Some(AudioInputConfig {
                path: pcm.path().to_path_buf(),
                sample_rate: audio.sample_rate,
                channels: audio.channels,
            }),
            settings: self.settings.clone(),
        })?;
        for k in 0..clip.frame_count {
            let mut frame = clip.render_frame(k)?;
            if fade_in {
                fade_from_black(&mut frame, clip.motion.fade_in_alpha_at_frame(k, clip.fps));
            }
            sink.push_frame(FrameIndex(k), &frame)?;
        }
        sink.end()?;
        drop(pcm);

        tracing::debug!(scene = clip.scene_index + 1, path = %video.path().display(), "clip flushed");
        Ok(clip.into_disk(video))
    }
}

#[cfg(test)]
#[path = "../tests/unit/compile.rs"]
mod tests;
