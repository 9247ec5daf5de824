//! One run, end to end: compile scenes, assemble, mix, export.

use std::path::Path;

use crate::audio::mix::AudioMixer;
use crate::compile::{Cancelled, CompileReport, SceneCompiler, SceneFailure};
use crate::export::{ExportError, ExportStage, Exporter, OutputVideo};
use crate::foundation::error::SlideError;
use crate::media::MediaTools;
use crate::progress::{ProgressSink, ProgressTracker, Stage};
use crate::run::RunContext;
use crate::scene::Scene;
use crate::subtitle::compose::SubtitleCompositor;
use crate::timeline::{Assembled, TimelineAssembler};

/// Run-aborting outcomes. Per-scene problems never show up here on their own.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Every scene failed, or there were none. No file was written.
    #[error("nothing could be rendered ({} of {attempted} scenes failed)", .failures.len())]
    NoUsableScenes {
        attempted: usize,
        failures: Vec<SceneFailure>,
    },
    #[error("export failed at {stage} with {scenes} scenes: {source}")]
    Encode {
        stage: ExportStage,
        scenes: usize,
        #[source]
        source: SlideError,
    },
    #[error("run cancelled after {completed} of {total} scenes")]
    Cancelled { completed: usize, total: usize },
    #[error("run setup failed: {0}")]
    Setup(#[source] SlideError),
}

impl From<ExportError> for RunError {
    fn from(e: ExportError) -> Self {
        Self::Encode {
            stage: e.stage,
            scenes: e.scenes,
            source: e.source,
        }
    }
}

impl From<Cancelled> for RunError {
    fn from(c: Cancelled) -> Self {
        Self::Cancelled {
            completed: c.completed,
            total: c.total,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub output: OutputVideo,
    pub attempted: usize,
    /// Indices of the scenes that made it into the video, in order.
    pub rendered: Vec<usize>,
    pub failures: Vec<SceneFailure>,
}

impl RunReport {
    /// One-line terminal summary.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "wrote {} ({:.1}s, {} of {} scenes",
            self.output.path.display(),
            self.output.duration_sec,
            self.rendered.len(),
            self.attempted
        );
        if !self.failures.is_empty() {
            s.push_str(&format!(", {} skipped", self.failures.len()));
        }
        s.push_str(if self.output.background_mixed {
            ", with background music)"
        } else {
            ", narration only)"
        });
        s
    }
}

/// Render `scenes` for the run described by `ctx`.
///
/// Intermediates are scoped by the run identity and removed before this returns, whatever
/// the outcome. On [`RunError::NoUsableScenes`] the output path is left untouched.
#[tracing::instrument(skip_all, fields(run = %ctx.identity, scenes = scenes.len()))]
pub fn render_run(
    ctx: &RunContext,
    scenes: &[Scene],
    background: Option<&Path>,
    media: &dyn MediaTools,
    progress: &mut dyn ProgressSink,
) -> Result<RunReport, RunError> {
    ctx.config.validate().map_err(RunError::Setup)?;
    ctx.dirs.create_all().map_err(RunError::Setup)?;
    let mut progress = ProgressTracker::new(progress);

    let bundled_font = ctx
        .config
        .subtitle
        .font_path
        .as_deref()
        .map(|p| ctx.resolve_path(p));
    let compositor = SubtitleCompositor::from_config(&ctx.config, bundled_font);

    let CompileReport {
        clips,
        failures,
        attempted,
        ..
    } = SceneCompiler::new(ctx, media, compositor).compile(scenes, &mut progress)?;

    if clips.is_empty() {
        tracing::warn!(attempted, "no usable scenes");
        return Err(RunError::NoUsableScenes {
            attempted,
            failures,
        });
    }
    if ctx.cancel.is_cancelled() {
        return Err(RunError::Cancelled {
            completed: attempted,
            total: attempted,
        });
    }

    let rendered: Vec<usize> = clips.iter().map(|c| c.scene_index).collect();
    let timeline = match TimelineAssembler::new(ctx, media).assemble(clips, ctx.config.join_mode())
    {
        Ok(Assembled::Ready(timeline)) => timeline,
        Ok(Assembled::NoContent) => {
            return Err(RunError::NoUsableScenes {
                attempted,
                failures,
            });
        }
        Err(source) => {
            return Err(RunError::Encode {
                stage: ExportStage::Assemble,
                scenes: rendered.len(),
                source,
            });
        }
    };
    progress.stage_finished(Stage::Assemble);

    let audio = AudioMixer::new(media, ctx.config.sample_rate, ctx.config.background_gain)
        .mix(&timeline, background);
    progress.stage_finished(Stage::Mix);

    let output = Exporter::new(ctx, media).export(timeline, audio, rendered.len())?;
    progress.finish(format!("wrote {}", output.path.display()));

    Ok(RunReport {
        output,
        attempted,
        rendered,
        failures,
    })
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
