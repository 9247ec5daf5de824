//! Slidecast assembles narrated slideshow videos.
//!
//! Given a scene script and per-scene narration audio and stills, a run:
//!
//! - burns subtitles onto each still ([`SubtitleCompositor`])
//! - turns each still plus narration into a timed clip with a slow push-in
//! - joins the clips ([`TimelineAssembler`]), mixes background music ([`AudioMixer`])
//! - exports one MP4 through the system `ffmpeg` ([`Exporter`])
//!
//! [`render_run`] drives all of it for one [`RunContext`].
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod audio;
pub(crate) mod clip;
pub(crate) mod compile;
pub mod config;
pub(crate) mod encode;
pub(crate) mod export;
pub mod media;
pub(crate) mod pipeline;
pub mod progress;
pub mod run;
pub mod scene;
pub(crate) mod subtitle;
pub(crate) mod timeline;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;

pub use crate::foundation::core::{Fps, FrameIndex, Resolution, frame_to_sample};
pub use crate::foundation::error::{SlideError, SlideResult};
pub use crate::foundation::scratch::ScratchFile;

pub use crate::assets::bgm::{DEFAULT_BGM_STYLE, select_background};
pub use crate::assets::media::{AudioPcm, VideoInfo, is_ffmpeg_on_path, is_ffprobe_on_path};
pub use crate::assets::resolve::{AssetResolver, SceneAsset};
pub use crate::audio::mix::{AudioMixer, MixedAudio};
pub use crate::clip::builder::{ClipBody, ClipBuilder, CompiledClip};
pub use crate::clip::motion::Motion;
pub use crate::compile::{
    Cancelled, CompileReport, FailureReason, SceneCompiler, SceneFailure, SceneState,
};
pub use crate::config::{FlushStrategy, JoinMode, Profile, RenderConfig, SubtitleStyle};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{
    AudioInputConfig, EncodeSettings, FrameSink, InMemorySink, SinkConfig,
};
pub use crate::export::{ExportError, ExportStage, Exporter, OutputVideo};
pub use crate::media::{FfmpegMedia, MediaTools};
pub use crate::pipeline::{RunError, RunReport, render_run};
pub use crate::progress::{NoProgress, ProgressSink, ProgressTracker, ProgressUpdate, Stage};
pub use crate::run::{
    CancelFlag, RunContext, RunIdentity, RunPlan, SessionLedger, WorkDirs, input_hash,
    should_reuse_assets,
};
pub use crate::scene::{Scene, SceneSpec, ScriptDocument};
pub use crate::subtitle::compose::SubtitleCompositor;
pub use crate::subtitle::font::{FontSource, FontTier, ResolvedFont};
pub use crate::timeline::{Assembled, DiskTimeline, MemoryTimeline, Timeline, TimelineAssembler};
