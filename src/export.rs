//! Exporter: encodes the timeline to the run's output path.
//!
//! The encode always targets a run-scoped partial file next to the output, which is then
//! renamed over the output. A concurrent reader sees either the previous file or the new
//! one. Concurrent runs race on the rename; the last one to finish wins.

use std::path::PathBuf;

use crate::audio::mix::MixedAudio;
use crate::encode::sink::{AudioInputConfig, EncodeSettings, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SlideError, SlideResult};
use crate::foundation::scratch::ScratchFile;
use crate::media::MediaTools;
use crate::run::RunContext;
use crate::timeline::Timeline;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportStage {
    Assemble,
    WriteAudio,
    Encode,
    Mux,
    Finalize,
}

impl std::fmt::Display for ExportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Assemble => "assemble",
            Self::WriteAudio => "write audio",
            Self::Encode => "encode",
            Self::Mux => "mux",
            Self::Finalize => "finalize",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("export failed at {stage} ({scenes} scenes): {source}")]
pub struct ExportError {
    pub stage: ExportStage,
    pub scenes: usize,
    #[source]
    pub source: SlideError,
}

/// The finished artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputVideo {
    pub path: PathBuf,
    pub frames: u64,
    pub duration_sec: f64,
    pub scenes: usize,
    pub background_mixed: bool,
}

fn at(stage: ExportStage, scenes: usize) -> impl FnOnce(SlideError) -> ExportError {
    move |source| ExportError {
        stage,
        scenes,
        source,
    }
}

pub struct Exporter<'a> {
    ctx: &'a RunContext,
    media: &'a dyn MediaTools,
}

impl<'a> Exporter<'a> {
    pub fn new(ctx: &'a RunContext, media: &'a dyn MediaTools) -> Self {
        Self { ctx, media }
    }

    #[tracing::instrument(skip_all, fields(run = %self.ctx.identity, out = %self.ctx.dirs.output_path.display()))]
    pub fn export(
        &self,
        timeline: Timeline,
        audio: MixedAudio,
        scenes: usize,
    ) -> Result<OutputVideo, ExportError> {
        let frames = timeline.frame_count();
        let duration_sec = timeline.duration_sec();
        let background_mixed = audio.has_background();
        let settings = EncodeSettings::from_config(&self.ctx.config);
        let partial = ScratchFile::new(self.ctx.partial_output_path());
        let mix = ScratchFile::new(self.ctx.mix_path());

        let pcm_input = |pcm: &crate::assets::media::AudioPcm| -> SlideResult<AudioInputConfig> {
            pcm.write_f32le(mix.path())?;
            Ok(AudioInputConfig {
                path: mix.path().to_path_buf(),
                sample_rate: pcm.sample_rate,
                channels: pcm.channels,
            })
        };

        match &timeline {
            Timeline::InMemory(t) => {
                let track = match audio {
                    MixedAudio::Mixed(pcm) => pcm,
                    MixedAudio::NarrationOnly => t.narration(self.ctx.config.sample_rate),
                };
                let input = pcm_input(&track).map_err(at(ExportStage::WriteAudio, scenes))?;
                drop(track);

                let encode = || -> SlideResult<()> {
                    let mut sink = self.media.open_sink(partial.path())?;
                    sink.begin(SinkConfig {
                        resolution: timeline.resolution(),
                        fps: timeline.fps(),
                        audio: Some(input.clone()),
                        settings: settings.clone(),
                    })?;
                    for k in 0..frames {
                        if k % 100 == 0 {
                            tracing::debug!(frame = k, of = frames, "encoding");
                        }
                        sink.push_frame(FrameIndex(k), &t.render_frame(k)?)?;
                    }
                    sink.end()
                };
                encode().map_err(at(ExportStage::Encode, scenes))?;
            }
            Timeline::OnDisk(t) => {
                let input = match &audio {
                    MixedAudio::Mixed(pcm) => {
                        Some(pcm_input(pcm).map_err(at(ExportStage::WriteAudio, scenes))?)
                    }
                    MixedAudio::NarrationOnly => None,
                };
                self.media
                    .mux_audio(t.file().path(), input.as_ref(), &settings, partial.path())
                    .map_err(at(ExportStage::Mux, scenes))?;
            }
        }
        drop(timeline);
        drop(mix);

        let out = self.ctx.dirs.output_path.clone();
        partial.persist(&out).map_err(at(ExportStage::Finalize, scenes))?;
        tracing::info!(frames, duration_sec, background_mixed, "output written");
        Ok(OutputVideo {
            path: out,
            frames,
            duration_sec,
            scenes,
            background_mixed,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
