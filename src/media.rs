//! The seam between the pipeline and the external media toolchain.
//!
//! Everything that shells out to `ffmpeg`/`ffprobe` goes through [`MediaTools`], so the
//! stages above it can be exercised without the binaries installed.

use std::path::{Path, PathBuf};

use crate::assets::media::{self, AudioPcm, VideoInfo};
use crate::encode::ffmpeg::{self, FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{AudioInputConfig, EncodeSettings, FrameSink};
use crate::foundation::core::Fps;
use crate::foundation::error::SlideResult;

pub trait MediaTools {
    /// Decode to interleaved stereo `f32` at `sample_rate`. Empty output is an error.
    fn decode_audio(&self, path: &Path, sample_rate: u32) -> SlideResult<AudioPcm>;

    fn probe_video(&self, path: &Path) -> SlideResult<VideoInfo>;

    /// A sink that writes an MP4 to `out_path`, replacing any file there.
    fn open_sink(&self, out_path: &Path) -> SlideResult<Box<dyn FrameSink>>;

    /// Stream-copy concatenation of uniform inputs. `list_path` is scratch space for the
    /// demuxer list.
    fn concat_copy(&self, list_path: &Path, inputs: &[PathBuf], out_path: &Path)
    -> SlideResult<()>;

    /// Re-encoding join; each input is `(path, duration_sec)`.
    fn crossfade_join(
        &self,
        inputs: &[(PathBuf, f64)],
        overlap_sec: f64,
        fps: Fps,
        settings: &EncodeSettings,
        out_path: &Path,
    ) -> SlideResult<()>;

    /// Copy `video`'s picture and pair it with `audio`, or keep its own audio on `None`.
    fn mux_audio(
        &self,
        video: &Path,
        audio: Option<&AudioInputConfig>,
        settings: &EncodeSettings,
        out_path: &Path,
    ) -> SlideResult<()>;
}

/// System `ffmpeg`/`ffprobe` on `PATH`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegMedia;

impl MediaTools for FfmpegMedia {
    fn decode_audio(&self, path: &Path, sample_rate: u32) -> SlideResult<AudioPcm> {
        media::decode_audio_f32_stereo(path, sample_rate)
    }

    fn probe_video(&self, path: &Path) -> SlideResult<VideoInfo> {
        media::probe_video(path)
    }

    fn open_sink(&self, out_path: &Path) -> SlideResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(out_path))))
    }

    fn concat_copy(
        &self,
        list_path: &Path,
        inputs: &[PathBuf],
        out_path: &Path,
    ) -> SlideResult<()> {
        ffmpeg::concat_copy(list_path, inputs, out_path)
    }

    fn crossfade_join(
        &self,
        inputs: &[(PathBuf, f64)],
        overlap_sec: f64,
        fps: Fps,
        settings: &EncodeSettings,
        out_path: &Path,
    ) -> SlideResult<()> {
        ffmpeg::crossfade_join(inputs, overlap_sec, fps, settings, out_path)
    }

    fn mux_audio(
        &self,
        video: &Path,
        audio: Option<&AudioInputConfig>,
        settings: &EncodeSettings,
        out_path: &Path,
    ) -> SlideResult<()> {
        ffmpeg::mux_audio(video, audio, settings, out_path)
    }
}
