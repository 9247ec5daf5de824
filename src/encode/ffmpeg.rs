use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::Context as _;
use image::RgbImage;

use crate::assets::media::is_ffmpeg_on_path;
use crate::encode::sink::{AudioInputConfig, EncodeSettings, FrameSink, SinkConfig, check_frame};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{SlideError, SlideResult};
use crate::foundation::scratch::ensure_parent_dir;

/// Options for [`FfmpegSink`] output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output path. The container is always MP4 regardless of extension.
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Spawns the system `ffmpeg` and streams raw `rgb24` frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> SlideResult<()> {
        cfg.validate()?;
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(SlideError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(SlideError::media(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.opts.overwrite { "-y" } else { "-n" });

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &cfg.resolution.to_string(),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0"]);

        if let Some(audio) = cfg.audio.as_ref() {
            push_pcm_input(&mut cmd, audio);
            push_video_codec(&mut cmd, &cfg.settings);
            push_audio_codec(&mut cmd, &cfg.settings);
        } else {
            cmd.arg("-an");
            push_video_codec(&mut cmd, &cfg.settings);
        }
        // Output rate matches input rate exactly; never a library default.
        cmd.args(["-r", &cfg.fps.to_string()]);
        cmd.args(["-movflags", "+faststart", "-f", "mp4"])
            .arg(&self.opts.out_path);
        tracing::debug!(cmd = ?cmd, "spawning ffmpeg sink");

        let mut child = cmd.spawn().map_err(|e| {
            SlideError::media(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SlideError::media("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SlideError::media("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &RgbImage) -> SlideResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| SlideError::media("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(SlideError::media(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);
        check_frame(cfg, frame)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SlideError::media("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            SlideError::media(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> SlideResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| SlideError::media("ffmpeg sink not started"))?;

        let status = child
            .wait()
            .map_err(|e| SlideError::media(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SlideError::media("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| SlideError::media(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(SlideError::media(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // An unfinished encode is abandoned: close stdin and reap the child.
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input frame rate.
    cmd.args(["-r", &fps.to_string()]);
}

fn push_pcm_input(cmd: &mut Command, audio: &AudioInputConfig) {
    cmd.args([
        "-f",
        "f32le",
        "-ar",
        &audio.sample_rate.to_string(),
        "-ac",
        &audio.channels.to_string(),
        "-i",
    ])
    .arg(&audio.path);
}

fn push_video_codec(cmd: &mut Command, settings: &EncodeSettings) {
    cmd.args([
        "-c:v",
        &settings.video_codec,
        "-preset",
        &settings.preset,
        "-crf",
        &settings.crf.to_string(),
        "-pix_fmt",
        "yuv420p",
    ]);
    if let Some(threads) = settings.threads {
        cmd.args(["-threads", &threads.to_string()]);
    }
}

fn push_audio_codec(cmd: &mut Command, settings: &EncodeSettings) {
    cmd.args([
        "-c:a",
        &settings.audio_codec,
        "-b:a",
        &settings.audio_bitrate,
    ]);
}

fn run_ffmpeg(mut cmd: Command, what: &str) -> SlideResult<()> {
    if !is_ffmpeg_on_path() {
        return Err(SlideError::media(format!(
            "ffmpeg is required to {what}, but was not found on PATH"
        )));
    }
    tracing::debug!(cmd = ?cmd, "running ffmpeg to {what}");
    let out = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| SlideError::media(format!("failed to run ffmpeg to {what}: {e}")))?;
    if !out.status.success() {
        return Err(SlideError::media(format!(
            "ffmpeg failed to {what} ({}): {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

fn ffmpeg_base() -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-loglevel", "error"]);
    cmd
}

/// Body of an ffmpeg concat-demuxer list file.
pub fn concat_list(inputs: &[PathBuf]) -> String {
    let mut out = String::new();
    for input in inputs {
        let abs = std::path::absolute(input).unwrap_or_else(|_| input.clone());
        let escaped = abs.to_string_lossy().replace('\'', r"'\''");
        out.push_str(&format!("file '{escaped}'\n"));
    }
    out
}

/// Bitstream-level join of uniform intermediates, no re-encode.
pub fn concat_copy(list_path: &Path, inputs: &[PathBuf], out_path: &Path) -> SlideResult<()> {
    if inputs.is_empty() {
        return Err(SlideError::validation("concat needs at least one input"));
    }
    ensure_parent_dir(list_path)?;
    ensure_parent_dir(out_path)?;
    std::fs::write(list_path, concat_list(inputs))
        .with_context(|| format!("write concat list '{}'", list_path.display()))?;

    let mut cmd = ffmpeg_base();
    cmd.args(["-f", "concat", "-safe", "0", "-i"])
        .arg(list_path)
        .args(["-c", "copy", "-movflags", "+faststart", "-f", "mp4"])
        .arg(out_path);
    run_ffmpeg(cmd, "concatenate clips")
}

/// `filter_complex` chaining `xfade`/`acrossfade` across inputs of the given durations.
///
/// Join `k` (1-based) starts at `sum(d[..k]) - k * overlap` on the output timeline.
pub fn xfade_filter_graph(durations: &[f64], overlap_sec: f64) -> String {
    let n = durations.len();
    let mut parts = Vec::with_capacity(2 * n.saturating_sub(1));
    let mut elapsed = 0.0;
    for k in 1..n {
        elapsed += durations[k - 1];
        let offset = (elapsed - k as f64 * overlap_sec).max(0.0);
        let (vin, ain) = if k == 1 {
            ("[0:v]".to_string(), "[0:a]".to_string())
        } else {
            (format!("[v{}]", k - 1), format!("[a{}]", k - 1))
        };
        let (vout, aout) = if k == n - 1 {
            ("[vout]".to_string(), "[aout]".to_string())
        } else {
            (format!("[v{k}]"), format!("[a{k}]"))
        };
        parts.push(format!(
            "{vin}[{k}:v]xfade=transition=fade:duration={overlap_sec:.6}:offset={offset:.6}{vout}"
        ));
        parts.push(format!("{ain}[{k}:a]acrossfade=d={overlap_sec:.6}{aout}"));
    }
    parts.join(";")
}

/// Re-encoding join with a cross-dissolve of `overlap_sec` between neighbours.
pub fn crossfade_join(
    inputs: &[(PathBuf, f64)],
    overlap_sec: f64,
    fps: Fps,
    settings: &EncodeSettings,
    out_path: &Path,
) -> SlideResult<()> {
    ensure_parent_dir(out_path)?;
    let mut cmd = ffmpeg_base();
    match inputs {
        [] => return Err(SlideError::validation("crossfade needs at least one input")),
        [(only, _)] => {
            cmd.arg("-i")
                .arg(only)
                .args(["-c", "copy", "-movflags", "+faststart", "-f", "mp4"])
                .arg(out_path);
            return run_ffmpeg(cmd, "copy single clip");
        }
        _ => {}
    }

    for (path, _) in inputs {
        cmd.arg("-i").arg(path);
    }
    let durations: Vec<f64> = inputs.iter().map(|(_, d)| *d).collect();
    cmd.args(["-filter_complex", &xfade_filter_graph(&durations, overlap_sec)])
        .args(["-map", "[vout]", "-map", "[aout]"]);
    push_video_codec(&mut cmd, settings);
    push_audio_codec(&mut cmd, settings);
    cmd.args(["-r", &fps.to_string()]);
    cmd.args(["-movflags", "+faststart", "-f", "mp4"])
        .arg(out_path);
    run_ffmpeg(cmd, "cross-fade clips")
}

/// Copy the video stream of `video` and pair it with `audio`, or keep its own audio when
/// `audio` is `None`.
pub fn mux_audio(
    video: &Path,
    audio: Option<&AudioInputConfig>,
    settings: &EncodeSettings,
    out_path: &Path,
) -> SlideResult<()> {
    ensure_parent_dir(out_path)?;
    let mut cmd = ffmpeg_base();
    cmd.arg("-i").arg(video);
    match audio {
        Some(audio) => {
            push_pcm_input(&mut cmd, audio);
            cmd.args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy"]);
            push_audio_codec(&mut cmd, settings);
        }
        None => {
            cmd.args(["-map", "0", "-c", "copy"]);
        }
    }
    cmd.args(["-movflags", "+faststart", "-f", "mp4"])
        .arg(out_path);
    run_ffmpeg(cmd, "mux audio")
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
