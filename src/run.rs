//! Per-run identity and scoping.
//!
//! The work directory is shared between runs. Every path a run reads or writes is derived
//! from its [`RunIdentity`], so a retried or concurrent run never picks up another run's
//! files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context as _;

use crate::config::RenderConfig;
use crate::foundation::error::{SlideError, SlideResult};
use crate::foundation::scratch::ensure_parent_dir;

/// Opaque token namespacing one pipeline execution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunIdentity(String);

impl RunIdentity {
    /// Mint a fresh identity.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Adopt an identity minted elsewhere (e.g. by the asset generators).
    pub fn from_token(token: impl Into<String>) -> SlideResult<Self> {
        let token = token.into();
        if token.is_empty() || token.len() > 64 {
            return Err(SlideError::validation(
                "run identity must be 1..=64 characters",
            ));
        }
        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SlideError::validation(format!(
                "run identity '{token}' may only contain [A-Za-z0-9_-]"
            )));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RunIdentity {
    type Error = SlideError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_token(value)
    }
}

impl From<RunIdentity> for String {
    fn from(value: RunIdentity) -> Self {
        value.0
    }
}

/// Directory layout shared by all runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkDirs {
    pub root: PathBuf,
    pub audio_dir: PathBuf,
    pub image_dir: PathBuf,
    pub bgm_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub output_path: PathBuf,
}

impl WorkDirs {
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            audio_dir: root.join("audio_files"),
            image_dir: root.join("image_files"),
            bgm_dir: root.join("bgm_assets"),
            scratch_dir: root.join("scratch"),
            output_path: root.join("final_output.mp4"),
            root,
        }
    }

    pub fn create_all(&self) -> SlideResult<()> {
        for dir in [
            &self.audio_dir,
            &self.image_dir,
            &self.bgm_dir,
            &self.scratch_dir,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create work dir '{}'", dir.display()))?;
        }
        ensure_parent_dir(&self.output_path)
    }
}

/// Cooperative cancellation, observed at scene boundaries.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a stage needs to know about the run it belongs to.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub identity: RunIdentity,
    pub dirs: WorkDirs,
    pub config: RenderConfig,
    pub cancel: CancelFlag,
}

impl RunContext {
    pub fn new(identity: RunIdentity, dirs: WorkDirs, config: RenderConfig) -> Self {
        Self {
            identity,
            dirs,
            config,
            cancel: CancelFlag::new(),
        }
    }

    fn scratch(&self, stem: &str, ext: &str) -> PathBuf {
        self.dirs
            .scratch_dir
            .join(format!("{stem}_{}.{ext}", self.identity))
    }

    /// Intermediate video for scene `index` (eager flush).
    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.scratch(&format!("clip_{}", index + 1), "mp4")
    }

    /// Raw PCM fed to the intermediate encode of scene `index`.
    pub fn clip_audio_path(&self, index: usize) -> PathBuf {
        self.scratch(&format!("clip_{}", index + 1), "f32le")
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.scratch("concat", "txt")
    }

    pub fn timeline_path(&self) -> PathBuf {
        self.scratch("timeline", "mp4")
    }

    pub fn mix_path(&self) -> PathBuf {
        self.scratch("mix", "f32le")
    }

    /// Temp file the exporter writes before renaming over the output path. It sits next to
    /// the output so the rename stays on one filesystem.
    pub fn partial_output_path(&self) -> PathBuf {
        let out = &self.dirs.output_path;
        let name = out
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.mp4".to_string());
        out.with_file_name(format!(".{name}.{}.partial", self.identity))
    }

    /// Resolve a config-relative path (e.g. the bundled font) against the work dir.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dirs.root.join(path)
        }
    }
}

/// Stable hash of the source text used to detect a new task.
pub fn input_hash(text: &str) -> u64 {
    xxhash_rust::xxh3::xxh3_64(text.as_bytes())
}

/// Decide whether assets generated for the previous input can be reused.
pub fn should_reuse_assets(previous: Option<u64>, current: u64, force: bool) -> bool {
    !force && previous == Some(current)
}

/// Outcome of [`SessionLedger::begin`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPlan {
    pub identity: RunIdentity,
    /// `true` when assets from the previous run are reused as-is.
    pub reuse_assets: bool,
}

/// Persisted record of the last task, replacing implicit UI session state.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionLedger {
    pub last_input_hash: Option<u64>,
    pub run_id: Option<RunIdentity>,
}

impl SessionLedger {
    pub const FILE_NAME: &'static str = "session.json";

    /// Load the ledger, or start empty when none was saved yet.
    pub fn load(path: &Path) -> SlideResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("read ledger '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| SlideError::serde(format!("parse ledger '{}': {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> SlideResult<()> {
        ensure_parent_dir(path)?;
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SlideError::serde(format!("encode ledger: {e}")))?;
        std::fs::write(path, json)
            .with_context(|| format!("write ledger '{}'", path.display()))?;
        Ok(())
    }

    /// Start a task for `input_text`. A fresh identity is minted whenever assets must be
    /// regenerated; the previous identity survives only when its assets are reused.
    pub fn begin(&mut self, input_text: &str, force: bool) -> RunPlan {
        let current = input_hash(input_text);
        let reuse = should_reuse_assets(self.last_input_hash, current, force);
        let identity = match (&self.run_id, reuse) {
            (Some(id), true) => id.clone(),
            _ => RunIdentity::generate(),
        };
        self.last_input_hash = Some(current);
        self.run_id = Some(identity.clone());
        RunPlan {
            identity,
            reuse_assets: reuse,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/run.rs"]
mod tests;
