use std::path::{Path, PathBuf};

use crate::run::{RunIdentity, WorkDirs};

/// Audio extensions tried, in order.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];
/// Image extensions tried, in order.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "webp"];

/// What was found on disk for one scene. Only existence is checked here; undecodable files
/// surface later as scene failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneAsset {
    Complete { audio: PathBuf, image: PathBuf },
    Partial {
        audio: Option<PathBuf>,
        image: Option<PathBuf>,
    },
    Missing,
}

impl SceneAsset {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// Human-readable list of the absent halves.
    pub fn missing_parts(&self) -> &'static str {
        match self {
            Self::Complete { .. } => "",
            Self::Partial { audio: None, .. } => "audio",
            Self::Partial { image: None, .. } => "image",
            Self::Partial { .. } => "",
            Self::Missing => "audio and image",
        }
    }
}

/// Locates per-scene files named `scene_<n>_<run>.<ext>` (`n` is 1-based).
#[derive(Clone, Debug)]
pub struct AssetResolver {
    audio_dir: PathBuf,
    image_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(dirs: &WorkDirs) -> Self {
        Self {
            audio_dir: dirs.audio_dir.clone(),
            image_dir: dirs.image_dir.clone(),
        }
    }

    pub fn file_stem(scene_index: usize, run: &RunIdentity) -> String {
        format!("scene_{}_{run}", scene_index + 1)
    }

    pub fn resolve(&self, scene_index: usize, run: &RunIdentity) -> SceneAsset {
        let stem = Self::file_stem(scene_index, run);
        let audio = find_first(&self.audio_dir, &stem, AUDIO_EXTENSIONS);
        let image = find_first(&self.image_dir, &stem, IMAGE_EXTENSIONS);
        match (audio, image) {
            (Some(audio), Some(image)) => SceneAsset::Complete { audio, image },
            (None, None) => SceneAsset::Missing,
            (audio, image) => SceneAsset::Partial { audio, image },
        }
    }
}

fn find_first(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolve.rs"]
mod tests;
