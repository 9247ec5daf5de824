use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{SlideError, SlideResult};

/// One narration + visual unit of the video. Immutable once produced upstream.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    /// 0-based, order-significant.
    pub index: usize,
    pub narration: String,
    /// Consumed by the image generator; carried for completeness.
    pub image_prompt: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SceneSpec {
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub image_prompt: String,
}

/// Script document as returned by the script-generation collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScriptDocument {
    /// Style tag for the built-in background track (e.g. "tech", "epic").
    #[serde(default)]
    pub bgm_style: Option<String>,
    #[serde(default)]
    pub scenes: Vec<SceneSpec>,
}

impl ScriptDocument {
    pub fn from_json(json: &str) -> SlideResult<Self> {
        serde_json::from_str(json).map_err(|e| SlideError::serde(format!("parse script: {e}")))
    }

    pub fn from_path(path: &Path) -> SlideResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Scenes with indices assigned by position.
    pub fn scenes(&self) -> Vec<Scene> {
        self.scenes
            .iter()
            .enumerate()
            .map(|(index, spec)| Scene {
                index,
                narration: spec.narration.trim().to_string(),
                image_prompt: spec.image_prompt.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../tests/unit/scene.rs"]
mod tests;
