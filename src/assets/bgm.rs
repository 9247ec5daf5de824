use std::path::{Path, PathBuf};

/// Style used when the script does not name one.
pub const DEFAULT_BGM_STYLE: &str = "tech";

/// Pick the background track for a run.
///
/// Order: a user-supplied file, then `<bgm_dir>/<style>.mp3`, then the first `.mp3` in
/// `bgm_dir` by name. `None` means the run goes out with narration only.
pub fn select_background(
    user_supplied: Option<&Path>,
    style: Option<&str>,
    bgm_dir: &Path,
) -> Option<PathBuf> {
    if let Some(path) = user_supplied {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "user background track not found, falling back to built-in tracks");
    }

    let style = style
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_BGM_STYLE);
    let styled = bgm_dir.join(format!("{style}.mp3"));
    if styled.is_file() {
        return Some(styled);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(bgm_dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("mp3"))
        })
        .collect();
    candidates.sort();
    let picked = candidates.into_iter().next();
    if let Some(path) = &picked {
        tracing::info!(style, fallback = %path.display(), "requested background style not available");
    }
    picked
}

#[cfg(test)]
#[path = "../../tests/unit/assets/bgm.rs"]
mod tests;
