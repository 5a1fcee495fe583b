//! Show constants and media type detection.
//!
//! **Why**: Centralized extension lists and defaults used across modules.
//!
//! **Used by**: clip (source type), sequence (image filtering), cli

use std::path::Path;

/// Movie container extensions. Anything else resolves as an image sequence.
pub const MOVIE_EXTS: &[&str] = &["avi", "mp4", "mov", "mpeg", "mpg"];

/// Still image extensions recognized as sequence frames.
pub const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "exr"];

/// Default playback rate in frames per second.
pub const DEFAULT_FPS: f32 = 24.0;

/// Default display index for the first frame of a movie.
///
/// Movies are zero-based internally but displayed starting here, so a probe
/// result of (0, 76) reads as (101, 177) on screen.
pub const DEFAULT_MOVIE_START_INDEX: i64 = 101;

/// Check if file extension is on the movie allow-list.
pub fn is_movie(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| MOVIE_EXTS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if file extension is a recognized still image format.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| IMAGE_EXTS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Per-show settings sourced from the environment.
#[derive(Debug, Clone)]
pub struct ShowConfig {
    /// Short show code, from `PROD`.
    pub show: String,
    /// Film rate, from `FILM_FPS`.
    pub fps: f32,
}

impl ShowConfig {
    /// Read show settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let show = std::env::var("PROD").unwrap_or_else(|_| "tlp".to_string());
        let fps = std::env::var("FILM_FPS")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(DEFAULT_FPS);

        Self { show, fps }
    }
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            show: "tlp".to_string(),
            fps: DEFAULT_FPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_movie() {
        assert!(is_movie(&PathBuf::from("/show/shot/plate.mov")));
        assert!(is_movie(&PathBuf::from("plate.MP4")));
        assert!(!is_movie(&PathBuf::from("plate.0101.jpg")));
        assert!(!is_movie(&PathBuf::from("no_extension")));
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(&PathBuf::from("frame.0001.exr")));
        assert!(is_image(&PathBuf::from("frame.TIF")));
        assert!(!is_image(&PathBuf::from("frame.mov")));
    }
}
