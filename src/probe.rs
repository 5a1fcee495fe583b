//! Movie range probing via ffprobe
//!
//! **Why**: Movies carry no frame numbering on disk; the native range has
//! to come from container metadata. The probe is the only external-process
//! touchpoint in the crate.
//!
//! **Used by**: clip (movie source resolution)

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::pattern::MediaError;

static RE_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Duration: ([0-9]{2}):([0-9]{2}):([0-9]{2})\.([0-9]+),").unwrap());

/// Capability interface for movie range discovery.
///
/// Selected at clip construction time; tests inject a canned
/// implementation, production code uses [`FfprobeProbe`].
pub trait MovieProbe {
    /// Zero-based inclusive frame range of a movie file.
    fn movie_range(&self, path: &Path) -> Result<(i64, i64), MediaError>;
}

/// Probe backed by the `ffprobe` command-line tool.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: PathBuf,
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific ffprobe binary instead of whatever is on PATH.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieProbe for FfprobeProbe {
    fn movie_range(&self, path: &Path) -> Result<(i64, i64), MediaError> {
        let out = Command::new(&self.binary)
            .arg(path)
            .output()
            .map_err(|e| MediaError::Probe(format!("failed to run ffprobe: {}", e)))?;

        // ffprobe prints stream info on stderr; scan both pipes.
        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));

        parse_duration_output(&text).ok_or_else(|| {
            MediaError::Probe(format!(
                "no duration in ffprobe output for '{}'",
                path.display()
            ))
        })
    }
}

/// Probe that never resolves anything. Default no-op capability for clips
/// that are known to be frame sequences or are constructed pre-resolved.
#[derive(Debug, Clone, Default)]
pub struct NullProbe;

impl MovieProbe for NullProbe {
    fn movie_range(&self, path: &Path) -> Result<(i64, i64), MediaError> {
        Err(MediaError::Probe(format!(
            "no movie probe configured for '{}'",
            path.display()
        )))
    }
}

/// Extract the zero-based frame range from raw ffprobe output.
///
/// Frame count is derived at a fixed 24 fps, independent of the clip's
/// own rate. The fractional duration field is read as centiseconds.
pub fn parse_duration_output(raw: &str) -> Option<(i64, i64)> {
    let caps = RE_DURATION.captures(raw)?;

    let h: f64 = caps.get(1)?.as_str().parse().ok()?;
    let m: f64 = caps.get(2)?.as_str().parse().ok()?;
    let s: f64 = caps.get(3)?.as_str().parse().ok()?;
    let cs: f64 = caps.get(4)?.as_str().parse().ok()?;

    let seconds = h * 3600.0 + m * 60.0 + s + cs / 100.0;
    let frames = (seconds * 24.0).round() as i64;
    if frames < 1 {
        return None;
    }
    Some((0, frames - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'movie_small.mov':\n\
          Duration: 00:00:03.20, start: 0.000000, bitrate: 1036 kb/s\n\
            Stream #0:0(eng): Video: h264 (High), yuv420p, 960x540, 24 fps\n";

    #[test]
    fn test_parse_duration() {
        // 3.2 s at 24 fps -> 77 frames -> zero-based (0, 76).
        assert_eq!(parse_duration_output(SAMPLE), Some((0, 76)));
    }

    #[test]
    fn test_parse_duration_no_match() {
        assert_eq!(parse_duration_output("not ffprobe output"), None);
        assert_eq!(parse_duration_output(""), None);
    }

    #[test]
    fn test_parse_duration_hours_minutes() {
        let raw = "Duration: 01:02:03.00, start: 0.0,";
        // 3723 s * 24 fps = 89352 frames.
        assert_eq!(parse_duration_output(raw), Some((0, 89351)));
    }

    #[test]
    fn test_null_probe_always_fails() {
        let probe = NullProbe;
        assert!(probe.movie_range(Path::new("x.mov")).is_err());
    }
}
