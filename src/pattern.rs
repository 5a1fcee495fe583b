//! Frame padding pattern detection and rendering
//!
//! **Why**: Pipeline paths encode a variable frame index in one of several
//! conventions (literal digits, `####`, `@@@@`, `%04d`). Everything that
//! walks sequences needs one canonical structural form.
//!
//! **Used by**: sequence (directory grouping), clip (source resolution), cli
//!
//! # Detection
//!
//! Matchers run in fixed priority order, first hit wins:
//!
//! 1. literal index:  `.0101.`  (3-9 digits)
//! 2. hash padding:   `.####.`
//! 3. at padding:     `.@@@@.`
//! 4. printf padding: `.%04d.`
//!
//! Delimiters are `.` or `_` and the two sides may differ
//! (`shot_0101.exr` parses). A filename with no match is not part of any
//! recognized sequence convention.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

static RE_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"([._])([0-9]{3,9})([._])").unwrap());
static RE_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"([._])(#{3,9})([._])").unwrap());
static RE_AT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([._])(@{3,9})([._])").unwrap());
static RE_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([._])%0([3-9])d([._])").unwrap());

/// Error type shared by pattern, sequence, probe and clip modules.
#[derive(Debug)]
pub enum MediaError {
    /// Programmer error at the call site (bad render request, bad range string).
    Usage(String),
    /// A path or directory that must exist does not.
    NotFound(String),
    /// Filesystem access failed.
    Io(String),
    /// External movie probe could not produce a range.
    Probe(String),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::Usage(e) => write!(f, "Usage error: {}", e),
            MediaError::NotFound(e) => write!(f, "Not found: {}", e),
            MediaError::Io(e) => write!(f, "IO error: {}", e),
            MediaError::Probe(e) => write!(f, "Probe error: {}", e),
        }
    }
}

impl std::error::Error for MediaError {}

/// How the original filename encoded its frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PadStyle {
    /// Concrete zero-padded digits, e.g. `0101`.
    Numeric,
    /// `####`
    Hash,
    /// `@@@@`
    At,
    /// `%04d`
    Percent,
}

/// Requested output convention when re-rendering a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    /// Concrete index digits; requires a parsed frame index.
    Numeric,
    Hash,
    At,
    Percent,
    /// `101-109@@@@` form; requires explicit bounds. Not re-parseable.
    ExplicitRange,
}

/// Structural template of a sequence filename.
///
/// The full template path is always reconstructible as
/// `directory / header + left_delimiter + padding + right_delimiter + ext`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePattern {
    pub directory: PathBuf,
    pub header: String,
    pub ext: String,
    pub left_delimiter: char,
    pub right_delimiter: char,
    /// Number of digits in the index token, 3-9.
    pub padding: usize,
    pub style: PadStyle,
    /// Concrete index parsed from a single-frame filename; None for
    /// already-templated paths (`####`, `@@@@`, `%04d`).
    pub frame_index: Option<i64>,
}

impl SequencePattern {
    /// Parse a full path into its sequence structure.
    ///
    /// Returns None when the filename follows no recognized convention.
    pub fn parse(path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse_name(filename, directory)
    }

    /// Parse a bare filename (no directory component).
    fn parse_name(filename: &str, directory: PathBuf) -> Option<Self> {
        // Priority order is part of the contract: a name that could parse
        // two ways takes the first matcher.
        let attempts: [(&Regex, PadStyle); 4] = [
            (&RE_NUMERIC, PadStyle::Numeric),
            (&RE_HASH, PadStyle::Hash),
            (&RE_AT, PadStyle::At),
            (&RE_PERCENT, PadStyle::Percent),
        ];

        for (re, style) in attempts {
            let Some(caps) = re.captures(filename) else {
                continue;
            };
            let whole = caps.get(0)?;
            let left = caps.get(1)?.as_str().chars().next()?;
            let token = caps.get(2)?.as_str();
            let right = caps.get(3)?.as_str().chars().next()?;

            let (padding, frame_index) = match style {
                PadStyle::Numeric => (token.len(), token.parse::<i64>().ok()),
                PadStyle::Hash | PadStyle::At => (token.len(), None),
                PadStyle::Percent => (token.parse::<usize>().ok()?, None),
            };

            return Some(Self {
                directory,
                header: filename[..whole.start()].to_string(),
                ext: filename[whole.end()..].to_string(),
                left_delimiter: left,
                right_delimiter: right,
                padding,
                style,
                frame_index,
            });
        }

        None
    }

    /// Render the padding token in the requested style.
    fn padding_token(
        &self,
        style: RenderStyle,
        range: Option<(i64, i64)>,
    ) -> Result<String, MediaError> {
        match style {
            RenderStyle::Numeric => {
                let index = self.frame_index.ok_or_else(|| {
                    MediaError::Usage(
                        "numeric rendering needs a concrete frame index".to_string(),
                    )
                })?;
                Ok(format!("{:0width$}", index, width = self.padding))
            }
            RenderStyle::Hash => Ok("#".repeat(self.padding)),
            RenderStyle::At => Ok("@".repeat(self.padding)),
            RenderStyle::Percent => Ok(format!("%0{}d", self.padding)),
            RenderStyle::ExplicitRange => {
                let (frame_in, frame_out) = range.ok_or_else(|| {
                    MediaError::Usage(
                        "explicit-range rendering needs frame_in and frame_out".to_string(),
                    )
                })?;
                Ok(format!(
                    "{}-{}{}",
                    frame_in,
                    frame_out,
                    "@".repeat(self.padding)
                ))
            }
        }
    }

    /// Render the filename in the requested style.
    pub fn render_name(
        &self,
        style: RenderStyle,
        range: Option<(i64, i64)>,
    ) -> Result<String, MediaError> {
        let token = self.padding_token(style, range)?;
        Ok(format!(
            "{}{}{}{}{}",
            self.header, self.left_delimiter, token, self.right_delimiter, self.ext
        ))
    }

    /// Render the full path in the requested style.
    pub fn render(
        &self,
        style: RenderStyle,
        range: Option<(i64, i64)>,
    ) -> Result<PathBuf, MediaError> {
        Ok(self.directory.join(self.render_name(style, range)?))
    }

    /// Canonical hash-padded template path, e.g. `shot.####.jpg`.
    pub fn template_path(&self) -> PathBuf {
        // Hash rendering never fails: no index or bounds required.
        self.directory
            .join(format!(
                "{}{}{}{}{}",
                self.header,
                self.left_delimiter,
                "#".repeat(self.padding),
                self.right_delimiter,
                self.ext
            ))
    }

    /// Path of a concrete frame, zero-padded to this pattern's width.
    pub fn frame_path(&self, frame: i64) -> PathBuf {
        self.directory.join(format!(
            "{}{}{:0width$}{}{}",
            self.header,
            self.left_delimiter,
            frame,
            self.right_delimiter,
            self.ext,
            width = self.padding
        ))
    }

    /// Structural identity: files belong to the same sequence only if every
    /// element besides the frame index agrees.
    pub fn structural_key(&self) -> (String, usize, String, char, char) {
        (
            self.header.clone(),
            self.padding,
            self.ext.clone(),
            self.left_delimiter,
            self.right_delimiter,
        )
    }
}

/// Padding width of a path, None when it is not part of a recognized
/// sequence. Cheap membership test for sequence conventions.
pub fn padding_width_of(path: &Path) -> Option<usize> {
    SequencePattern::parse(path).map(|p| p.padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> SequencePattern {
        SequencePattern::parse(Path::new(name)).expect("should parse")
    }

    #[test]
    fn test_parse_numeric() {
        let p = parse("/mnt/seq/dummy_frame.l.0101.jpg");
        assert_eq!(p.header, "dummy_frame.l");
        assert_eq!(p.ext, "jpg");
        assert_eq!(p.padding, 4);
        assert_eq!(p.style, PadStyle::Numeric);
        assert_eq!(p.frame_index, Some(101));
        assert_eq!(p.left_delimiter, '.');
        assert_eq!(p.right_delimiter, '.');
    }

    #[test]
    fn test_parse_hash() {
        let p = parse("shot.######.exr");
        assert_eq!(p.style, PadStyle::Hash);
        assert_eq!(p.padding, 6);
        assert_eq!(p.frame_index, None);
    }

    #[test]
    fn test_parse_at() {
        let p = parse("shot.@@@.tif");
        assert_eq!(p.style, PadStyle::At);
        assert_eq!(p.padding, 3);
    }

    #[test]
    fn test_parse_percent() {
        let p = parse("shot.%05d.png");
        assert_eq!(p.style, PadStyle::Percent);
        assert_eq!(p.padding, 5);
        assert_eq!(p.frame_index, None);
    }

    #[test]
    fn test_parse_mixed_delimiters() {
        let p = parse("shot_0101.exr");
        assert_eq!(p.left_delimiter, '_');
        assert_eq!(p.right_delimiter, '.');
        assert_eq!(p.header, "shot");
        assert_eq!(p.ext, "exr");
    }

    #[test]
    fn test_parse_no_match() {
        assert!(SequencePattern::parse(Path::new("movie_small.mov")).is_none());
        // Padding outside 3-9 is not a sequence token.
        assert!(SequencePattern::parse(Path::new("shot.01.jpg")).is_none());
        assert!(SequencePattern::parse(Path::new("shot.0123456789x.jpg")).is_none());
    }

    #[test]
    fn test_numeric_takes_priority() {
        // Numeric matcher runs first even when a hash token appears later.
        let p = parse("shot.0101.####.jpg");
        assert_eq!(p.style, PadStyle::Numeric);
        assert_eq!(p.frame_index, Some(101));
    }

    #[test]
    fn test_render_styles() {
        let p = parse("/seq/shot.0101.jpg");
        assert_eq!(
            p.render(RenderStyle::Hash, None).unwrap(),
            PathBuf::from("/seq/shot.####.jpg")
        );
        assert_eq!(
            p.render(RenderStyle::At, None).unwrap(),
            PathBuf::from("/seq/shot.@@@@.jpg")
        );
        assert_eq!(
            p.render(RenderStyle::Percent, None).unwrap(),
            PathBuf::from("/seq/shot.%04d.jpg")
        );
        assert_eq!(
            p.render(RenderStyle::Numeric, None).unwrap(),
            PathBuf::from("/seq/shot.0101.jpg")
        );
        assert_eq!(
            p.render(RenderStyle::ExplicitRange, Some((101, 109))).unwrap(),
            PathBuf::from("/seq/shot.101-109@@@@.jpg")
        );
    }

    #[test]
    fn test_explicit_range_without_bounds_is_usage_error() {
        let p = parse("shot.0101.jpg");
        match p.render(RenderStyle::ExplicitRange, None) {
            Err(MediaError::Usage(_)) => {}
            other => panic!("expected usage error, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_render_without_index_is_usage_error() {
        let p = parse("shot.####.jpg");
        assert!(matches!(
            p.render(RenderStyle::Numeric, None),
            Err(MediaError::Usage(_))
        ));
    }

    #[test]
    fn test_round_trip_all_styles() {
        let original = parse("/seq/shot.0101.jpg");
        for style in [
            RenderStyle::Numeric,
            RenderStyle::Hash,
            RenderStyle::At,
            RenderStyle::Percent,
        ] {
            let rendered = original.render(style, None).unwrap();
            let reparsed = SequencePattern::parse(&rendered).unwrap();
            assert_eq!(reparsed.header, original.header);
            assert_eq!(reparsed.ext, original.ext);
            assert_eq!(reparsed.padding, original.padding);
            assert_eq!(reparsed.left_delimiter, original.left_delimiter);
            assert_eq!(reparsed.right_delimiter, original.right_delimiter);
            assert_eq!(reparsed.template_path(), original.template_path());
        }
    }

    #[test]
    fn test_frame_path() {
        let p = parse("/seq/shot.####.jpg");
        assert_eq!(p.frame_path(7), PathBuf::from("/seq/shot.0007.jpg"));
        assert_eq!(p.frame_path(1234), PathBuf::from("/seq/shot.1234.jpg"));
    }

    #[test]
    fn test_padding_width_of() {
        assert_eq!(padding_width_of(Path::new("a.0001.exr")), Some(4));
        assert_eq!(padding_width_of(Path::new("a.mov")), None);
    }
}
