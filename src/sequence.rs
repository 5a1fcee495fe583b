//! Image sequence discovery and frame range indexing
//!
//! **Why**: Artists point the tools at folders of numbered frames
//! (render.0101.exr .. render.0588.exr). Discovery groups sibling files
//! into distinct sequences and computes each one's frame spans.
//!
//! **Used by**: clip (native range resolution), cli (scan command)
//!
//! # Grouping
//!
//! Files belong to the same sequence only if every structural element
//! besides the frame index agrees: header, padding width, extension and
//! both delimiters. Multiple sequences per folder are expected; results
//! come back longest span first since the longest sequence is usually the
//! one of interest.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pattern::{MediaError, PadStyle, SequencePattern};

/// One discovered sequence with its frame span data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceInfo {
    /// First frame present on disk.
    pub in_frame: i64,
    /// Last frame present on disk.
    pub out_frame: i64,
    /// Maximal runs of consecutive frames, ascending, gap-separated.
    pub ranges: Vec<(i64, i64)>,
    /// Reusable hash-padded path for this group.
    pub template_path: PathBuf,
    /// Structural template shared by every file in the group.
    pub pattern: SequencePattern,
}

impl SequenceInfo {
    /// Total span including gaps.
    pub fn span(&self) -> i64 {
        self.out_frame - self.in_frame
    }

    /// Frames actually present on disk.
    pub fn frame_count(&self) -> i64 {
        self.ranges.iter().map(|(a, b)| b - a + 1).sum()
    }

    /// Human-readable range summary, e.g. `101-103,106-107`.
    pub fn ranges_string(&self) -> String {
        ranges_to_string(&self.ranges)
    }
}

/// Outcome of resolving a single path against its siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum SeqQuery {
    /// The path matched a sequence convention and sibling frames exist.
    Sequence(SequenceInfo),
    /// The path follows no sequence convention. Degenerate single-frame
    /// info so callers can still treat it as playable media.
    Literal {
        template_path: PathBuf,
        in_frame: i64,
        out_frame: i64,
    },
}

impl SeqQuery {
    pub fn template_path(&self) -> &Path {
        match self {
            SeqQuery::Sequence(info) => &info.template_path,
            SeqQuery::Literal { template_path, .. } => template_path,
        }
    }

    pub fn frame_range(&self) -> (i64, i64) {
        match self {
            SeqQuery::Sequence(info) => (info.in_frame, info.out_frame),
            SeqQuery::Literal {
                in_frame, out_frame, ..
            } => (*in_frame, *out_frame),
        }
    }

    /// Contiguous ranges when the path resolved to a real sequence.
    pub fn ranges(&self) -> Option<&[(i64, i64)]> {
        match self {
            SeqQuery::Sequence(info) => Some(&info.ranges),
            SeqQuery::Literal { .. } => None,
        }
    }
}

/// Split sorted indices into maximal runs of consecutive integers.
pub fn group_contiguous(indices: &[i64]) -> Vec<(i64, i64)> {
    let mut sorted: Vec<i64> = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return ranges;
    };

    let mut start = first;
    let mut prev = first;
    for idx in iter {
        if idx != prev + 1 {
            ranges.push((start, prev));
            start = idx;
        }
        prev = idx;
    }
    ranges.push((start, prev));
    ranges
}

/// Render interval list as a frame ranges string.
///
/// `[(1,3),(5,5),(8,9)]` → `"1-3,5,8-9"`.
pub fn ranges_to_string(ranges: &[(i64, i64)]) -> String {
    ranges
        .iter()
        .map(|(a, b)| {
            if a == b {
                a.to_string()
            } else {
                format!("{}-{}", a, b)
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a frame ranges string back into interval list.
///
/// `"1-3,5,8-9"` → `[(1,3),(5,5),(8,9)]`.
pub fn parse_ranges(s: &str) -> Result<Vec<(i64, i64)>, MediaError> {
    let mut ranges = Vec::new();
    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((a, b)) = token.split_once('-') {
            let a = a.trim().parse::<i64>().map_err(|_| bad_range_token(token))?;
            let b = b.trim().parse::<i64>().map_err(|_| bad_range_token(token))?;
            ranges.push((a, b));
        } else {
            let v = token.parse::<i64>().map_err(|_| bad_range_token(token))?;
            ranges.push((v, v));
        }
    }
    Ok(ranges)
}

fn bad_range_token(token: &str) -> MediaError {
    MediaError::Usage(format!("bad frame range token '{}'", token))
}

/// Interval list for a plain in/out pair, the numeric counterpart of
/// [`parse_ranges`].
///
/// `(1, 9)` → `[(1,9)]`.
pub fn range_from_bounds(frame_in: i64, frame_out: i64) -> Vec<(i64, i64)> {
    vec![(frame_in.min(frame_out), frame_in.max(frame_out))]
}

/// Discover every sequence in a directory, longest span first.
pub fn query_directory(dir: &Path) -> Result<Vec<SequenceInfo>, MediaError> {
    if !dir.is_dir() {
        return Err(MediaError::NotFound(format!(
            "query path '{}' does not exist",
            dir.display()
        )));
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| MediaError::Io(format!("failed to read dir '{}': {}", dir.display(), e)))?;

    // Group concrete frame files by structural identity. Templated names
    // that happen to sit on disk (a literal "####" file) carry no index
    // and are skipped.
    let mut groups: HashMap<(String, usize, String, char, char), (SequencePattern, Vec<i64>)> =
        HashMap::new();

    for entry in entries {
        let entry =
            entry.map_err(|e| MediaError::Io(format!("dir entry error: {}", e)))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(parsed) = SequencePattern::parse(&dir.join(name)) else {
            continue;
        };
        let Some(index) = parsed.frame_index else {
            continue;
        };

        let slot = groups
            .entry(parsed.structural_key())
            .or_insert_with(|| (templated(&parsed), Vec::new()));
        slot.1.push(index);
    }

    let mut infos: Vec<SequenceInfo> = groups
        .into_values()
        .map(|(pattern, indices)| {
            let ranges = group_contiguous(&indices);
            let in_frame = ranges.first().map(|r| r.0).unwrap_or(0);
            let out_frame = ranges.last().map(|r| r.1).unwrap_or(0);
            SequenceInfo {
                in_frame,
                out_frame,
                ranges,
                template_path: pattern.template_path(),
                pattern,
            }
        })
        .collect();

    // Longest sequence first; template path breaks ties deterministically.
    infos.sort_by(|a, b| {
        b.span()
            .cmp(&a.span())
            .then_with(|| a.template_path.cmp(&b.template_path))
    });

    Ok(infos)
}

/// Resolve a single frame file or templated path against its siblings.
///
/// A path that follows no sequence convention degrades to a
/// [`SeqQuery::Literal`] rather than an error, since callers routinely
/// pass plain media files through here. `Ok(None)` means the path looked
/// like a sequence but no sibling files share its structure.
pub fn query_template(path: &Path) -> Result<Option<SeqQuery>, MediaError> {
    let Some(wanted) = SequencePattern::parse(path) else {
        warn!(
            "path does not point to an image sequence: {}",
            path.display()
        );
        return Ok(Some(SeqQuery::Literal {
            template_path: path.to_path_buf(),
            in_frame: 1,
            out_frame: 1,
        }));
    };

    let dir = if wanted.directory.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        wanted.directory.clone()
    };

    let key = wanted.structural_key();
    let found = query_directory(&dir)?
        .into_iter()
        .find(|info| info.pattern.structural_key() == key);

    Ok(found.map(SeqQuery::Sequence))
}

/// Left eye convention: the filename carries a `.l.` token.
pub fn is_left_eye(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains(".l."))
        .unwrap_or(false)
}

/// Right-eye counterpart of a left-eye path; None for mono paths.
pub fn right_eye(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    if !name.contains(".l.") {
        return None;
    }
    let right = name.replace(".l.", ".r.");
    Some(match path.parent() {
        Some(parent) => parent.join(right),
        None => PathBuf::from(right),
    })
}

/// Discover a stereo pair in a directory.
///
/// Returns the first two sequences whose headers agree except for the
/// trailing eye token, left eye first. A mono directory collapses to a
/// single entry.
pub fn query_stereo_dir(dir: &Path) -> Result<Vec<SequenceInfo>, MediaError> {
    let infos = query_directory(dir)?;
    if infos.len() < 2 {
        return Ok(infos);
    }

    let mut pair: Vec<SequenceInfo> = infos.into_iter().take(2).collect();
    pair.sort_by(|a, b| a.pattern.header.cmp(&b.pattern.header));

    let stem = |h: &str| -> Vec<String> {
        let mut parts: Vec<String> = h.split('.').map(str::to_string).collect();
        parts.pop();
        parts
    };

    if stem(&pair[0].pattern.header) == stem(&pair[1].pattern.header) {
        Ok(pair)
    } else {
        Ok(pair.into_iter().take(1).collect())
    }
}

fn templated(parsed: &SequencePattern) -> SequencePattern {
    let mut p = parsed.clone();
    p.style = PadStyle::Hash;
    p.frame_index = None;
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a scratch directory with the given (empty) files.
    fn scratch_dir(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clipstore_seq_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for f in files {
            fs::write(dir.join(f), b"").unwrap();
        }
        dir
    }

    #[test]
    fn test_group_contiguous_with_gaps() {
        let ranges = group_contiguous(&[106, 101, 102, 103, 107]);
        assert_eq!(ranges, vec![(101, 103), (106, 107)]);
    }

    #[test]
    fn test_group_contiguous_single_and_empty() {
        assert_eq!(group_contiguous(&[5]), vec![(5, 5)]);
        assert_eq!(group_contiguous(&[]), Vec::<(i64, i64)>::new());
    }

    #[test]
    fn test_ranges_string_round_trip() {
        let ranges = vec![(1, 3), (5, 5), (8, 9)];
        let s = ranges_to_string(&ranges);
        assert_eq!(s, "1-3,5,8-9");
        assert_eq!(parse_ranges(&s).unwrap(), ranges);
    }

    #[test]
    fn test_parse_ranges_rejects_garbage() {
        assert!(matches!(
            parse_ranges("1-3,x"),
            Err(MediaError::Usage(_))
        ));
    }

    #[test]
    fn test_range_from_bounds() {
        assert_eq!(range_from_bounds(1, 9), vec![(1, 9)]);
        assert_eq!(range_from_bounds(9, 1), vec![(1, 9)]);
        assert_eq!(ranges_to_string(&range_from_bounds(101, 109)), "101-109");
    }

    #[test]
    fn test_query_directory_groups_and_sorts() {
        let files: Vec<String> = (101..=109)
            .map(|i| format!("shot.{:04}.jpg", i))
            .chain(std::iter::once("other.001.png".to_string()))
            .chain(std::iter::once("notes.txt".to_string()))
            .collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let dir = scratch_dir("groups", &refs);

        let infos = query_directory(&dir).unwrap();
        assert_eq!(infos.len(), 2);

        // Longest span first.
        let shot = &infos[0];
        assert_eq!(shot.pattern.header, "shot");
        assert_eq!((shot.in_frame, shot.out_frame), (101, 109));
        assert_eq!(shot.ranges, vec![(101, 109)]);
        assert_eq!(shot.template_path, dir.join("shot.####.jpg"));

        let other = &infos[1];
        assert_eq!(other.pattern.header, "other");
        assert_eq!((other.in_frame, other.out_frame), (1, 1));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_query_directory_gap_detection() {
        let files: Vec<String> = [101, 102, 103, 106, 107]
            .iter()
            .map(|i| format!("plate.{:04}.exr", i))
            .collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let dir = scratch_dir("gaps", &refs);

        let infos = query_directory(&dir).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].ranges, vec![(101, 103), (106, 107)]);
        assert_eq!(infos[0].ranges_string(), "101-103,106-107");
        assert_eq!(infos[0].frame_count(), 5);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_query_directory_missing_dir() {
        let missing = std::env::temp_dir().join("clipstore_seq_does_not_exist");
        assert!(matches!(
            query_directory(&missing),
            Err(MediaError::NotFound(_))
        ));
    }

    #[test]
    fn test_query_template_matches_siblings() {
        let files = ["shot.0101.jpg", "shot.0102.jpg", "shot.0103.jpg"];
        let dir = scratch_dir("template", &files);

        // Query by concrete frame and by templated path.
        for name in ["shot.0101.jpg", "shot.####.jpg", "shot.%04d.jpg"] {
            let result = query_template(&dir.join(name)).unwrap().unwrap();
            match result {
                SeqQuery::Sequence(info) => {
                    assert_eq!((info.in_frame, info.out_frame), (101, 103));
                }
                other => panic!("expected sequence, got {:?}", other),
            }
        }

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_query_template_literal_fallback() {
        let dir = scratch_dir("literal", &["movie_small.mov"]);
        let path = dir.join("movie_small.mov");

        let result = query_template(&path).unwrap().unwrap();
        assert_eq!(
            result,
            SeqQuery::Literal {
                template_path: path,
                in_frame: 1,
                out_frame: 1,
            }
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_query_template_no_siblings() {
        let dir = scratch_dir("nosiblings", &["shot.0101.jpg"]);

        let result = query_template(&dir.join("ghost.0101.jpg")).unwrap();
        assert_eq!(result, None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_right_eye_substitution() {
        let right = right_eye(Path::new("/seq/frame.l.0101.jpg")).unwrap();
        assert_eq!(right, PathBuf::from("/seq/frame.r.0101.jpg"));
        assert!(right_eye(Path::new("/seq/frame.0101.jpg")).is_none());
        assert!(is_left_eye(Path::new("frame.l.0101.jpg")));
        assert!(!is_left_eye(Path::new("frame.r.0101.jpg")));
    }

    #[test]
    fn test_query_stereo_dir_pairs_eyes() {
        let files = [
            "frame.l.0101.jpg",
            "frame.l.0102.jpg",
            "frame.r.0101.jpg",
            "frame.r.0102.jpg",
        ];
        let dir = scratch_dir("stereo", &files);

        let pair = query_stereo_dir(&dir).unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0].pattern.header, "frame.l");
        assert_eq!(pair[1].pattern.header, "frame.r");
        assert_eq!(pair[0].ranges, pair[1].ranges);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_query_stereo_dir_mono_collapses() {
        let files = ["frame.0101.jpg", "frame.0102.jpg"];
        let dir = scratch_dir("mono", &files);

        let result = query_stereo_dir(&dir).unwrap();
        assert_eq!(result.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
