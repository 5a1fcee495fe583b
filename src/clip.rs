//! ClipSource: a playable unit of media and its range reconciliation
//!
//! **Why**: Review playback needs three things from a clip that the
//! filesystem does not state directly: the native frame range of the
//! media, the window of it that a requested play range actually covers,
//! and how many hold frames pad the request where it overhangs the source.
//!
//! **Used by**: review/playback session drivers, cli
//!
//! # Resolution
//!
//! A clip starts unresolved. The first query that needs range data
//! triggers resolution exactly once: movies go through the [`MovieProbe`]
//! capability and get the display offset applied, everything else goes
//! through the sequence resolver. A failed resolution is remembered and
//! the clip keeps reporting `None` ranges; callers substitute placeholder
//! media. Mismatched stereo ranges abort instead, that is corrupt source
//! data and must not reach playback.

use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::attrs::{AttrValue, Attrs};
use crate::config::{self, DEFAULT_FPS, DEFAULT_MOVIE_START_INDEX};
use crate::pattern::MediaError;
use crate::probe::{FfprobeProbe, MovieProbe};
use crate::sequence::{self, SeqQuery};

/// Playback addressing family of a source, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// Zero-based internally, display-offset shifted for playback.
    Movie,
    /// Frame sequence addressed by native frame numbers.
    Frames,
}

/// How a requested play range relates to the native source range.
///
/// Variants are evaluated in declaration order; the order is the
/// tie-break policy on the boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCase {
    /// Entire request lies outside the source; everything is head hold.
    Disjoint,
    /// Request starts inside the source and runs past its end.
    OverhangTail,
    /// Request starts before the source and ends inside it.
    OverhangHead,
    /// Request overhangs on both sides.
    OverhangBoth,
    /// Request fully inside the source.
    Contained,
}

impl PlayCase {
    /// Classify a play range against a source range.
    pub fn classify(source: (i64, i64), play: (i64, i64)) -> Self {
        let (source_in, source_out) = source;
        let (play_in, play_out) = play;

        if play_in > source_out || play_out < source_in {
            PlayCase::Disjoint
        } else if play_in >= source_in && play_out > source_out {
            PlayCase::OverhangTail
        } else if play_in < source_in && play_out <= source_out {
            PlayCase::OverhangHead
        } else if play_in < source_in && play_out > source_out {
            PlayCase::OverhangBoth
        } else {
            PlayCase::Contained
        }
    }
}

/// Hold/window/hold breakdown driving playback.
///
/// Head and tail holds are frame counts; the window bounds are frames in
/// the source's own addressing space (display-shifted for movies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayData {
    /// Frames to repeat-display the first available frame before playing.
    pub head_hold: Option<i64>,
    pub play_in: Option<i64>,
    pub play_out: Option<i64>,
    /// Frames to repeat-display the last available frame after playing.
    pub tail_hold: Option<i64>,
}

impl PlayData {
    /// Total frame footprint: holds plus window span.
    ///
    /// Always equals `play_out - play_in + 1` of the request.
    pub fn total_frames(&self) -> i64 {
        let window = match (self.play_in, self.play_out) {
            (Some(a), Some(b)) => b - a + 1,
            _ => 0,
        };
        self.head_hold.unwrap_or(0) + window + self.tail_hold.unwrap_or(0)
    }
}

/// Companion audio: path plus offset in frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioRef {
    pub path: PathBuf,
    pub offset: i64,
}

impl AudioRef {
    pub fn new(path: impl Into<PathBuf>, offset: i64) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// Resolution state of one media slot.
#[derive(Debug, Clone, PartialEq)]
enum SlotState {
    Unresolved,
    Resolved { playable: Vec<PathBuf> },
    Failed,
}

/// One resolvable media reference: main source or preview.
#[derive(Debug, Clone)]
struct MediaSlot {
    raw: Option<PathBuf>,
    state: SlotState,
}

impl MediaSlot {
    fn new(raw: Option<PathBuf>) -> Self {
        // Blank paths count as absent.
        let raw = raw.filter(|p| !p.as_os_str().is_empty());
        Self {
            raw,
            state: SlotState::Unresolved,
        }
    }

    fn playable(&self) -> Option<&[PathBuf]> {
        match &self.state {
            SlotState::Resolved { playable } => Some(playable),
            _ => None,
        }
    }
}

/// Construction parameters beyond the source path.
#[derive(Clone)]
pub struct ClipOptions {
    /// Secondary media resolved with the same machinery; `source_path`
    /// falls back to it when the main source cannot resolve.
    pub preview: Option<PathBuf>,
    /// Native range overrides; resolution fills only what is unset.
    pub source_in: Option<i64>,
    pub source_out: Option<i64>,
    pub play_in: Option<i64>,
    pub play_out: Option<i64>,
    pub fps: f32,
    /// Display index of a movie's first frame.
    pub movie_start_index: i64,
    pub audio: Option<AudioRef>,
    /// Movie range capability; defaults to [`FfprobeProbe`].
    pub probe: Option<Arc<dyn MovieProbe + Send + Sync>>,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            preview: None,
            source_in: None,
            source_out: None,
            play_in: None,
            play_out: None,
            fps: DEFAULT_FPS,
            movie_start_index: DEFAULT_MOVIE_START_INDEX,
            audio: None,
            probe: None,
        }
    }
}

/// A clip: movie file or image sequence, mono or stereo, with lazily
/// resolved native range and a reconcilable play range.
#[derive(Clone)]
pub struct ClipSource {
    source: MediaSlot,
    preview: MediaSlot,

    source_in: Option<i64>,
    source_out: Option<i64>,

    play_in: Option<i64>,
    play_out: Option<i64>,

    fps: f32,
    movie_start_index: i64,
    audio: Option<AudioRef>,

    meta: Attrs,
    probe: Arc<dyn MovieProbe + Send + Sync>,
}

impl std::fmt::Debug for ClipSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipSource")
            .field("source", &self.source)
            .field("preview", &self.preview)
            .field("source_in", &self.source_in)
            .field("source_out", &self.source_out)
            .field("play_in", &self.play_in)
            .field("play_out", &self.play_out)
            .field("fps", &self.fps)
            .field("movie_start_index", &self.movie_start_index)
            .finish()
    }
}

impl ClipSource {
    /// Clip over a single media reference with default options.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self::with_options(source, ClipOptions::default())
    }

    pub fn with_options(source: impl Into<PathBuf>, opts: ClipOptions) -> Self {
        let (play_in, play_out) = normalize_optional_range(opts.play_in, opts.play_out);
        Self {
            source: MediaSlot::new(Some(source.into())),
            preview: MediaSlot::new(opts.preview),
            source_in: opts.source_in,
            source_out: opts.source_out,
            play_in,
            play_out,
            fps: opts.fps,
            movie_start_index: opts.movie_start_index,
            audio: opts.audio,
            meta: Attrs::new(),
            probe: opts
                .probe
                .unwrap_or_else(|| Arc::new(FfprobeProbe::new())),
        }
    }

    /// Clip whose playable paths and native range are already known;
    /// skips probing and filesystem queries entirely.
    pub fn from_resolved(
        playable: Vec<PathBuf>,
        source_in: i64,
        source_out: i64,
        opts: ClipOptions,
    ) -> Result<Self, MediaError> {
        if playable.is_empty() {
            return Err(MediaError::Usage(
                "a resolved clip needs at least one playable path".to_string(),
            ));
        }
        let (play_in, play_out) = normalize_optional_range(opts.play_in, opts.play_out);
        Ok(Self {
            source: MediaSlot {
                raw: playable.first().cloned(),
                state: SlotState::Resolved { playable },
            },
            preview: MediaSlot::new(opts.preview),
            source_in: Some(opts.source_in.unwrap_or(source_in)),
            source_out: Some(opts.source_out.unwrap_or(source_out)),
            play_in,
            play_out,
            fps: opts.fps,
            movie_start_index: opts.movie_start_index,
            audio: opts.audio,
            meta: Attrs::new(),
            probe: opts.probe.unwrap_or_else(|| Arc::new(FfprobeProbe::new())),
        })
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn movie_start_index(&self) -> i64 {
        self.movie_start_index
    }

    /// Companion audio reference, if any.
    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }

    /// Audio offset converted to seconds at the clip rate.
    pub fn audio_offset_secs(&self) -> Option<f64> {
        self.audio
            .as_ref()
            .map(|a| a.offset as f64 / self.fps as f64)
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.meta.set(key, value);
    }

    pub fn get_meta(&self, key: &str) -> Option<&AttrValue> {
        self.meta.get(key)
    }

    pub fn meta(&self) -> &Attrs {
        &self.meta
    }

    pub fn merge_meta(&mut self, other: &Attrs) {
        self.meta.merge(other);
    }

    /// Movie or frames, decided purely by extension against the movie
    /// allow-list. Classifies whichever slot actually resolved, so a
    /// clip playing its movie preview counts as a movie even when the
    /// main source is a frame path.
    pub fn source_type(&mut self) -> SourceType {
        let settled = self
            .source_paths()
            .and_then(|playable| playable.first())
            .map(|p| config::is_movie(p));
        let movie = match settled {
            Some(movie) => movie,
            None => self
                .source
                .raw
                .as_deref()
                .map(config::is_movie)
                .unwrap_or(false),
        };
        if movie { SourceType::Movie } else { SourceType::Frames }
    }

    /// Whether both eyes resolved to playable media.
    pub fn is_stereo(&mut self) -> bool {
        self.source_paths().map(|p| p.len() == 2).unwrap_or(false)
    }

    /// Resolution already attempted and failed.
    pub fn resolve_failed(&self) -> bool {
        self.source.state == SlotState::Failed
            && (self.preview.raw.is_none() || self.preview.state == SlotState::Failed)
    }

    /// Playable template/movie paths, main source preferred.
    pub fn source_paths(&mut self) -> Option<&[PathBuf]> {
        self.source_paths_pref(false)
    }

    /// Playable paths with explicit slot preference; falls back to the
    /// other slot when the preferred one cannot resolve.
    pub fn source_paths_pref(&mut self, prefer_preview: bool) -> Option<&[PathBuf]> {
        self.resolve_slot(prefer_preview);
        if self.slot(prefer_preview).playable().is_none() {
            self.resolve_slot(!prefer_preview);
        }

        let use_preview = if self.slot(prefer_preview).playable().is_some() {
            prefer_preview
        } else {
            !prefer_preview
        };
        self.slot(use_preview).playable()
    }

    /// First playable path.
    pub fn source_path(&mut self) -> Option<PathBuf> {
        self.source_paths()
            .and_then(|p| p.first())
            .cloned()
    }

    /// Native frame range, resolving lazily on first call.
    pub fn source_range(&mut self) -> Option<(i64, i64)> {
        if self.source_in.is_none() || self.source_out.is_none() {
            self.source_paths();
        }
        match (self.source_in, self.source_out) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Requested play range, falling back to the native range when unset.
    pub fn play_range(&mut self) -> Option<(i64, i64)> {
        match (self.play_in, self.play_out) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => self.source_range(),
        }
    }

    /// Set the play range; argument order does not matter.
    pub fn set_play_range(&mut self, a: i64, b: i64) {
        self.play_in = Some(a.min(b));
        self.play_out = Some(a.max(b));
    }

    /// Clear the play range so it falls back to the native range again.
    pub fn reset_play_range(&mut self) {
        self.play_in = None;
        self.play_out = None;
    }

    /// Classification of the current play range against the source range.
    pub fn play_case(&mut self) -> Option<PlayCase> {
        let source = self.source_range()?;
        let play = self.play_range()?;
        Some(PlayCase::classify(source, play))
    }

    /// Hold/window/hold breakdown for playback. None while unresolved.
    pub fn get_play_data(&mut self) -> Option<PlayData> {
        let (source_in, source_out) = self.source_range()?;
        let (play_in, play_out) = match (self.play_in, self.play_out) {
            (Some(a), Some(b)) => (a, b),
            _ => (source_in, source_out),
        };

        let case = PlayCase::classify((source_in, source_out), (play_in, play_out));
        let mut data = match case {
            PlayCase::Disjoint => PlayData {
                head_hold: Some(play_out - play_in + 1),
                play_in: None,
                play_out: None,
                tail_hold: None,
            },
            PlayCase::OverhangTail => PlayData {
                head_hold: None,
                play_in: Some(play_in),
                play_out: Some(source_out),
                tail_hold: Some(play_out - source_out),
            },
            PlayCase::OverhangHead => PlayData {
                head_hold: Some(source_in - play_in),
                play_in: Some(source_in),
                play_out: Some(play_out),
                tail_hold: None,
            },
            PlayCase::OverhangBoth => PlayData {
                head_hold: Some(source_in - play_in),
                play_in: Some(source_in),
                play_out: Some(source_out),
                tail_hold: Some(play_out - source_out),
            },
            PlayCase::Contained => PlayData {
                head_hold: None,
                play_in: Some(play_in),
                play_out: Some(play_out),
                tail_hold: None,
            },
        };

        // Movie playback addresses frames relative to the display offset;
        // only the window bounds shift, never the hold counts. The
        // defaulted play range shifts like an explicit one, so a movie
        // always gets movie-space window bounds.
        if self.source_type() == SourceType::Movie {
            data.play_in = data.play_in.map(|v| v - self.movie_start_index);
            data.play_out = data.play_out.map(|v| v - self.movie_start_index);
        }

        Some(data)
    }

    fn slot(&self, preview: bool) -> &MediaSlot {
        if preview { &self.preview } else { &self.source }
    }

    /// Single resolution entry point; idempotent, at most one attempt per
    /// slot for the clip's lifetime.
    fn resolve_slot(&mut self, preview: bool) {
        let slot = if preview {
            &mut self.preview
        } else {
            &mut self.source
        };
        if slot.state != SlotState::Unresolved {
            return;
        }
        let Some(raw) = slot.raw.clone() else {
            slot.state = SlotState::Failed;
            return;
        };

        match determine_range(&raw, self.movie_start_index, self.probe.as_ref()) {
            Ok((playable, in_frame, out_frame)) => {
                if self.source_in.is_none() {
                    self.source_in = Some(in_frame);
                }
                if self.source_out.is_none() {
                    self.source_out = Some(out_frame);
                }
                let slot = if preview {
                    &mut self.preview
                } else {
                    &mut self.source
                };
                slot.state = SlotState::Resolved { playable };
            }
            Err(e) => {
                warn!("can not resolve source from '{}': {}", raw.display(), e);
                let slot = if preview {
                    &mut self.preview
                } else {
                    &mut self.source
                };
                slot.state = SlotState::Failed;
            }
        }
    }
}

fn normalize_optional_range(a: Option<i64>, b: Option<i64>) -> (Option<i64>, Option<i64>) {
    match (a, b) {
        (Some(x), Some(y)) => (Some(x.min(y)), Some(x.max(y))),
        other => other,
    }
}

/// Resolve playable paths and the native range for one media reference.
fn determine_range(
    path: &Path,
    movie_start_index: i64,
    probe: &dyn MovieProbe,
) -> Result<(Vec<PathBuf>, i64, i64), MediaError> {
    if config::is_movie(path) {
        let left = path.to_path_buf();
        let right = sequence::right_eye(path);

        let mut playable = Vec::new();
        if left.is_file() {
            playable.push(left.clone());
        }
        if let Some(right) = right {
            if right.is_file() {
                playable.push(right);
            }
        }
        if playable.is_empty() {
            return Err(MediaError::NotFound(format!(
                "movie source '{}' does not exist",
                path.display()
            )));
        }

        let (probe_in, probe_out) = probe.movie_range(&left)?;
        Ok((
            playable,
            probe_in + movie_start_index,
            probe_out + movie_start_index,
        ))
    } else {
        let left = sequence::query_template(path)?;
        let right = match sequence::right_eye(path) {
            Some(right_path) => match sequence::query_template(&right_path)? {
                // A literal right eye only counts if the file is there.
                Some(SeqQuery::Literal { .. }) if !right_path.is_file() => None,
                other => other,
            },
            None => None,
        };

        // Stereo pairs must agree on their frame ranges exactly; picking
        // one eye's range would desynchronize playback.
        if let (Some(SeqQuery::Sequence(l)), Some(SeqQuery::Sequence(r))) = (&left, &right) {
            assert_eq!(
                l.ranges, r.ranges,
                "stereo eyes disagree on frame ranges: left {:?} right {:?}",
                l.ranges, r.ranges
            );
        }

        let mut playable = Vec::new();
        if let Some(q) = &left {
            playable.push(q.template_path().to_path_buf());
        }
        if let Some(q) = &right {
            playable.push(q.template_path().to_path_buf());
        }

        let range_source = left.as_ref().or(right.as_ref()).ok_or_else(|| {
            MediaError::NotFound(format!(
                "no frames found for sequence '{}'",
                path.display()
            ))
        })?;
        let (in_frame, out_frame) = range_source.frame_range();

        Ok((playable, in_frame, out_frame))
    }
}
