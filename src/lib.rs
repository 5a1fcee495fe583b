//! CLIPSTORE - Clip range resolution for review pipelines
//!
//! Resolves media clip ranges from movie files and image sequences and
//! reconciles requested play ranges against them: sequence pattern
//! detection (`####`, `@@@@`, `%04d`, literal digits), directory grouping
//! with gap detection, stereo pairing, movie probing and the five-way
//! play-window classification with hold-frame padding.

pub mod attrs;
pub mod cli;
pub mod clip;
pub mod config;
pub mod pattern;
pub mod probe;
pub mod sequence;

// Re-export commonly used types
pub use attrs::{AttrValue, Attrs};
pub use clip::{AudioRef, ClipOptions, ClipSource, PlayCase, PlayData, SourceType};
pub use pattern::{MediaError, PadStyle, RenderStyle, SequencePattern};
pub use probe::{FfprobeProbe, MovieProbe, NullProbe};
pub use sequence::{SeqQuery, SequenceInfo};
