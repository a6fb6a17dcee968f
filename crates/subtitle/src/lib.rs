mod error;
mod highlight;
mod srt;
mod timestamp;
mod track;

pub use error::*;
pub use highlight::{Highlighter, RenderSink};
pub use srt::{parse, try_parse};
pub use timestamp::parse_timestamp;
pub use track::{SubtitleEntry, SubtitleTrack};
