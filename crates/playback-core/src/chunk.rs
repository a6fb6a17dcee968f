use std::ops::RangeInclusive;

use narrate_segmenter::Segment;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChunkStatus {
    #[default]
    Pending,
    Buffering,
    Ready,
    Error,
}

/// One unit of playback. Created in bulk at session start and mutated in
/// place until the queue is replaced.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub start_word: usize,
    pub end_word: usize,
    pub status: ChunkStatus,
    pub audio_ref: Option<String>,
    pub subtitle_ref: Option<String>,
    pub duration: Option<f64>,
}

impl Chunk {
    pub fn from_segment(index: usize, segment: Segment) -> Self {
        Self {
            index,
            text: segment.text,
            start_word: segment.start_word,
            end_word: segment.end_word,
            status: ChunkStatus::Pending,
            audio_ref: None,
            subtitle_ref: None,
            duration: None,
        }
    }

    pub fn word_range(&self) -> RangeInclusive<usize> {
        self.start_word..=self.end_word
    }

    /// 1-based position, as shown to the user.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Duration usable for timeline math: only once the chunk is ready and
    /// the value is a positive, finite number of seconds.
    pub fn known_duration(&self) -> Option<f64> {
        if self.status != ChunkStatus::Ready {
            return None;
        }
        self.duration.filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn is_playable(&self) -> bool {
        self.status == ChunkStatus::Ready && self.audio_ref.is_some()
    }
}

pub fn build_queue(segments: Vec<Segment>) -> Vec<Chunk> {
    segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| Chunk::from_segment(index, segment))
        .collect()
}
