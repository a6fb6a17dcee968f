/// One timed word in chunk-local seconds. `word_index` is global: the
/// chunk's first word index plus the entry's position in the transcript.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubtitleEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub word_index: usize,
}

/// The word timings of the chunk that is currently live.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleTrack {
    entries: Vec<SubtitleEntry>,
}

impl SubtitleTrack {
    pub fn new(entries: Vec<SubtitleEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Word whose interval contains `time` (bounds inclusive). The first
    /// match wins when intervals touch. `None` inside timing gaps.
    pub fn active_word(&self, time: f64) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.start <= time && time <= e.end)
            .map(|e| e.word_index)
    }
}
