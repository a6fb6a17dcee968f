pub const DEFAULT_SHORT_PARAGRAPH_WORDS: usize = 12;
pub const DEFAULT_SHORT_PARAGRAPH_CHARS: usize = 60;
pub const DEFAULT_SENTENCE_TARGET_WORDS: usize = 120;

/// Thresholds below which an accumulated paragraph group is considered too
/// small to synthesize on its own and is merged into the next paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SegmenterConfig {
    #[serde(default = "default_short_paragraph_words")]
    pub short_paragraph_words: usize,
    #[serde(default = "default_short_paragraph_chars")]
    pub short_paragraph_chars: usize,
}

fn default_short_paragraph_words() -> usize {
    DEFAULT_SHORT_PARAGRAPH_WORDS
}

fn default_short_paragraph_chars() -> usize {
    DEFAULT_SHORT_PARAGRAPH_CHARS
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            short_paragraph_words: DEFAULT_SHORT_PARAGRAPH_WORDS,
            short_paragraph_chars: DEFAULT_SHORT_PARAGRAPH_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// Split on blank lines, merging short paragraphs forward.
    Paragraphs(SegmenterConfig),
    /// Group whole sentences up to a word budget per segment.
    Sentences { target_words: usize },
}

impl Policy {
    pub fn sentences() -> Self {
        Self::Sentences {
            target_words: DEFAULT_SENTENCE_TARGET_WORDS,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::Paragraphs(SegmenterConfig::default())
    }
}
