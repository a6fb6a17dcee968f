mod config;
mod paragraph;
mod sentence;
mod words;

pub use config::*;
pub use words::{WordToken, tokenize, word_count};

use std::ops::RangeInclusive;

/// One unit of text queued for synthesis, addressed by the global word
/// indices it covers.
///
/// Indices come from whitespace tokenization of the *whole* input, so they
/// line up with the spans produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    pub text: String,
    pub start_word: usize,
    pub end_word: usize,
}

impl Segment {
    pub fn word_count(&self) -> usize {
        self.end_word - self.start_word + 1
    }

    pub fn word_range(&self) -> RangeInclusive<usize> {
        self.start_word..=self.end_word
    }
}

/// Split `text` into an ordered list of segments according to `policy`.
///
/// Empty or whitespace-only input yields no segments. For any other input
/// the word ranges partition `0..word_count(text)` without gaps or overlaps.
pub fn segment(text: &str, policy: &Policy) -> Vec<Segment> {
    match policy {
        Policy::Paragraphs(config) => paragraph::segment(text, config),
        Policy::Sentences { target_words } => sentence::segment(text, *target_words),
    }
}

/// Running word offset shared by both policies while emitting segments.
struct Emitter {
    segments: Vec<Segment>,
    offset: usize,
}

impl Emitter {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            offset: 0,
        }
    }

    fn emit(&mut self, text: String, words: usize) {
        if words == 0 {
            return;
        }
        self.segments.push(Segment {
            text,
            start_word: self.offset,
            end_word: self.offset + words - 1,
        });
        self.offset += words;
    }

    fn finish(self) -> Vec<Segment> {
        self.segments
    }
}
