use std::ops::RangeInclusive;

use narrate_segmenter::WordToken;

/// Presentation side of word highlighting. Implementations own the actual
/// widgets (terminal spans, DOM nodes, ...); everything here is addressed
/// by global word index.
pub trait RenderSink: Send {
    fn render_words(&mut self, words: &[WordToken]);
    fn set_word_highlight(&mut self, index: usize, on: bool);
    fn set_chunk_highlight(&mut self, range: RangeInclusive<usize>, on: bool);
    /// Remove every word and chunk mark, including ones this side has lost
    /// track of.
    fn clear_all_marks(&mut self);
    fn scroll_to_word(&mut self, index: usize);
}

/// Tracks which word and chunk are marked so that at most one word is ever
/// highlighted and a chunk switch leaves nothing behind.
#[derive(Debug, Default)]
pub struct Highlighter {
    word: Option<usize>,
    chunk: Option<RangeInclusive<usize>>,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_word(&self) -> Option<usize> {
        self.word
    }

    pub fn current_chunk(&self) -> Option<&RangeInclusive<usize>> {
        self.chunk.as_ref()
    }

    /// Wipe all marks, then mark `range` as the current chunk and bring its
    /// first word into view.
    pub fn focus_chunk(&mut self, sink: &mut dyn RenderSink, range: RangeInclusive<usize>) {
        sink.clear_all_marks();
        self.word = None;

        sink.set_chunk_highlight(range.clone(), true);
        sink.scroll_to_word(*range.start());
        self.chunk = Some(range);
    }

    /// Move the word mark to `active`. A timing gap (`None`) keeps the
    /// previous word marked. Returns whether the mark moved.
    pub fn apply(&mut self, sink: &mut dyn RenderSink, active: Option<usize>) -> bool {
        let Some(next) = active else {
            return false;
        };
        if self.word == Some(next) {
            return false;
        }

        if let Some(prev) = self.word.take() {
            sink.set_word_highlight(prev, false);
        }
        sink.set_word_highlight(next, true);
        self.word = Some(next);
        true
    }

    pub fn clear(&mut self, sink: &mut dyn RenderSink) {
        sink.clear_all_marks();
        self.word = None;
        self.chunk = None;
    }
}
