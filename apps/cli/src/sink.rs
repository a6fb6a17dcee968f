use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, MutexGuard};

use narrate_segmenter::WordToken;
use narrate_subtitle::RenderSink;

#[derive(Debug, Default)]
pub struct TextView {
    pub words: Vec<WordToken>,
    pub highlighted: BTreeSet<usize>,
    pub chunk: Option<RangeInclusive<usize>>,
    pub scroll_to: Option<usize>,
}

impl TextView {
    pub fn in_chunk(&self, index: usize) -> bool {
        self.chunk.as_ref().is_some_and(|r| r.contains(&index))
    }
}

/// Text view shared between the player actor, which marks words, and the
/// draw loop, which reads them.
#[derive(Clone, Default)]
pub struct SharedTextView(Arc<Mutex<TextView>>);

impl SharedTextView {
    pub fn lock(&self) -> MutexGuard<'_, TextView> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RenderSink for SharedTextView {
    fn render_words(&mut self, words: &[WordToken]) {
        let mut view = self.lock();
        view.words = words.to_vec();
        view.highlighted.clear();
        view.chunk = None;
        view.scroll_to = None;
    }

    fn set_word_highlight(&mut self, index: usize, on: bool) {
        let mut view = self.lock();
        if on {
            view.highlighted.insert(index);
        } else {
            view.highlighted.remove(&index);
        }
    }

    fn set_chunk_highlight(&mut self, range: RangeInclusive<usize>, on: bool) {
        let mut view = self.lock();
        if on {
            view.chunk = Some(range);
        } else if view.chunk.as_ref() == Some(&range) {
            view.chunk = None;
        }
    }

    fn clear_all_marks(&mut self) {
        let mut view = self.lock();
        view.highlighted.clear();
        view.chunk = None;
    }

    fn scroll_to_word(&mut self, index: usize) {
        self.lock().scroll_to = Some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_mark_only_cleared_for_same_range() {
        let mut view = SharedTextView::default();
        view.set_chunk_highlight(0..=4, true);
        view.set_chunk_highlight(5..=9, true);
        view.set_chunk_highlight(0..=4, false);

        assert_eq!(view.lock().chunk, Some(5..=9));
        assert!(view.lock().in_chunk(7));
        assert!(!view.lock().in_chunk(2));
    }

    #[test]
    fn render_resets_marks() {
        let mut view = SharedTextView::default();
        view.set_word_highlight(3, true);
        view.scroll_to_word(3);
        view.render_words(&narrate_segmenter::tokenize("one two"));

        let view = view.lock();
        assert_eq!(view.words.len(), 2);
        assert!(view.highlighted.is_empty());
        assert_eq!(view.scroll_to, None);
    }
}
