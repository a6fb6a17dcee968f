use crate::{Emitter, Segment, word_count};

/// Sentence-grouping segmentation: whole sentences are packed into a
/// segment until the next one would push it past `target_words`.
pub(crate) fn segment(text: &str, target_words: usize) -> Vec<Segment> {
    let mut emitter = Emitter::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for sentence in split_sentences(text) {
        let words = word_count(sentence);
        if words == 0 {
            continue;
        }

        if current_words + words > target_words && !current.is_empty() {
            emitter.emit(current.join(" "), current_words);
            current.clear();
            current_words = 0;
        }

        current.push(sentence.trim());
        current_words += words;
    }

    if !current.is_empty() {
        emitter.emit(current.join(" "), current_words);
    }

    emitter.finish()
}

/// Cut after every run of `.`, `!` or `?` that is followed by whitespace or
/// the end of input. Text after the last terminator forms a final sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if matches!(next, '.' | '!' | '?') {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        match chars.peek() {
            Some(&(_, next)) if !next.is_whitespace() => continue,
            _ => {}
        }

        while let Some(&(j, next)) = chars.peek() {
            if next.is_whitespace() {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        sentences.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators_followed_by_space() {
        let sentences = split_sentences("Hi there. How are you?! Fine... e.g. this");
        assert_eq!(
            sentences,
            vec!["Hi there. ", "How are you?! ", "Fine... ", "e.g. ", "this"]
        );
    }

    #[test]
    fn decimal_points_do_not_split() {
        assert_eq!(split_sentences("Pi is 3.14 today."), vec!["Pi is 3.14 today."]);
    }

    #[test]
    fn groups_sentences_under_target() {
        let text = "One two three. Four five. Six seven eight nine. Ten.";
        let segments = segment(text, 5);

        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["One two three. Four five.", "Six seven eight nine. Ten."]
        );
        assert_eq!(segments[0].word_range(), 0..=4);
        assert_eq!(segments[1].word_range(), 5..=9);
    }

    #[test]
    fn oversized_sentence_is_never_split() {
        let segments = segment("a b c d e f g. h.", 3);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].word_range(), 0..=6);
        assert_eq!(segments[1].word_range(), 7..=7);
    }

    #[test]
    fn text_without_terminator_is_one_sentence() {
        let segments = segment("no punctuation at all", 120);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].word_range(), 0..=3);
    }
}
