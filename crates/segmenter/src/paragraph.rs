use crate::{Emitter, Segment, SegmenterConfig, word_count};

/// Paragraph-merge segmentation.
///
/// Paragraphs are separated by blank lines. A pending group keeps absorbing
/// the following paragraph while it is below either threshold, so a lone
/// heading never becomes its own synthesis round-trip. The last group is
/// always emitted, whatever its size.
pub(crate) fn segment(text: &str, config: &SegmenterConfig) -> Vec<Segment> {
    let paragraphs = split_paragraphs(text);
    let mut emitter = Emitter::new();

    let mut pending: Vec<String> = Vec::new();
    let mut pending_words = 0;

    for (i, paragraph) in paragraphs.iter().enumerate() {
        pending_words += word_count(paragraph);
        pending.push(paragraph.clone());

        let has_next = i + 1 < paragraphs.len();
        let joined = pending.join("\n");
        let too_short = pending_words < config.short_paragraph_words
            || joined.chars().count() < config.short_paragraph_chars;

        if too_short && has_next {
            continue;
        }

        emitter.emit(joined, pending_words);
        pending.clear();
        pending_words = 0;
    }

    emitter.finish()
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_single_paragraph_is_one_segment() {
        let segments = segment("Hello world. This is a test.", &SegmenterConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_word, 0);
        assert_eq!(segments[0].end_word, 5);
        assert_eq!(segments[0].text, "Hello world. This is a test.");
    }

    #[test]
    fn short_paragraph_merges_forward() {
        let text = format!("A short heading\n\n{}", words(40));
        let segments = segment(&text, &SegmenterConfig::default());

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_word, 0);
        assert_eq!(segments[0].end_word, 42);
        assert!(segments[0].text.starts_with("A short heading\n"));
    }

    #[test]
    fn long_paragraphs_stay_separate() {
        let text = format!("{}\n\n{}\n\n{}", words(20), words(30), words(25));
        let segments = segment(&text, &SegmenterConfig::default());

        let ranges: Vec<_> = segments.iter().map(|s| s.word_range()).collect();
        assert_eq!(ranges, vec![0..=19, 20..=49, 50..=74]);
    }

    #[test]
    fn trailing_short_paragraph_is_emitted_alone() {
        let text = format!("{}\n\nThe end.", words(20));
        let segments = segment(&text, &SegmenterConfig::default());

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "The end.");
        assert_eq!(segments[1].word_range(), 20..=21);
    }

    #[test]
    fn character_threshold_alone_forces_merge() {
        let config = SegmenterConfig {
            short_paragraph_words: 1,
            short_paragraph_chars: 30,
        };
        let segments = segment("one two three\n\nfour five six seven eight nine ten", &config);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].word_range(), 0..=9);
    }

    #[test]
    fn several_short_paragraphs_accumulate_until_threshold() {
        let config = SegmenterConfig {
            short_paragraph_words: 5,
            short_paragraph_chars: 0,
        };
        let text = "a b\n\nc d\n\ne f\n\ng h i j k l";
        let segments = segment(text, &config);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "a b\nc d\ne f");
        assert_eq!(segments[0].word_range(), 0..=5);
        assert_eq!(segments[1].word_range(), 6..=11);
    }

    #[test]
    fn blank_lines_with_whitespace_separate_paragraphs() {
        let paragraphs = split_paragraphs("first line\nsecond line\n  \t\nthird\r\n\r\n\r\nfourth  ");
        assert_eq!(paragraphs, vec!["first line\nsecond line", "third", "fourth"]);
    }
}
