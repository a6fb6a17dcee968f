use crate::{Error, SubtitleEntry, SubtitleTrack, parse_timestamp};

const ARROW: &str = "-->";

/// Parse a timed transcript into word entries, numbering them from
/// `word_offset`.
///
/// Records are separated by blank lines. Every record that carries text
/// takes one word slot, so a record with a broken timing line is dropped
/// without shifting the words after it. Records without text (headers,
/// stray blank records) take no slot.
pub fn parse(content: &str, word_offset: usize) -> Vec<SubtitleEntry> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut word_index = word_offset;

    for line in content.lines() {
        if line.trim().is_empty() {
            entries.extend(take_block(&mut block, &mut word_index));
        } else {
            block.push(line);
        }
    }
    entries.extend(take_block(&mut block, &mut word_index));

    entries
}

/// Like [`parse`], but reports a transcript that has content and yet no
/// usable record.
pub fn try_parse(content: &str, word_offset: usize) -> Result<SubtitleTrack, Error> {
    let entries = parse(content, word_offset);
    if entries.is_empty() && !content.trim().is_empty() {
        return Err(Error::NoEntries);
    }
    Ok(SubtitleTrack::new(entries))
}

/// Consume the buffered record, advancing `word_index` past it when it
/// holds text.
fn take_block(block: &mut Vec<&str>, word_index: &mut usize) -> Option<SubtitleEntry> {
    let record = parse_block(block, *word_index);
    block.clear();
    match record {
        Record::Entry(entry) => {
            *word_index += 1;
            Some(entry)
        }
        Record::Untimed => {
            tracing::debug!(word_index = *word_index, "subtitle_record_without_timing");
            *word_index += 1;
            None
        }
        Record::Empty => None,
    }
}

enum Record {
    Entry(SubtitleEntry),
    /// Has text but no usable timing.
    Untimed,
    Empty,
}

fn parse_block(lines: &[&str], word_index: usize) -> Record {
    let Some(timing_at) = lines.iter().position(|l| l.contains(ARROW)) else {
        return Record::Empty;
    };

    let text = lines[timing_at + 1..]
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        tracing::trace!(word_index, "subtitle_record_without_text");
        return Record::Empty;
    }

    match parse_timing(lines[timing_at]) {
        Some((start, end)) => Record::Entry(SubtitleEntry {
            start,
            end,
            text,
            word_index,
        }),
        None => Record::Untimed,
    }
}

fn parse_timing(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once(ARROW)?;
    let start = parse_timestamp(start).ok()?;
    // Cue settings may follow the end time.
    let end = parse_timestamp(end.split_whitespace().next()?).ok()?;
    Some((start, end))
}
