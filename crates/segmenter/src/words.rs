/// A whitespace-delimited word with the whitespace that preceded it, so a
/// renderer can rebuild the original layout (line breaks included).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WordToken {
    pub index: usize,
    pub leading: String,
    pub text: String,
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Tokenize `text` into addressable words. Indices match the global word
/// indices used by [`crate::segment`]. Whitespace after the last word is
/// dropped.
pub fn tokenize(text: &str) -> Vec<WordToken> {
    let mut tokens = Vec::new();
    let mut leading_start = 0;
    let mut word_start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), word_start) {
            (true, Some(start)) => {
                tokens.push(WordToken {
                    index: tokens.len(),
                    leading: text[leading_start..start].to_string(),
                    text: text[start..i].to_string(),
                });
                word_start = None;
                leading_start = i;
            }
            (false, None) => word_start = Some(i),
            _ => {}
        }
    }

    if let Some(start) = word_start {
        tokens.push(WordToken {
            index: tokens.len(),
            leading: text[leading_start..start].to_string(),
            text: text[start..].to_string(),
        });
    }

    tokens
}
