use std::time::Duration;

use narrate_segmenter::{
    DEFAULT_SHORT_PARAGRAPH_CHARS, DEFAULT_SHORT_PARAGRAPH_WORDS, Policy, SegmenterConfig,
};
use narrate_synthesis::Voice;
use serde::Deserialize;

pub const MIN_PLAYBACK_RATE: f32 = 0.5;
pub const MAX_PLAYBACK_RATE: f32 = 2.0;

fn default_lookahead() -> usize {
    2
}

fn default_buffer_poll_ms() -> u64 {
    500
}

fn default_max_buffer_polls() -> Option<u32> {
    Some(120)
}

fn default_voice() -> String {
    Voice::default().to_string()
}

fn default_playback_rate() -> f32 {
    1.0
}

fn default_nudge_secs() -> f64 {
    5.0
}

fn default_short_paragraph_words() -> usize {
    DEFAULT_SHORT_PARAGRAPH_WORDS
}

fn default_short_paragraph_chars() -> usize {
    DEFAULT_SHORT_PARAGRAPH_CHARS
}

/// Player settings. Loaded from `NARRATE_*` environment variables; every
/// field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,
    #[serde(default = "default_buffer_poll_ms")]
    pub buffer_poll_ms: u64,
    /// `None` polls a buffering chunk forever.
    #[serde(default = "default_max_buffer_polls")]
    pub max_buffer_polls: Option<u32>,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f32,
    #[serde(default = "default_nudge_secs")]
    pub nudge_secs: f64,
    #[serde(default = "default_short_paragraph_words")]
    pub short_paragraph_words: usize,
    #[serde(default = "default_short_paragraph_chars")]
    pub short_paragraph_chars: usize,
    /// Switches to sentence grouping with this word budget per chunk.
    #[serde(default)]
    pub sentence_target_words: Option<usize>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            lookahead: default_lookahead(),
            buffer_poll_ms: default_buffer_poll_ms(),
            max_buffer_polls: default_max_buffer_polls(),
            voice: default_voice(),
            playback_rate: default_playback_rate(),
            nudge_secs: default_nudge_secs(),
            short_paragraph_words: default_short_paragraph_words(),
            short_paragraph_chars: default_short_paragraph_chars(),
            sentence_target_words: None,
        }
    }
}

impl PlayerConfig {
    pub fn from_env() -> Result<Self, crate::Error> {
        let mut config: Self = envy::prefixed("NARRATE_").from_env()?;
        config.playback_rate = clamp_rate(config.playback_rate);
        Ok(config)
    }

    pub fn policy(&self) -> Policy {
        match self.sentence_target_words {
            Some(target_words) => Policy::Sentences {
                target_words: target_words.max(1),
            },
            None => Policy::Paragraphs(SegmenterConfig {
                short_paragraph_words: self.short_paragraph_words,
                short_paragraph_chars: self.short_paragraph_chars,
            }),
        }
    }

    pub fn buffer_poll(&self) -> Duration {
        Duration::from_millis(self.buffer_poll_ms)
    }
}

pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE)
    } else {
        default_playback_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_behavior() {
        let config = PlayerConfig::default();
        assert_eq!(config.lookahead, 2);
        assert_eq!(config.buffer_poll(), Duration::from_millis(500));
        assert_eq!(config.voice, "en-US-AriaNeural");
        assert_eq!(config.policy(), Policy::default());
    }

    #[test]
    fn deserializes_from_env_pairs() {
        let vars = vec![
            ("LOOKAHEAD".to_string(), "4".to_string()),
            ("VOICE".to_string(), "en-GB-SoniaNeural".to_string()),
            ("SENTENCE_TARGET_WORDS".to_string(), "50".to_string()),
        ];
        let config: PlayerConfig = envy::from_iter(vars).unwrap();

        assert_eq!(config.lookahead, 4);
        assert_eq!(config.voice, "en-GB-SoniaNeural");
        assert_eq!(config.policy(), Policy::Sentences { target_words: 50 });
        assert_eq!(config.max_buffer_polls, Some(120));
    }

    #[test]
    fn rate_is_clamped() {
        assert_eq!(clamp_rate(3.0), MAX_PLAYBACK_RATE);
        assert_eq!(clamp_rate(0.1), MIN_PLAYBACK_RATE);
        assert_eq!(clamp_rate(f32::NAN), 1.0);
    }
}
