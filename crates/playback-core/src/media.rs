use narrate_synthesis::BoxFuture;

use crate::Error;

/// Identifies one `set_source` call, so events from a replaced source can be
/// told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct SourceId(u64);

impl SourceId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Audio element driven by the scheduler. Setters are fire-and-forget; the
/// engine reports back through [`MediaEvent`]s delivered to the player.
pub trait MediaEngine: Send {
    /// Load a new resource. Expect `MetadataLoaded` then `CanPlay` later,
    /// both tagged with the returned id.
    fn set_source(&mut self, audio_ref: &str) -> SourceId;
    fn clear_source(&mut self);
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// `None` until metadata is loaded.
    fn duration(&self) -> Option<f64>;
    fn set_playback_rate(&mut self, rate: f32);
    fn play(&mut self);
    fn pause(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaEvent {
    MetadataLoaded { source: SourceId, duration: f64 },
    CanPlay { source: SourceId },
    TimeUpdate { current_time: f64 },
    Played,
    Paused,
    Ended,
}

/// Resolves the length of an audio resource without playing it.
pub trait DurationProbe: Send + Sync {
    fn probe<'a>(&'a self, audio_ref: &'a str) -> BoxFuture<'a, Result<f64, Error>>;
}
