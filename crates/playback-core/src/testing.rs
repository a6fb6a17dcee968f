use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use narrate_segmenter::WordToken;
use narrate_subtitle::RenderSink;
use narrate_synthesis::SynthesisResponse;

use crate::{
    MediaEngine, MediaEvent, PlayerErrorEvent, PlayerLifecycleEvent, PlayerProgressEvent,
    PlayerRuntime, PlayerState, SourceId,
};

#[derive(Debug, Default)]
pub struct MediaLog {
    pub source: Option<String>,
    pub source_id: SourceId,
    pub sources: Vec<String>,
    pub time: f64,
    pub duration: Option<f64>,
    pub rate: f32,
    pub playing: bool,
    pub seeks: Vec<f64>,
}

#[derive(Clone, Default)]
pub struct FakeMedia(pub Arc<Mutex<MediaLog>>);

impl FakeMedia {
    pub fn log(&self) -> std::sync::MutexGuard<'_, MediaLog> {
        self.0.lock().unwrap()
    }

    pub fn can_play(&self) -> MediaEvent {
        MediaEvent::CanPlay {
            source: self.log().source_id,
        }
    }

    pub fn metadata(&self, duration: f64) -> MediaEvent {
        MediaEvent::MetadataLoaded {
            source: self.log().source_id,
            duration,
        }
    }
}

impl MediaEngine for FakeMedia {
    fn set_source(&mut self, audio_ref: &str) -> SourceId {
        let mut log = self.log();
        log.source_id = SourceId::new(log.source_id.value() + 1);
        log.source = Some(audio_ref.to_string());
        log.sources.push(audio_ref.to_string());
        log.time = 0.0;
        log.duration = None;
        log.playing = false;
        log.source_id
    }

    fn clear_source(&mut self) {
        let mut log = self.log();
        log.source = None;
        log.duration = None;
        log.playing = false;
    }

    fn current_time(&self) -> f64 {
        self.log().time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut log = self.log();
        log.time = seconds;
        log.seeks.push(seconds);
    }

    fn duration(&self) -> Option<f64> {
        self.log().duration
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.log().rate = rate;
    }

    fn play(&mut self) {
        self.log().playing = true;
    }

    fn pause(&mut self) {
        self.log().playing = false;
    }
}

#[derive(Debug, Default)]
pub struct Marks {
    pub words: Vec<WordToken>,
    pub highlighted: BTreeSet<usize>,
    pub chunk: BTreeSet<usize>,
    pub scrolled: Vec<usize>,
}

#[derive(Clone, Default)]
pub struct RecordingSink(pub Arc<Mutex<Marks>>);

impl RecordingSink {
    pub fn marks(&self) -> std::sync::MutexGuard<'_, Marks> {
        self.0.lock().unwrap()
    }
}

impl RenderSink for RecordingSink {
    fn render_words(&mut self, words: &[WordToken]) {
        self.marks().words = words.to_vec();
    }

    fn set_word_highlight(&mut self, index: usize, on: bool) {
        let mut marks = self.marks();
        if on {
            marks.highlighted.insert(index);
        } else {
            marks.highlighted.remove(&index);
        }
    }

    fn set_chunk_highlight(&mut self, range: RangeInclusive<usize>, on: bool) {
        let mut marks = self.marks();
        for index in range {
            if on {
                marks.chunk.insert(index);
            } else {
                marks.chunk.remove(&index);
            }
        }
    }

    fn clear_all_marks(&mut self) {
        let mut marks = self.marks();
        marks.highlighted.clear();
        marks.chunk.clear();
    }

    fn scroll_to_word(&mut self, index: usize) {
        self.marks().scrolled.push(index);
    }
}

#[derive(Default)]
pub struct RecordingRuntime {
    pub lifecycle: Mutex<Vec<PlayerLifecycleEvent>>,
    pub progress: Mutex<Vec<PlayerProgressEvent>>,
    pub errors: Mutex<Vec<PlayerErrorEvent>>,
}

impl RecordingRuntime {
    pub fn states(&self) -> Vec<PlayerState> {
        self.lifecycle
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                PlayerLifecycleEvent::StateChanged { state, .. } => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<PlayerErrorEvent> {
        self.errors.lock().unwrap().clone()
    }
}

impl PlayerRuntime for RecordingRuntime {
    fn emit_lifecycle(&self, event: PlayerLifecycleEvent) {
        self.lifecycle.lock().unwrap().push(event);
    }

    fn emit_progress(&self, event: PlayerProgressEvent) {
        self.progress.lock().unwrap().push(event);
    }

    fn emit_error(&self, event: PlayerErrorEvent) {
        self.errors.lock().unwrap().push(event);
    }
}

/// `n` paragraphs of fifteen words each, long enough to never merge.
pub fn passage(n: usize) -> String {
    (0..n)
        .map(|p| {
            (0..15)
                .map(|w| format!("p{p}word{w}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn response(index: usize) -> SynthesisResponse {
    SynthesisResponse {
        audio_url: format!("http://tts.local/audio/{index}.mp3"),
        subtitle_url: format!("http://tts.local/audio/{index}.srt"),
    }
}

/// One record per word, `step` seconds each.
pub fn srt(words: usize, step: f64) -> String {
    let stamp = |t: f64| {
        let millis = (t * 1000.0).round() as u64;
        format!(
            "00:{:02}:{:02},{:03}",
            millis / 60_000,
            (millis / 1000) % 60,
            millis % 1000
        )
    };
    (0..words)
        .map(|i| {
            let start = i as f64 * step;
            format!(
                "{}\n{} --> {}\nw{i}\n",
                i + 1,
                stamp(start),
                stamp(start + step)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
