use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use narrate_playback_core::{
    ControlState, PlayerErrorEvent, PlayerLifecycleEvent, PlayerProgressEvent, PlayerState,
    Progress, clamp_rate,
};
use narrate_synthesis::Voice;
use strum::IntoEnumIterator;

use crate::runtime::PlayerEvent;

const RATE_STEP: f32 = 0.1;
const SEEK_STEP: f64 = 0.1;

/// What a key press asks of the player.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Start,
    Pause,
    Resume,
    Stop,
    Nudge(f64),
    SeekFraction(f64),
    SetPlaybackRate(f32),
    SetVoice(Voice),
}

pub struct App {
    pub state: PlayerState,
    pub controls: ControlState,
    pub status: String,
    pub error: Option<String>,
    pub progress: Progress,
    pub chunk: Option<(usize, usize)>,
    pub voice: Voice,
    pub rate: f32,
    pub nudge_secs: f64,
    pub should_quit: bool,
    chunks: usize,
}

impl App {
    pub fn new(voice: Voice, rate: f32, nudge_secs: f64) -> Self {
        Self {
            state: PlayerState::Idle,
            controls: PlayerState::Idle.controls(),
            status: "READY".into(),
            error: None,
            progress: Progress::default(),
            chunk: None,
            voice,
            rate: clamp_rate(rate),
            nudge_secs,
            should_quit: false,
            chunks: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char(' ') => match self.state {
                PlayerState::Playing if self.controls.pause => Some(Action::Pause),
                PlayerState::Paused => Some(Action::Resume),
                state if state.is_idle_like() => {
                    self.error = None;
                    Some(Action::Start)
                }
                _ => None,
            },
            KeyCode::Esc if self.controls.stop => Some(Action::Stop),
            KeyCode::Left => Some(Action::Nudge(-self.nudge_secs)),
            KeyCode::Right => Some(Action::Nudge(self.nudge_secs)),
            KeyCode::Char('[') => Some(Action::SeekFraction(
                (self.progress.fraction() - SEEK_STEP).max(0.0),
            )),
            KeyCode::Char(']') => Some(Action::SeekFraction(
                (self.progress.fraction() + SEEK_STEP).min(1.0),
            )),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.rate = clamp_rate(self.rate + RATE_STEP);
                Some(Action::SetPlaybackRate(self.rate))
            }
            KeyCode::Char('-') => {
                self.rate = clamp_rate(self.rate - RATE_STEP);
                Some(Action::SetPlaybackRate(self.rate))
            }
            KeyCode::Char('v') => {
                self.voice = next_voice(self.voice);
                Some(Action::SetVoice(self.voice))
            }
            _ => None,
        }
    }

    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Lifecycle(event) => self.on_lifecycle(event),
            PlayerEvent::Progress(event) => self.on_progress(event),
            PlayerEvent::Error(event) => self.on_error(event),
        }
    }

    fn on_lifecycle(&mut self, event: PlayerLifecycleEvent) {
        match event {
            PlayerLifecycleEvent::Started { chunks, .. } => {
                self.chunks = chunks;
                self.progress = Progress::default();
            }
            PlayerLifecycleEvent::StateChanged {
                state, controls, ..
            } => {
                self.state = state;
                self.controls = controls;
                match state {
                    PlayerState::Idle => {
                        self.status = "STOPPED".into();
                        self.chunk = None;
                        self.progress = Progress::default();
                    }
                    PlayerState::Playing => self.status = "PLAYING".into(),
                    PlayerState::Paused => self.status = "PAUSED".into(),
                    PlayerState::Finished => {
                        self.status = "FINISHED".into();
                        self.chunk = None;
                    }
                    PlayerState::Error => self.status = "ERROR".into(),
                    PlayerState::Loading => {}
                }
            }
            PlayerLifecycleEvent::ChunkFocused { index, .. } => {
                self.chunk = Some((index + 1, self.chunks));
            }
        }
    }

    fn on_progress(&mut self, event: PlayerProgressEvent) {
        match event {
            PlayerProgressEvent::WaitingForBuffer { chunk, chunks, .. } => {
                self.status = format!("WAITING FOR BUFFER (CHUNK {chunk}/{chunks})");
            }
            PlayerProgressEvent::Generating { chunk, chunks, .. } => {
                self.status = format!("GENERATING AUDIO (CHUNK {chunk}/{chunks})");
            }
            PlayerProgressEvent::Position {
                progress, chunk, ..
            } => {
                self.progress = progress;
                self.chunk = Some((chunk + 1, self.chunks));
            }
        }
    }

    fn on_error(&mut self, event: PlayerErrorEvent) {
        self.error = Some(match event {
            PlayerErrorEvent::Validation { message } => message,
            PlayerErrorEvent::ChunkFailed {
                chunk_number,
                message,
                ..
            } => format!("chunk {chunk_number}: {message}"),
        });
    }
}

fn next_voice(current: Voice) -> Voice {
    let voices: Vec<Voice> = Voice::iter().collect();
    let position = voices.iter().position(|v| *v == current).unwrap_or(0);
    voices[(position + 1) % voices.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(Voice::default(), 1.0, 5.0)
    }

    fn state(app: &mut App, state: PlayerState) {
        app.handle_player_event(PlayerEvent::Lifecycle(
            PlayerLifecycleEvent::StateChanged {
                session_id: None,
                state,
                controls: state.controls(),
            },
        ));
    }

    #[test]
    fn space_follows_state() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Char(' '))), Some(Action::Start));

        state(&mut app, PlayerState::Loading);
        assert_eq!(app.handle_key(key(KeyCode::Char(' '))), None);

        state(&mut app, PlayerState::Playing);
        assert_eq!(app.handle_key(key(KeyCode::Char(' '))), Some(Action::Pause));

        state(&mut app, PlayerState::Paused);
        assert_eq!(app.handle_key(key(KeyCode::Char(' '))), Some(Action::Resume));

        state(&mut app, PlayerState::Finished);
        assert_eq!(app.handle_key(key(KeyCode::Char(' '))), Some(Action::Start));
    }

    #[test]
    fn escape_only_when_stoppable() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Esc)), None);
        state(&mut app, PlayerState::Playing);
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(Action::Stop));
    }

    #[test]
    fn rate_is_clamped() {
        let mut app = app();
        for _ in 0..20 {
            app.handle_key(key(KeyCode::Char('+')));
        }
        assert_eq!(app.rate, 2.0);
        assert_eq!(
            app.handle_key(key(KeyCode::Char('-'))),
            Some(Action::SetPlaybackRate(clamp_rate(2.0 - RATE_STEP)))
        );
    }

    #[test]
    fn voice_cycles_back_to_start() {
        let mut app = app();
        let count = Voice::iter().count();
        for _ in 0..count {
            app.handle_key(key(KeyCode::Char('v')));
        }
        assert_eq!(app.voice, Voice::default());
    }

    #[test]
    fn progress_statuses() {
        let mut app = app();
        app.handle_player_event(PlayerEvent::Progress(PlayerProgressEvent::Generating {
            session_id: "s".into(),
            chunk: 2,
            chunks: 5,
        }));
        assert_eq!(app.status, "GENERATING AUDIO (CHUNK 2/5)");

        app.handle_player_event(PlayerEvent::Progress(
            PlayerProgressEvent::WaitingForBuffer {
                session_id: "s".into(),
                chunk: 3,
                chunks: 5,
            },
        ));
        assert_eq!(app.status, "WAITING FOR BUFFER (CHUNK 3/5)");
    }

    #[test]
    fn chunk_failure_is_shown() {
        let mut app = app();
        app.handle_player_event(PlayerEvent::Error(PlayerErrorEvent::ChunkFailed {
            session_id: "s".into(),
            chunk_number: 4,
            message: "timeout".into(),
        }));
        assert_eq!(app.error.as_deref(), Some("chunk 4: timeout"));

        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.error, None);
    }
}
