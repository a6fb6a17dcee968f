use crate::Progress;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlayerState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Finished,
    Error,
}

impl PlayerState {
    /// States from which a new session may start.
    pub fn is_idle_like(self) -> bool {
        matches!(self, Self::Idle | Self::Finished | Self::Error)
    }

    pub fn controls(self) -> ControlState {
        match self {
            Self::Loading => ControlState {
                play: false,
                pause: false,
                stop: false,
            },
            Self::Playing => ControlState {
                play: false,
                pause: true,
                stop: true,
            },
            Self::Paused => ControlState {
                play: true,
                pause: false,
                stop: true,
            },
            Self::Idle | Self::Finished | Self::Error => ControlState {
                play: true,
                pause: false,
                stop: false,
            },
        }
    }
}

/// Which transport controls are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ControlState {
    pub play: bool,
    pub pause: bool,
    pub stop: bool,
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum PlayerLifecycleEvent {
    #[serde(rename = "started")]
    Started {
        session_id: String,
        chunks: usize,
        words: usize,
    },
    #[serde(rename = "stateChanged")]
    StateChanged {
        session_id: Option<String>,
        state: PlayerState,
        controls: ControlState,
    },
    #[serde(rename = "chunkFocused")]
    ChunkFocused {
        session_id: String,
        index: usize,
        start_word: usize,
        end_word: usize,
    },
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum PlayerProgressEvent {
    #[serde(rename = "waitingForBuffer")]
    WaitingForBuffer {
        session_id: String,
        chunk: usize,
        chunks: usize,
    },
    #[serde(rename = "generating")]
    Generating {
        session_id: String,
        chunk: usize,
        chunks: usize,
    },
    #[serde(rename = "position")]
    Position {
        session_id: String,
        progress: Progress,
        chunk: usize,
        word: Option<usize>,
    },
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum PlayerErrorEvent {
    #[serde(rename = "validation")]
    Validation { message: String },
    #[serde(rename = "chunkFailed")]
    ChunkFailed {
        session_id: String,
        chunk_number: usize,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_table() {
        assert_eq!(
            PlayerState::Loading.controls(),
            ControlState {
                play: false,
                pause: false,
                stop: false
            }
        );
        assert!(PlayerState::Playing.controls().pause);
        assert!(!PlayerState::Playing.controls().play);
        assert!(PlayerState::Paused.controls().play);
        assert!(PlayerState::Paused.controls().stop);
        for state in [PlayerState::Idle, PlayerState::Finished, PlayerState::Error] {
            assert!(state.is_idle_like());
            assert!(state.controls().play);
            assert!(!state.controls().stop);
        }
    }

    #[test]
    fn events_are_tagged() {
        let event = PlayerErrorEvent::ChunkFailed {
            session_id: "s".into(),
            chunk_number: 2,
            message: "boom".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "chunkFailed");
        assert_eq!(json["chunk_number"], 2);
    }
}
