use narrate_playback_core::{
    PlayerErrorEvent, PlayerLifecycleEvent, PlayerProgressEvent, PlayerRuntime,
};
use tokio::sync::mpsc;

pub enum PlayerEvent {
    Lifecycle(PlayerLifecycleEvent),
    Progress(PlayerProgressEvent),
    Error(PlayerErrorEvent),
}

pub struct TuiRuntime {
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

impl TuiRuntime {
    pub fn new(tx: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self { tx }
    }
}

impl PlayerRuntime for TuiRuntime {
    fn emit_lifecycle(&self, event: PlayerLifecycleEvent) {
        let _ = self.tx.send(PlayerEvent::Lifecycle(event));
    }

    fn emit_progress(&self, event: PlayerProgressEvent) {
        let _ = self.tx.send(PlayerEvent::Progress(event));
    }

    fn emit_error(&self, event: PlayerErrorEvent) {
        let _ = self.tx.send(PlayerEvent::Error(event));
    }
}
