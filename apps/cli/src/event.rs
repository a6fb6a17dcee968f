use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

use crate::runtime::PlayerEvent;

const TICK: Duration = Duration::from_millis(250);

pub enum AppEvent {
    Key(KeyEvent),
    Player(PlayerEvent),
    Resize,
    Tick,
}

/// Merges terminal input, read on a blocking thread, with events coming
/// out of the player.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new(mut player_rx: mpsc::UnboundedReceiver<PlayerEvent>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let terminal_tx = tx.clone();
        std::thread::spawn(move || {
            loop {
                let next = match event::poll(TICK) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            AppEvent::Key(key)
                        }
                        Ok(Event::Resize(..)) => AppEvent::Resize,
                        Ok(_) => continue,
                        Err(error) => {
                            tracing::error!(%error, "terminal_read_failed");
                            break;
                        }
                    },
                    Ok(false) => AppEvent::Tick,
                    Err(error) => {
                        tracing::error!(%error, "terminal_poll_failed");
                        break;
                    }
                };
                if terminal_tx.send(next).is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(event) = player_rx.recv().await {
                if tx.send(AppEvent::Player(event)).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}
