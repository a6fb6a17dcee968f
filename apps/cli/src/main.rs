mod app;
mod audio;
mod event;
mod runtime;
mod sink;
mod ui;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use narrate_playback_core::{
    PlayerConfig,
    actors::{PlayerActor, PlayerArgs, PlayerMsg, spawn_player},
};
use narrate_synthesis::{SynthesisClient, Voice};
use ractor::ActorRef;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app::{Action, App},
    audio::{AudioCache, AudioOutput, HttpDurationProbe, RodioEngine},
    event::{AppEvent, EventHandler},
    runtime::TuiRuntime,
    sink::SharedTextView,
};

const MEDIA_POLL: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, ValueEnum)]
enum ChunkPolicy {
    Paragraphs,
    Sentences,
}

#[derive(Parser)]
#[command(name = "narrate", about = "Read a text file aloud with word highlighting")]
struct Cli {
    /// Plain text file to narrate.
    file: PathBuf,

    #[arg(long, env = "NARRATE_API_BASE", default_value = "http://127.0.0.1:12000")]
    api_base: String,

    #[arg(long, env = "NARRATE_VOICE")]
    voice: Option<Voice>,

    #[arg(long)]
    rate: Option<f32>,

    #[arg(long)]
    lookahead: Option<usize>,

    #[arg(long, value_enum, default_value = "paragraphs")]
    policy: ChunkPolicy,

    /// Word budget per chunk when chunking by sentences.
    #[arg(long, default_value_t = 120)]
    sentence_words: usize,
}

impl Cli {
    fn apply(&self, config: &mut PlayerConfig) {
        if let Some(voice) = self.voice {
            config.voice = voice.to_string();
        }
        if let Some(rate) = self.rate {
            config.playback_rate = narrate_playback_core::clamp_rate(rate);
        }
        if let Some(lookahead) = self.lookahead {
            config.lookahead = lookahead;
        }
        if let ChunkPolicy::Sentences = self.policy {
            config.sentence_target_words = Some(self.sentence_words);
        }
    }
}

fn setup_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        original(info);
    }));
}

/// The terminal belongs to the UI, so logs go to a file.
fn setup_logging() {
    let path = std::env::temp_dir().join("narrate-cli.log");
    let Ok(file) = std::fs::File::create(&path) else {
        return;
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
}

async fn start(player: &ActorRef<PlayerMsg>, text: &str) {
    match ractor::call!(player, PlayerMsg::Start, text.to_string()) {
        Ok(Ok(())) => {}
        Ok(Err(error)) => tracing::warn!(%error, "start_rejected"),
        Err(error) => tracing::error!(%error, "player_unreachable"),
    }
}

fn dispatch(player: &ActorRef<PlayerMsg>, action: Action) {
    let msg = match action {
        Action::Start => return,
        Action::Pause => PlayerMsg::Pause,
        Action::Resume => PlayerMsg::Resume,
        Action::Stop => PlayerMsg::Stop,
        Action::Nudge(delta) => PlayerMsg::Nudge(delta),
        Action::SeekFraction(fraction) => PlayerMsg::SeekFraction(fraction),
        Action::SetPlaybackRate(rate) => PlayerMsg::SetPlaybackRate(rate),
        Action::SetVoice(voice) => PlayerMsg::SetVoice(voice.to_string()),
    };
    if let Err(error) = player.cast(msg) {
        tracing::error!(%error, "player_unreachable");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging();

    let text = match std::fs::read_to_string(&cli.file) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("cannot read {}: {error}", cli.file.display());
            std::process::exit(1);
        }
    };

    let mut config = PlayerConfig::from_env().expect("invalid NARRATE_* configuration");
    cli.apply(&mut config);

    let client = SynthesisClient::builder()
        .api_base(cli.api_base.clone())
        .build()
        .expect("invalid api base");
    let output = AudioOutput::open().expect("failed to open audio output");
    let cache = AudioCache::default();

    let (media_tx, mut media_rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = RodioEngine::new(output.mixer(), client.clone(), cache.clone(), media_tx);
    let view = SharedTextView::default();

    let (player_tx, player_rx) = tokio::sync::mpsc::unbounded_channel();
    let voice = config.voice.parse::<Voice>().unwrap_or_default();
    let mut app = App::new(voice, config.playback_rate, config.nudge_secs);

    let (player, _handle) = spawn_player(
        Some(PlayerActor::name()),
        PlayerArgs {
            config,
            runtime: Arc::new(TuiRuntime::new(player_tx)),
            synthesizer: Arc::new(client.clone()),
            probe: Arc::new(HttpDurationProbe::new(client, cache)),
            media: Box::new(engine.clone()),
            sink: Box::new(view.clone()),
        },
    )
    .await
    .expect("failed to spawn player actor");

    tokio::spawn({
        let player = player.clone();
        async move {
            while let Some(event) = media_rx.recv().await {
                if player.cast(PlayerMsg::Media(event)).is_err() {
                    break;
                }
            }
        }
    });
    tokio::spawn({
        let player = player.clone();
        async move {
            let mut ticker = tokio::time::interval(MEDIA_POLL);
            loop {
                ticker.tick().await;
                if let Some(event) = engine.poll()
                    && player.cast(PlayerMsg::Media(event)).is_err()
                {
                    break;
                }
            }
        }
    });

    setup_panic_hook();
    let mut terminal = ratatui::init();
    let mut events = EventHandler::new(player_rx);

    start(&player, &text).await;

    loop {
        terminal
            .draw(|frame| ui::draw(frame, &app, &view.lock()))
            .ok();

        match events.next().await {
            Some(AppEvent::Key(key)) => match app.handle_key(key) {
                Some(Action::Start) => start(&player, &text).await,
                Some(action) => dispatch(&player, action),
                None => {}
            },
            Some(AppEvent::Player(event)) => app.handle_player_event(event),
            Some(AppEvent::Resize) | Some(AppEvent::Tick) => {}
            None => break,
        }

        if app.should_quit {
            break;
        }
    }

    ratatui::restore();

    let _ = player.cast(PlayerMsg::Stop);
    player.stop(None);
    drop(output);
}
