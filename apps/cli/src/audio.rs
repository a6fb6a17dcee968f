use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use narrate_playback_core::{DurationProbe, MediaEngine, MediaEvent, SourceId};
use narrate_synthesis::{BoxFuture, SynthesisClient};
use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error(transparent)]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Fetch(#[from] narrate_synthesis::Error),
    #[error("audio has no samples")]
    Empty,
}

/// Keeps the default output stream alive on its own thread; the stream
/// handle cannot leave the thread that opened it.
pub struct AudioOutput {
    mixer: Mixer,
    _shutdown: std::sync::mpsc::Sender<()>,
}

impl AudioOutput {
    pub fn open() -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let (shutdown_tx, shutdown_rx) = std::sync::mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("narrate-audio-output".into())
            .spawn(move || match rodio::OutputStreamBuilder::open_default_stream() {
                Ok(mut stream) => {
                    stream.log_on_drop(false);
                    let _ = ready_tx.send(Ok(stream.mixer().clone()));
                    let _ = shutdown_rx.recv();
                }
                Err(error) => {
                    let _ = ready_tx.send(Err(error.to_string()));
                }
            })?;

        let mixer = ready_rx
            .recv()
            .map_err(|e| AudioError::Output(e.to_string()))?
            .map_err(AudioError::Output)?;

        Ok(Self {
            mixer,
            _shutdown: shutdown_tx,
        })
    }

    pub fn mixer(&self) -> Mixer {
        self.mixer.clone()
    }
}

/// Chunks kept downloaded at once. Older entries are evicted first.
const MAX_CACHED_CHUNKS: usize = 8;

#[derive(Default)]
struct CacheInner {
    session: u64,
    entries: VecDeque<(String, Arc<Vec<u8>>)>,
}

/// Downloaded audio shared between the duration probe and the engine, so a
/// prefetched chunk is not downloaded twice. Cleared whenever the engine's
/// source is cleared; downloads started before that are not kept.
#[derive(Clone, Default)]
pub struct AudioCache(Arc<Mutex<CacheInner>>);

impl AudioCache {
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn session(&self) -> u64 {
        self.lock().session
    }

    fn insert(&self, session: u64, audio_ref: &str, bytes: Arc<Vec<u8>>) {
        let mut inner = self.lock();
        if inner.session != session {
            tracing::debug!(audio_ref, "stale_audio_dropped");
            return;
        }
        inner.entries.retain(|(key, _)| key != audio_ref);
        inner.entries.push_back((audio_ref.to_string(), bytes));
        while inner.entries.len() > MAX_CACHED_CHUNKS {
            inner.entries.pop_front();
        }
    }

    fn take(&self, audio_ref: &str) -> Option<Arc<Vec<u8>>> {
        let mut inner = self.lock();
        let position = inner.entries.iter().position(|(key, _)| key == audio_ref)?;
        inner.entries.remove(position).map(|(_, bytes)| bytes)
    }

    fn clear(&self) {
        let mut inner = self.lock();
        inner.session += 1;
        inner.entries.clear();
    }

    async fn fetch(
        &self,
        client: &SynthesisClient,
        audio_ref: &str,
    ) -> Result<Arc<Vec<u8>>, AudioError> {
        if let Some(bytes) = self.take(audio_ref) {
            return Ok(bytes);
        }
        Ok(Arc::new(client.fetch_bytes(audio_ref).await?))
    }
}

fn decoder(bytes: &Arc<Vec<u8>>) -> Result<Decoder<Cursor<Vec<u8>>>, AudioError> {
    Ok(Decoder::new(Cursor::new(bytes.as_ref().clone()))?)
}

/// Length in seconds. Uses the container's declared duration when present,
/// otherwise decodes and counts samples.
fn measure(bytes: &Arc<Vec<u8>>) -> Result<f64, AudioError> {
    let source = decoder(bytes)?;
    if let Some(total) = source.total_duration() {
        return Ok(total.as_secs_f64());
    }

    let rate = f64::from(source.sample_rate()) * f64::from(source.channels());
    let samples = source.count() as f64;
    if rate <= 0.0 || samples == 0.0 {
        return Err(AudioError::Empty);
    }
    Ok(samples / rate)
}

pub struct HttpDurationProbe {
    client: SynthesisClient,
    cache: AudioCache,
}

impl HttpDurationProbe {
    pub fn new(client: SynthesisClient, cache: AudioCache) -> Self {
        Self { client, cache }
    }

    async fn resolve(&self, audio_ref: &str) -> Result<f64, AudioError> {
        let session = self.cache.session();
        let bytes = self.cache.fetch(&self.client, audio_ref).await?;
        let measured = tokio::task::spawn_blocking({
            let bytes = bytes.clone();
            move || measure(&bytes)
        })
        .await
        .map_err(|e| AudioError::Output(e.to_string()))??;

        self.cache.insert(session, audio_ref, bytes);
        Ok(measured)
    }
}

impl DurationProbe for HttpDurationProbe {
    fn probe<'a>(
        &'a self,
        audio_ref: &'a str,
    ) -> BoxFuture<'a, Result<f64, narrate_playback_core::Error>> {
        Box::pin(async move {
            self.resolve(audio_ref)
                .await
                .map_err(|e| narrate_playback_core::Error::Probe(e.to_string()))
        })
    }
}

#[derive(Default)]
struct Deck {
    generation: u64,
    sink: Option<Sink>,
    duration: Option<f64>,
    rate: f32,
    playing: bool,
    ended: bool,
}

/// Media engine over a rodio sink. Loading happens on the runtime and is
/// reported through the event channel; [`RodioEngine::poll`] produces time
/// updates and end-of-media.
#[derive(Clone)]
pub struct RodioEngine {
    deck: Arc<Mutex<Deck>>,
    mixer: Mixer,
    client: SynthesisClient,
    cache: AudioCache,
    events: mpsc::UnboundedSender<MediaEvent>,
    handle: Handle,
}

impl RodioEngine {
    pub fn new(
        mixer: Mixer,
        client: SynthesisClient,
        cache: AudioCache,
        events: mpsc::UnboundedSender<MediaEvent>,
    ) -> Self {
        Self {
            deck: Arc::new(Mutex::new(Deck {
                rate: 1.0,
                ..Default::default()
            })),
            mixer,
            client,
            cache,
            events,
            handle: Handle::current(),
        }
    }

    fn deck(&self) -> MutexGuard<'_, Deck> {
        self.deck.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn poll(&self) -> Option<MediaEvent> {
        let mut deck = self.deck();
        if !deck.playing || deck.ended {
            return None;
        }
        let sink = deck.sink.as_ref()?;

        if sink.empty() {
            deck.ended = true;
            deck.playing = false;
            return Some(MediaEvent::Ended);
        }
        Some(MediaEvent::TimeUpdate {
            current_time: sink.get_pos().as_secs_f64(),
        })
    }

    async fn load(self, generation: u64, audio_ref: String) -> Result<(), AudioError> {
        let bytes = self.cache.fetch(&self.client, &audio_ref).await?;
        let (source, duration) = tokio::task::spawn_blocking(move || {
            let duration = measure(&bytes)?;
            Ok::<_, AudioError>((decoder(&bytes)?, duration))
        })
        .await
        .map_err(|e| AudioError::Output(e.to_string()))??;

        {
            let mut deck = self.deck();
            if deck.generation != generation {
                tracing::debug!(audio_ref, "stale_audio_load");
                return Ok(());
            }
            let sink = Sink::connect_new(&self.mixer);
            sink.pause();
            sink.set_speed(deck.rate);
            sink.append(source);
            deck.sink = Some(sink);
            deck.duration = Some(duration);

            let source = SourceId::new(generation);
            let _ = self.events.send(MediaEvent::MetadataLoaded { source, duration });
            let _ = self.events.send(MediaEvent::CanPlay { source });
        }

        Ok(())
    }
}

impl MediaEngine for RodioEngine {
    fn set_source(&mut self, audio_ref: &str) -> SourceId {
        let generation = {
            let mut deck = self.deck();
            deck.generation += 1;
            deck.sink = None;
            deck.duration = None;
            deck.playing = false;
            deck.ended = false;
            deck.generation
        };

        let engine = self.clone();
        let audio_ref = audio_ref.to_string();
        self.handle.spawn(async move {
            if let Err(error) = engine.load(generation, audio_ref.clone()).await {
                tracing::error!(audio_ref, %error, "audio_load_failed");
            }
        });
        SourceId::new(generation)
    }

    fn clear_source(&mut self) {
        {
            let mut deck = self.deck();
            deck.generation += 1;
            deck.sink = None;
            deck.duration = None;
            deck.playing = false;
        }
        self.cache.clear();
    }

    fn current_time(&self) -> f64 {
        self.deck()
            .sink
            .as_ref()
            .map_or(0.0, |s| s.get_pos().as_secs_f64())
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut deck = self.deck();
        let Some(sink) = deck.sink.as_ref() else {
            return;
        };
        if let Err(error) = sink.try_seek(Duration::from_secs_f64(seconds.max(0.0))) {
            tracing::warn!(?error, seconds, "seek_failed");
        }
        deck.ended = false;
    }

    fn duration(&self) -> Option<f64> {
        self.deck().duration
    }

    fn set_playback_rate(&mut self, rate: f32) {
        let mut deck = self.deck();
        deck.rate = rate;
        if let Some(sink) = deck.sink.as_ref() {
            sink.set_speed(rate);
        }
    }

    fn play(&mut self) {
        let mut deck = self.deck();
        if let Some(sink) = deck.sink.as_ref() {
            sink.play();
            deck.playing = true;
        }
    }

    fn pause(&mut self) {
        let mut deck = self.deck();
        if let Some(sink) = deck.sink.as_ref() {
            sink.pause();
        }
        deck.playing = false;
    }
}
