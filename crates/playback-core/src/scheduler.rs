use std::sync::Arc;
use std::time::Duration;

use narrate_segmenter::{segment, tokenize, word_count};
use narrate_subtitle::{RenderSink, SubtitleTrack};
use narrate_synthesis::{SynthesisRequest, SynthesisResponse};

use crate::config::clamp_rate;
use crate::progress::{global_progress, resolve_seek, total_known_duration};
use crate::{
    ChunkStatus, Epoch, Error, FetchTicket, MediaEngine, MediaEvent, PlayerConfig,
    PlayerErrorEvent, PlayerLifecycleEvent, PlayerProgressEvent, PlayerRuntime, PlayerState,
    PrefetchBuffer, Progress, SchedulerState, SourceId, build_queue,
};

/// Identity of one `load_chunk` call. Seeking or advancing starts a new load,
/// which retires the retries and foreground fetch of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct LoadId(u64);

impl LoadId {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchPurpose {
    /// The user is waiting on this chunk.
    Foreground { load: LoadId, seek: Option<f64> },
    Background,
}

/// Side effects requested by the scheduler. The caller performs them
/// asynchronously and reports back with the matching [`Completion`].
#[derive(Debug)]
pub enum Command {
    Synthesize {
        ticket: FetchTicket,
        request: SynthesisRequest,
        purpose: FetchPurpose,
    },
    ResolveDuration {
        ticket: FetchTicket,
        audio_ref: String,
    },
    FetchSubtitles {
        ticket: FetchTicket,
        load: LoadId,
        subtitle_ref: String,
    },
    RetryLoad {
        ticket: FetchTicket,
        load: LoadId,
        seek: Option<f64>,
        attempt: u32,
        after: Duration,
    },
}

#[derive(Debug)]
pub enum Completion {
    Synthesized {
        ticket: FetchTicket,
        purpose: FetchPurpose,
        result: Result<SynthesisResponse, narrate_synthesis::Error>,
    },
    DurationResolved {
        ticket: FetchTicket,
        result: Result<f64, Error>,
    },
    SubtitlesFetched {
        ticket: FetchTicket,
        load: LoadId,
        result: Result<String, narrate_synthesis::Error>,
    },
    RetryDue {
        ticket: FetchTicket,
        load: LoadId,
        seek: Option<f64>,
        attempt: u32,
    },
}

impl Completion {
    pub fn ticket(&self) -> FetchTicket {
        match self {
            Completion::Synthesized { ticket, .. }
            | Completion::DurationResolved { ticket, .. }
            | Completion::SubtitlesFetched { ticket, .. }
            | Completion::RetryDue { ticket, .. } => *ticket,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlayerSnapshot {
    pub session_id: Option<String>,
    pub state: PlayerState,
    pub epoch: Epoch,
    pub current_chunk: Option<usize>,
    pub current_word: Option<usize>,
    pub chunks: Vec<ChunkStatus>,
    pub progress: Progress,
    pub playback_rate: f32,
    pub voice: String,
}

struct Session {
    id: String,
    span: tracing::Span,
}

/// Source handed to the media engine, waiting for `CanPlay`.
#[derive(Debug, Clone, Copy)]
struct PendingStart {
    source: SourceId,
    seek: Option<f64>,
}

/// Playback state machine: `Idle -> Loading -> Playing <-> Paused ->
/// Finished`, with `Error` on a failed foreground fetch and `Idle` on stop.
///
/// Performs no IO. Media and render collaborators are passed in per call;
/// everything asynchronous is returned as [`Command`]s.
pub struct PlaybackScheduler {
    config: PlayerConfig,
    runtime: Arc<dyn PlayerRuntime>,
    prefetch: PrefetchBuffer,
    state: SchedulerState,
    player_state: PlayerState,
    session: Option<Session>,
    load: LoadId,
    source: Option<SourceId>,
    pending_start: Option<PendingStart>,
    local_time: f64,
}

impl PlaybackScheduler {
    pub fn new(mut config: PlayerConfig, runtime: Arc<dyn PlayerRuntime>) -> Self {
        config.playback_rate = clamp_rate(config.playback_rate);
        Self {
            prefetch: PrefetchBuffer::new(config.lookahead),
            config,
            runtime,
            state: SchedulerState::new(),
            player_state: PlayerState::Idle,
            session: None,
            load: LoadId::default(),
            source: None,
            pending_start: None,
            local_time: 0.0,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn player_state(&self) -> PlayerState {
        self.player_state
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn span(&self) -> tracing::Span {
        self.session
            .as_ref()
            .map(|s| s.span.clone())
            .unwrap_or_else(tracing::Span::none)
    }

    pub fn progress(&self) -> Progress {
        global_progress(&self.state.queue, self.state.current, self.local_time)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            session_id: self.session_id().map(str::to_string),
            state: self.player_state,
            epoch: self.state.epoch(),
            current_chunk: self.state.current,
            current_word: self.state.current_word(),
            chunks: self.state.queue.iter().map(|c| c.status).collect(),
            progress: self.progress(),
            playback_rate: self.config.playback_rate,
            voice: self.config.voice.clone(),
        }
    }

    pub fn start(
        &mut self,
        text: &str,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Result<Vec<Command>, Error> {
        if !self.player_state.is_idle_like() {
            return Err(Error::AlreadyActive);
        }

        let text = text.trim();
        let segments = segment(text, &self.config.policy());
        if segments.is_empty() {
            self.runtime.emit_error(PlayerErrorEvent::Validation {
                message: Error::EmptyText.to_string(),
            });
            return Err(Error::EmptyText);
        }

        let words = word_count(text);
        let chunks = segments.len();

        self.state.highlight.clear(sink);
        sink.render_words(&tokenize(text));
        self.state.replace_queue(build_queue(segments));

        let id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("session", session_id = %id);
        span.in_scope(|| tracing::info!(chunks, words, "session_started"));
        self.session = Some(Session {
            id: id.clone(),
            span,
        });

        self.runtime.emit_lifecycle(PlayerLifecycleEvent::Started {
            session_id: id,
            chunks,
            words,
        });

        Ok(self.load_chunk(0, None, media, sink))
    }

    pub fn pause(&mut self, media: &mut dyn MediaEngine) {
        if self.player_state == PlayerState::Playing {
            media.pause();
            self.set_player_state(PlayerState::Paused);
        }
    }

    pub fn resume(&mut self, media: &mut dyn MediaEngine) {
        if self.player_state == PlayerState::Paused {
            media.play();
            self.set_player_state(PlayerState::Playing);
        }
    }

    pub fn stop(&mut self, media: &mut dyn MediaEngine, sink: &mut dyn RenderSink) {
        let span = self.span();
        let _guard = span.enter();

        media.pause();
        media.clear_source();
        self.teardown(sink);
        self.set_player_state(PlayerState::Idle);
        self.session = None;
        tracing::info!("session_stopped");
    }

    /// Seek on the global timeline. Targets past the known timeline are
    /// ignored.
    pub fn seek(
        &mut self,
        target: f64,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        let span = self.span();
        let _guard = span.enter();

        let Some(current) = self.state.current else {
            return Vec::new();
        };
        let Some(seek) = resolve_seek(&self.state.queue, target) else {
            tracing::debug!(target, "seek_out_of_range");
            return Vec::new();
        };

        if seek.index == current && self.is_on_air() {
            media.set_current_time(seek.offset);
            self.local_time = seek.offset;
            self.refresh_highlight(sink);
            self.emit_position();
            return Vec::new();
        }

        tracing::info!(chunk = seek.index, offset = seek.offset, "seek_across_chunks");
        media.pause();
        self.load_chunk(seek.index, Some(seek.offset), media, sink)
    }

    pub fn seek_fraction(
        &mut self,
        fraction: f64,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        let total = total_known_duration(&self.state.queue);
        if self.state.current.is_none() || total <= 0.0 || !fraction.is_finite() {
            return Vec::new();
        }
        self.seek(fraction.clamp(0.0, 1.0) * total, media, sink)
    }

    /// Move within the current chunk, clamped to its bounds.
    pub fn nudge(&mut self, delta: f64, media: &mut dyn MediaEngine, sink: &mut dyn RenderSink) {
        if !self.is_on_air() || !delta.is_finite() {
            return;
        }
        let Some(duration) = media.duration() else {
            return;
        };

        let target = (media.current_time() + delta).clamp(0.0, duration);
        media.set_current_time(target);
        self.local_time = target;
        self.refresh_highlight(sink);
        self.emit_position();
    }

    pub fn set_playback_rate(&mut self, rate: f32, media: &mut dyn MediaEngine) -> f32 {
        let rate = clamp_rate(rate);
        self.config.playback_rate = rate;
        if self.state.current.is_some() {
            media.set_playback_rate(rate);
        }
        rate
    }

    /// Applies to chunks synthesized from now on.
    pub fn set_voice(&mut self, voice: impl Into<String>) {
        self.config.voice = voice.into();
    }

    pub fn on_media_event(
        &mut self,
        event: MediaEvent,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        let span = self.span();
        let _guard = span.enter();

        match event {
            MediaEvent::MetadataLoaded { source, duration } => {
                if self.source == Some(source) {
                    self.capture_duration(duration);
                }
                Vec::new()
            }
            MediaEvent::CanPlay { source } => {
                let Some(pending) = self.pending_start else {
                    return Vec::new();
                };
                if pending.source != source {
                    tracing::debug!(source = source.value(), "stale_can_play_ignored");
                    return Vec::new();
                }
                self.pending_start = None;
                self.local_time = pending.seek.unwrap_or(0.0);
                if let Some(seek) = pending.seek {
                    media.set_current_time(seek);
                }
                media.play();
                self.set_player_state(PlayerState::Playing);
                self.emit_position();
                Vec::new()
            }
            MediaEvent::TimeUpdate { current_time } => {
                if self.is_on_air() {
                    self.local_time = current_time;
                    self.refresh_highlight(sink);
                    self.emit_position();
                }
                Vec::new()
            }
            MediaEvent::Played => {
                if self.is_on_air() && self.player_state == PlayerState::Paused {
                    self.set_player_state(PlayerState::Playing);
                }
                Vec::new()
            }
            MediaEvent::Paused => {
                if !self.is_on_air() || self.player_state != PlayerState::Playing {
                    return Vec::new();
                }
                let at_end = media
                    .duration()
                    .is_some_and(|duration| media.current_time() >= duration);
                if at_end {
                    return self.on_chunk_ended(media, sink);
                }
                self.set_player_state(PlayerState::Paused);
                Vec::new()
            }
            MediaEvent::Ended => {
                if !self.is_on_air() {
                    return Vec::new();
                }
                self.on_chunk_ended(media, sink)
            }
        }
    }

    pub fn on_completion(
        &mut self,
        completion: Completion,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        let span = self.span();
        let _guard = span.enter();

        let ticket = completion.ticket();
        if !self.state.is_live(ticket) {
            tracing::debug!(chunk = ticket.index, epoch = ticket.epoch.value(), "stale_result_ignored");
            return Vec::new();
        }

        match completion {
            Completion::Synthesized {
                ticket,
                purpose: FetchPurpose::Foreground { load, seek },
                result,
            } if self.is_awaiting_fetch(load, ticket.index) => {
                self.on_foreground_fetched(ticket.index, seek, result, media, sink)
            }
            Completion::Synthesized { ticket, result, .. } => {
                match self.prefetch.on_synthesized(&mut self.state, ticket, result) {
                    Ok(command) => command.into_iter().collect(),
                    Err(error) => {
                        tracing::debug!(%error, "prefetch_result_dropped");
                        Vec::new()
                    }
                }
            }
            Completion::DurationResolved { ticket, result } => {
                if let Err(error) = self
                    .prefetch
                    .on_duration_resolved(&mut self.state, ticket, result)
                {
                    tracing::debug!(%error, "duration_result_dropped");
                }
                Vec::new()
            }
            Completion::SubtitlesFetched {
                ticket,
                load,
                result,
            } => {
                self.on_subtitles(ticket, load, result, sink);
                Vec::new()
            }
            Completion::RetryDue {
                ticket,
                load,
                seek,
                attempt,
            } => {
                if load != self.load || self.state.current != Some(ticket.index) {
                    tracing::debug!(chunk = ticket.index, "retry_superseded");
                    return Vec::new();
                }
                self.try_load(ticket.index, seek, attempt, media, sink)
            }
        }
    }

    fn load_chunk(
        &mut self,
        index: usize,
        seek: Option<f64>,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        self.load = self.load.next();
        self.pending_start = None;
        self.try_load(index, seek, 0, media, sink)
    }

    fn try_load(
        &mut self,
        index: usize,
        seek: Option<f64>,
        attempt: u32,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        self.state.highlight.clear(sink);
        self.state.subtitles = SubtitleTrack::default();
        self.source = None;
        self.local_time = 0.0;

        let total = self.state.queue.len();
        let Some(chunk) = self.state.queue.get(index) else {
            self.finish(media, sink);
            return Vec::new();
        };
        let status = chunk.status;
        let number = chunk.number();
        let range = chunk.word_range();
        let playable = chunk.is_playable();

        self.state.current = Some(index);
        self.set_player_state(PlayerState::Loading);
        let ticket = self.state.ticket(index);
        let session_id = self.session_id().unwrap_or_default().to_string();

        if status == ChunkStatus::Buffering {
            let exhausted = self
                .config
                .max_buffer_polls
                .is_some_and(|max| attempt >= max);
            if !exhausted {
                tracing::debug!(chunk = index, attempt, "waiting_for_buffer");
                self.runtime
                    .emit_progress(PlayerProgressEvent::WaitingForBuffer {
                        session_id,
                        chunk: number,
                        chunks: total,
                    });
                return vec![Command::RetryLoad {
                    ticket,
                    load: self.load,
                    seek,
                    attempt: attempt + 1,
                    after: self.config.buffer_poll(),
                }];
            }
            tracing::warn!(chunk = index, attempt, "buffer_wait_exhausted");
        }

        self.state.highlight.focus_chunk(sink, range.clone());
        self.runtime
            .emit_lifecycle(PlayerLifecycleEvent::ChunkFocused {
                session_id: session_id.clone(),
                index,
                start_word: *range.start(),
                end_word: *range.end(),
            });
        self.runtime.emit_progress(PlayerProgressEvent::Generating {
            session_id,
            chunk: number,
            chunks: total,
        });

        if playable {
            return self.begin_playback(index, seek, media);
        }

        let chunk = &mut self.state.queue[index];
        chunk.status = ChunkStatus::Buffering;
        tracing::info!(chunk = index, "foreground_fetch");
        vec![Command::Synthesize {
            ticket,
            request: SynthesisRequest::new(chunk.text.clone(), self.config.voice.as_str()),
            purpose: FetchPurpose::Foreground {
                load: self.load,
                seek,
            },
        }]
    }

    /// Hand the chunk to the media engine, then fetch its transcript and
    /// top up the lookahead window. Playback itself starts on `CanPlay`.
    fn begin_playback(
        &mut self,
        index: usize,
        seek: Option<f64>,
        media: &mut dyn MediaEngine,
    ) -> Vec<Command> {
        let Some(chunk) = self.state.queue.get(index) else {
            return Vec::new();
        };
        let Some(audio_ref) = chunk.audio_ref.clone() else {
            return Vec::new();
        };
        let subtitle_ref = chunk.subtitle_ref.clone();

        let source = media.set_source(&audio_ref);
        media.set_playback_rate(self.config.playback_rate);
        self.source = Some(source);
        self.pending_start = Some(PendingStart { source, seek });

        let ticket = self.state.ticket(index);
        let mut commands = Vec::new();
        if let Some(subtitle_ref) = subtitle_ref {
            commands.push(Command::FetchSubtitles {
                ticket,
                load: self.load,
                subtitle_ref,
            });
        }
        commands.extend(
            self.prefetch
                .schedule_lookahead(&mut self.state, index, &self.config.voice),
        );
        commands
    }

    fn on_foreground_fetched(
        &mut self,
        index: usize,
        seek: Option<f64>,
        result: Result<SynthesisResponse, narrate_synthesis::Error>,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        match result {
            Ok(response) => {
                let chunk = &mut self.state.queue[index];
                chunk.audio_ref = Some(response.audio_url);
                chunk.subtitle_ref = Some(response.subtitle_url);
                chunk.status = ChunkStatus::Ready;
                tracing::info!(chunk = index, "chunk_ready");
                self.begin_playback(index, seek, media)
            }
            Err(source) => {
                let chunk_number = self.state.queue[index].number();
                self.fail(
                    Error::Fetch {
                        chunk_number,
                        source,
                    },
                    media,
                    sink,
                );
                Vec::new()
            }
        }
    }

    fn on_subtitles(
        &mut self,
        ticket: FetchTicket,
        load: LoadId,
        result: Result<String, narrate_synthesis::Error>,
        sink: &mut dyn RenderSink,
    ) {
        if load != self.load || self.state.current != Some(ticket.index) {
            tracing::debug!(chunk = ticket.index, "subtitles_superseded");
            return;
        }
        let offset = self.state.queue[ticket.index].start_word;

        let track = match result {
            Ok(content) => match narrate_subtitle::try_parse(&content, offset) {
                Ok(track) => track,
                Err(error) => {
                    let error = Error::SubtitleParse(error);
                    tracing::warn!(chunk = ticket.index, %error, "subtitle_parse_failed");
                    SubtitleTrack::default()
                }
            },
            Err(error) => {
                tracing::warn!(chunk = ticket.index, %error, "subtitle_fetch_failed");
                SubtitleTrack::default()
            }
        };

        tracing::debug!(chunk = ticket.index, entries = track.len(), "subtitles_loaded");
        self.state.subtitles = track;
        if self.is_on_air() {
            self.refresh_highlight(sink);
        }
    }

    fn on_chunk_ended(
        &mut self,
        media: &mut dyn MediaEngine,
        sink: &mut dyn RenderSink,
    ) -> Vec<Command> {
        let Some(current) = self.state.current else {
            return Vec::new();
        };
        tracing::info!(chunk = current, "chunk_ended");

        if current + 1 < self.state.queue.len() {
            self.load_chunk(current + 1, None, media, sink)
        } else {
            self.finish(media, sink);
            Vec::new()
        }
    }

    fn finish(&mut self, media: &mut dyn MediaEngine, sink: &mut dyn RenderSink) {
        media.clear_source();
        self.teardown(sink);
        self.set_player_state(PlayerState::Finished);
        tracing::info!("session_finished");
        self.session = None;
    }

    fn fail(&mut self, error: Error, media: &mut dyn MediaEngine, sink: &mut dyn RenderSink) {
        tracing::error!(%error, "foreground_load_failed");

        let chunk_number = match &error {
            Error::Fetch { chunk_number, .. } => *chunk_number,
            _ => self.state.current.map_or(0, |i| i + 1),
        };
        self.runtime.emit_error(PlayerErrorEvent::ChunkFailed {
            session_id: self.session_id().unwrap_or_default().to_string(),
            chunk_number,
            message: error.to_string(),
        });

        media.pause();
        media.clear_source();
        self.teardown(sink);
        self.set_player_state(PlayerState::Error);
        self.session = None;
    }

    fn teardown(&mut self, sink: &mut dyn RenderSink) {
        self.state.reset();
        self.state.highlight.clear(sink);
        self.load = self.load.next();
        self.source = None;
        self.pending_start = None;
        self.local_time = 0.0;
    }

    fn capture_duration(&mut self, duration: f64) {
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        let Some(chunk) = self
            .state
            .current
            .and_then(|index| self.state.queue.get_mut(index))
        else {
            return;
        };
        if chunk.status == ChunkStatus::Ready && chunk.duration.is_none() {
            chunk.duration = Some(duration);
            tracing::debug!(chunk = chunk.index, duration, "duration_captured");
        }
    }

    fn refresh_highlight(&mut self, sink: &mut dyn RenderSink) {
        let active = self.state.subtitles.active_word(self.local_time);
        self.state.highlight.apply(sink, active);
    }

    fn emit_position(&self) {
        let (Some(session), Some(chunk)) = (&self.session, self.state.current) else {
            return;
        };
        self.runtime.emit_progress(PlayerProgressEvent::Position {
            session_id: session.id.clone(),
            progress: self.progress(),
            chunk,
            word: self.state.current_word(),
        });
    }

    /// A chunk's audio is loaded and playback has started at least once.
    fn is_on_air(&self) -> bool {
        self.pending_start.is_none()
            && matches!(self.player_state, PlayerState::Playing | PlayerState::Paused)
    }

    fn is_awaiting_fetch(&self, load: LoadId, index: usize) -> bool {
        load == self.load
            && self.state.current == Some(index)
            && self.player_state == PlayerState::Loading
            && self.pending_start.is_none()
    }

    fn set_player_state(&mut self, next: PlayerState) {
        if self.player_state == next {
            return;
        }
        tracing::info!(from = %self.player_state, to = %next, "state_changed");
        self.player_state = next;
        self.runtime
            .emit_lifecycle(PlayerLifecycleEvent::StateChanged {
                session_id: self.session_id().map(str::to_string),
                state: next,
                controls: next.controls(),
            });
    }
}
