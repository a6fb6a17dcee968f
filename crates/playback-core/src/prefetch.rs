use narrate_synthesis::{SynthesisRequest, SynthesisResponse};

use crate::scheduler::{Command, FetchPurpose};
use crate::{ChunkStatus, Error, FetchTicket, SchedulerState};

/// Keeps the next `lookahead` chunks moving from pending toward ready.
///
/// Work is requested as [`Command`]s and results are fed back in; each
/// result passes the epoch-and-bounds gate before touching the queue.
#[derive(Debug, Clone)]
pub struct PrefetchBuffer {
    lookahead: usize,
}

impl PrefetchBuffer {
    pub fn new(lookahead: usize) -> Self {
        Self { lookahead }
    }

    pub fn schedule_lookahead(
        &self,
        state: &mut SchedulerState,
        current: usize,
        voice: &str,
    ) -> Vec<Command> {
        let epoch = state.epoch();
        let mut commands = Vec::new();

        for index in current + 1..=current + self.lookahead {
            let Some(chunk) = state.queue.get_mut(index) else {
                break;
            };
            if chunk.status != ChunkStatus::Pending {
                continue;
            }

            chunk.status = ChunkStatus::Buffering;
            tracing::debug!(chunk = index, "prefetch_scheduled");
            commands.push(Command::Synthesize {
                ticket: FetchTicket { index, epoch },
                request: SynthesisRequest::new(chunk.text.clone(), voice),
                purpose: FetchPurpose::Background,
            });
        }

        commands
    }

    /// Store the synthesized references and ask for the duration. A failure
    /// marks only this chunk as errored; it is fetched again if playback
    /// reaches it.
    pub fn on_synthesized(
        &self,
        state: &mut SchedulerState,
        ticket: FetchTicket,
        result: Result<SynthesisResponse, narrate_synthesis::Error>,
    ) -> Result<Option<Command>, Error> {
        let chunk = state.chunk_mut_if_live(ticket)?;
        if chunk.status != ChunkStatus::Buffering {
            return Ok(None);
        }

        match result {
            Ok(response) => {
                chunk.audio_ref = Some(response.audio_url.clone());
                chunk.subtitle_ref = Some(response.subtitle_url);
                Ok(Some(Command::ResolveDuration {
                    ticket,
                    audio_ref: response.audio_url,
                }))
            }
            Err(error) => {
                tracing::warn!(chunk = ticket.index, %error, "prefetch_failed");
                chunk.status = ChunkStatus::Error;
                Ok(None)
            }
        }
    }

    /// Terminal step of the ready transition: duration and status are
    /// written together. A failed probe still leaves a playable chunk; its
    /// duration is picked up from the media engine once it plays.
    pub fn on_duration_resolved(
        &self,
        state: &mut SchedulerState,
        ticket: FetchTicket,
        result: Result<f64, Error>,
    ) -> Result<(), Error> {
        let chunk = state.chunk_mut_if_live(ticket)?;
        if chunk.status != ChunkStatus::Buffering || chunk.audio_ref.is_none() {
            return Ok(());
        }

        let duration = match result {
            Ok(d) if d.is_finite() && d > 0.0 => Some(d),
            Ok(d) => {
                tracing::warn!(chunk = ticket.index, duration = d, "invalid_probed_duration");
                None
            }
            Err(error) => {
                tracing::warn!(chunk = ticket.index, %error, "duration_probe_failed");
                None
            }
        };

        chunk.duration = duration;
        chunk.status = ChunkStatus::Ready;
        tracing::info!(chunk = ticket.index, ?duration, "chunk_ready");
        Ok(())
    }
}
