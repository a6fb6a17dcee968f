use narrate_subtitle::{Highlighter, SubtitleTrack};

use crate::{Chunk, Error};

/// Queue generation. Bumped every time the chunk queue is replaced or
/// discarded; asynchronous results tagged with an older epoch are dropped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize,
)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Identity of an asynchronous operation: which chunk, under which queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FetchTicket {
    pub index: usize,
    pub epoch: Epoch,
}

#[derive(Debug, Default)]
pub struct SchedulerState {
    pub(crate) queue: Vec<Chunk>,
    pub(crate) current: Option<usize>,
    pub(crate) epoch: Epoch,
    pub(crate) highlight: Highlighter,
    pub(crate) subtitles: SubtitleTrack,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self) -> &[Chunk] {
        &self.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_chunk(&self) -> Option<&Chunk> {
        self.current.and_then(|i| self.queue.get(i))
    }

    pub fn current_word(&self) -> Option<usize> {
        self.highlight.current_word()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn subtitles(&self) -> &SubtitleTrack {
        &self.subtitles
    }

    pub fn ticket(&self, index: usize) -> FetchTicket {
        FetchTicket {
            index,
            epoch: self.epoch,
        }
    }

    pub fn replace_queue(&mut self, queue: Vec<Chunk>) -> Epoch {
        self.queue = queue;
        self.current = None;
        self.subtitles = SubtitleTrack::default();
        self.epoch = self.epoch.next();
        self.epoch
    }

    /// Discard the queue and invalidate everything in flight. Highlight marks
    /// are left to the caller, which owns the render sink.
    pub fn reset(&mut self) -> Epoch {
        self.replace_queue(Vec::new())
    }

    pub fn is_live(&self, ticket: FetchTicket) -> bool {
        ticket.epoch == self.epoch && ticket.index < self.queue.len()
    }

    /// Epoch-and-bounds gate for every asynchronous continuation.
    pub fn chunk_mut_if_live(&mut self, ticket: FetchTicket) -> Result<&mut Chunk, Error> {
        if !self.is_live(ticket) {
            return Err(Error::StaleResult);
        }
        self.queue.get_mut(ticket.index).ok_or(Error::StaleResult)
    }
}
