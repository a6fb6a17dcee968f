mod client;
mod error;
mod types;
mod voice;

pub use client::{SynthesisClient, SynthesisClientBuilder};
pub use error::*;
pub use types::*;
pub use voice::Voice;

use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Text-to-speech collaborator: turns one chunk of text into an audio
/// resource plus a word-timed transcript, and serves the transcript text.
///
/// Object-safe through the explicit [`BoxFuture`] return type so the
/// player can hold an `Arc<dyn Synthesizer>`.
pub trait Synthesizer: Send + Sync {
    fn synthesize<'a>(
        &'a self,
        request: &'a SynthesisRequest,
    ) -> BoxFuture<'a, Result<SynthesisResponse, Error>>;

    fn fetch_transcript<'a>(&'a self, subtitle_ref: &'a str) -> BoxFuture<'a, Result<String, Error>>;
}
