pub mod actors;

mod chunk;
mod config;
mod error;
mod events;
mod media;
mod prefetch;
mod progress;
mod runtime;
mod scheduler;
mod state;

#[cfg(test)]
mod testing;

pub use chunk::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use media::*;
pub use prefetch::PrefetchBuffer;
pub use progress::*;
pub use runtime::*;
pub use scheduler::{
    Command, Completion, FetchPurpose, LoadId, PlaybackScheduler, PlayerSnapshot,
};
pub use state::*;
