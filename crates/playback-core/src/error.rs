#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("text cannot be empty")]
    EmptyText,
    #[error("playback is already active")]
    AlreadyActive,
    #[error("failed to fetch chunk {chunk_number}: {source}")]
    Fetch {
        chunk_number: usize,
        #[source]
        source: narrate_synthesis::Error,
    },
    #[error(transparent)]
    SubtitleParse(#[from] narrate_subtitle::Error),
    #[error("stale result ignored")]
    StaleResult,
    #[error("duration probe failed: {0}")]
    Probe(String),
    #[error(transparent)]
    Config(#[from] envy::Error),
    #[error("failed to spawn actor: {0}")]
    Spawn(#[from] ractor::SpawnErr),
}

pub type Result<T> = std::result::Result<T, Error>;
