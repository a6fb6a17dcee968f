#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transcript contains no usable timing records")]
    NoEntries,
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}
