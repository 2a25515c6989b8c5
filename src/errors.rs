use thiserror::Error;

/// Error taxonomy for the forwarding engine.
///
/// Expected "nothing matched / nothing new" outcomes are empty collections,
/// never errors. These variants cover the genuinely fallible surfaces:
/// configuration loading, transport I/O and snapshot persistence.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),
}

pub type RelayResult<T> = Result<T, RelayError>;
