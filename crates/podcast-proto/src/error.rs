use thiserror::Error;

/// Why a feed fetch produced no episodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// Proxy unreachable, timed out, or answered with a non-success status.
    #[error("network error: {0}")]
    Network(String),
    /// Body is not well-formed XML, or it contains no `<item>`.
    #[error("parse error: {0}")]
    Parse(String),
}

/// The audio output refused to start (bad URL, unsupported format, dead player).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("playback failed: {0}")]
pub struct PlaybackError(pub String);

impl PlaybackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
