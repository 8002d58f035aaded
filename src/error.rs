#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("bridge closed")]
    Closed,
}

impl From<reqwest::Error> for RealtimeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for RealtimeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RealtimeError>;
