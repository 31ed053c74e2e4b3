/// Core error type for the translation pipeline.
///
/// Adapter crates should map their specific errors into this type so the
/// pipeline can handle failures consistently (chat-visible vs logged only).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The module is disabled for a channel, or the process environment is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// An invalid engine, model kind, language or key was requested.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The translation provider failed or returned an unexpected payload.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors that callers may surface in chat when the channel runs in debug mode.
    pub fn is_chat_visible(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Backend(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
