use thiserror::Error;

/// Errors raised by the storage layer and the input checks around it.
///
/// The recurrence engine itself never fails; only reading or writing the
/// habit database, or handing it malformed input, produces one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt habit database: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid month {0}, expected 1-12")]
    InvalidMonth(u32),
}

impl Error {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
