use thiserror::Error;

/// Errors produced by the StatBank client and its reshaping helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument has the wrong shape (e.g. a list field given a scalar).
    #[error("{0}")]
    InvalidArgument(String),

    /// A dataset whose declared sizes do not agree with its values.
    #[error("inconsistent dataset shape: {0}")]
    DataShape(String),

    /// A subject/table node carrying neither `description` nor `text`.
    #[error("hierarchy node '{id}' has neither a description nor a text field")]
    MissingText { id: String },

    /// Non-success response or network failure. `message` is passed through as received.
    #[error("{}", describe_transport(.status, .message))]
    Transport { status: Option<u16>, message: String },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn describe_transport(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("statbank api error (HTTP {}): {}", code, message),
        None => format!("statbank request failed: {}", message),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
