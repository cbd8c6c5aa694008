use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing X-Line-Signature header")]
    MissingSignature,

    #[error("webhook signature does not match")]
    InvalidSignature,

    #[error("malformed webhook payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("LINE API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("LINE API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
