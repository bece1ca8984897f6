// ❗ API Errors - Everything the client core can fail with
//
// Expected failure modes (401, refresh rejection, duplicate category) are
// NOT errors: they travel back as responses / outcomes. Only transport,
// decoding and unexpected HTTP statuses end up here.

use reqwest::StatusCode;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Host unreachable, connection reset, transport timeout...
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Header name/value that cannot go on the wire (e.g. token with a newline)
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend answered with a non-2xx status
    #[error("backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Operation needs an access token and the store is empty
    #[error("no access token available")]
    MissingToken,
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}
