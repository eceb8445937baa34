//! Error types for the CircleCI client.
//!
//! # Design
//! `ApiError` is the only structured error: it is produced when the server
//! answers with anything other than 200 and keeps the raw body so callers can
//! still inspect it. Everything else is local context wrapped around a source
//! error, with the context strings chosen so the failing stage can be read
//! straight off the message.

use std::fmt;

use thiserror::Error;

/// Boxed source error used by the wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Characters of the response body shown in an `ApiError` message.
pub const BODY_EXCERPT_CHARS: usize = 100;

/// A non-success response from the CircleCI API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    url: String,
    status: u16,
    body: Vec<u8>,
}

impl ApiError {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The full raw response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// At most the first [`BODY_EXCERPT_CHARS`] characters of the body.
    pub fn excerpt(&self) -> String {
        String::from_utf8_lossy(&self.body)
            .chars()
            .take(BODY_EXCERPT_CHARS)
            .collect()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circleci: {} {} '{}'", self.status, self.url, self.excerpt())
    }
}

impl std::error::Error for ApiError {}

/// Stage of response decoding that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// Response bytes to a transit value tree.
    DecodeTransit,
    /// Transit value tree to plain JSON.
    ConvertTransit,
    /// Plain JSON back to bytes.
    Marshal,
    /// JSON bytes to the typed result.
    Unmarshal,
}

impl DecodeStage {
    pub fn context(self) -> &'static str {
        match self {
            DecodeStage::DecodeTransit => "issue decoding transit",
            DecodeStage::ConvertTransit => "issue converting transit to go",
            DecodeStage::Marshal => "issue marshaling",
            DecodeStage::Unmarshal => "issue unmarshaling",
        }
    }
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context())
    }
}

#[derive(Debug, Error)]
#[error("{stage}: {source}")]
pub struct DecodeError {
    pub stage: DecodeStage,
    #[source]
    pub source: BoxError,
}

impl DecodeError {
    pub fn new(stage: DecodeStage, source: impl Into<BoxError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("creating request: {0}")]
    CreateRequest(#[source] BoxError),

    #[error("encoding request: {0}")]
    EncodeRequest(#[source] BoxError),

    #[error("performing request: {0}")]
    Request(#[source] BoxError),

    #[error("performing request: request cancelled")]
    Cancelled,

    /// The body could not be drained; the read error is passed through as-is.
    #[error(transparent)]
    ReadBody(BoxError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("issue posting: {0}")]
    Post(#[source] Box<ClientError>),

    #[error("issue getting: {0}")]
    Get(#[source] Box<ClientError>),
}

impl ClientError {
    /// The `ApiError` behind this error, looking through operation wrappers.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(e) => Some(e),
            ClientError::Post(inner) | ClientError::Get(inner) => inner.api_error(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            ClientError::Cancelled => true,
            ClientError::Post(inner) | ClientError::Get(inner) => inner.is_cancelled(),
            _ => false,
        }
    }

    /// The decode stage that failed, if any.
    pub fn decode_stage(&self) -> Option<DecodeStage> {
        match self {
            ClientError::Decode(e) => Some(e.stage),
            ClientError::Post(inner) | ClientError::Get(inner) => inner.decode_stage(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
