/// Failure reported by the API or the transport underneath it.
///
/// `status` is `None` when no HTTP response was received at all.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RequestError {
    pub status: Option<u16>,
    pub message: String,
}

impl RequestError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("a save request is already in flight")]
    SaveInProgress,

    #[error("invalid API path: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
}
