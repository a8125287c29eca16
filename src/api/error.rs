use thiserror::Error;

/// Failure taxonomy for the BlueOn API. Every variant is converted into a
/// `NetworkEvent` at the call site; nothing propagates uncaught to the UI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    AuthRequired,
    /// Blank outgoing text. Raised before any request is issued.
    #[error("message text is empty")]
    EmptyInput,
    #[error("requested record not found")]
    NotFound,
    #[error("request rejected: {0}")]
    RequestFailed(String),
    /// Non-JSON body where JSON was expected. Treated like a failed request
    /// by the UI, kept distinct for logging.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
