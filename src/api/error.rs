use thiserror::Error;

/// Uniform classification for every gateway call. Call sites branch on the
/// kind instead of unpicking transport errors themselves.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure or timeout: the request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The gateway answered with a non-2xx status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// Missing or rejected bearer credential. The shell maps this to a
    /// forced logout.
    #[error("unauthorized")]
    Unauthorized,
    /// A response arrived but its body was not what the contract promises.
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// The body's `error` field for server rejections, a generic text for
    /// everything else. What checkout surfaces per failed line item.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Network(_) | ApiError::Decode(_) => "Purchase failed".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            // Timeouts, refused connections and malformed requests all land
            // here: no response ever arrived.
            ApiError::Network(err.to_string())
        }
    }
}
