use axum::http::StatusCode;

/// Transport-level failure of a timed request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("{message}")]
    Network { message: String },
}

impl FetchFailure {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }

    /// Error name reported in synthesized envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "TimeoutError",
            Self::Network { .. } => "FetchError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Network { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Terminal outcome of a rejected or failed summary request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizeError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Insufficient credits")]
    InsufficientCredit { credits: i64 },

    #[error("Invalid Youtube Video ID")]
    InvalidInput { input: String },

    #[error("transcript fetch failed: {message}")]
    Transcript { message: String },

    #[error("summary generation failed: {message}")]
    Generation { message: String },

    #[error("Error Creating Summary: {message}")]
    Persist { message: String },
}

impl SummarizeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InsufficientCredit { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Transcript { .. } | Self::Generation { .. } | Self::Persist { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
