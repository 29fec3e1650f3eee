use serde_json::Error as JsonError;
use std::fmt;

#[derive(Debug)]
pub enum SummaryError {
    NetworkError(String),
    ParseError(String),
    AuthenticationError(String),
    RateLimitError(String),
    ApiError(String),
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError(msg) => write!(f, "Network error: {}", msg),
            Self::ParseError(msg) => write!(f, "Parse error: {}", msg),
            Self::AuthenticationError(msg) => write!(f, "Authentication error: {}", msg),
            Self::RateLimitError(msg) => write!(f, "Rate limit error: {}", msg),
            Self::ApiError(msg) => write!(f, "API error: {}", msg),
        }
    }
}

impl std::error::Error for SummaryError {}

impl From<JsonError> for SummaryError {
    fn from(error: JsonError) -> Self {
        SummaryError::ParseError(format!("JSON serialization error: {}", error))
    }
}
