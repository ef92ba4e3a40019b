use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Please enter a suburb name.")]
    EmptySuburb,

    #[error("Invalid API endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("API error: {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to decode API response: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status carried by a non-200 response, if that is what failed.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            _ => None,
        }
    }
}
