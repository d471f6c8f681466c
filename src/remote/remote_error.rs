use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Transport failure or an unexpected status from the service.
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    /// The service answered but holds nothing for the request.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Unavailable(e.to_string())
        }
    }
}
