//! Transport error types for the chat link.

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Link error type.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Connection attempt timed out after {0} seconds")]
    ConnectTimeout(u64),

    #[error("Frame send failed: {0}")]
    SendFailed(String),

    #[error("Link closed")]
    Closed,

    #[error("Reconnect attempts exhausted after {0} retries")]
    RetriesExhausted(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LinkError::Connect("refused".into()).to_string(),
            "Connection failed: refused"
        );
        assert_eq!(
            LinkError::ConnectTimeout(10).to_string(),
            "Connection attempt timed out after 10 seconds"
        );
        assert_eq!(
            LinkError::RetriesExhausted(3).to_string(),
            "Reconnect attempts exhausted after 3 retries"
        );
    }
}
