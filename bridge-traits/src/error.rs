use thiserror::Error;

/// Errors raised by catalog and host bridges.
///
/// Only [`BridgeError::TransientUpload`] is considered retry-survivable; every
/// other variant is surfaced to the caller as-is.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Remote catalog unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient upload failure: {reason}")]
    TransientUpload { reason: String },

    #[error("Permanent upload failure: {reason}")]
    PermanentUpload { reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientUpload { .. })
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_upload_is_transient() {
        assert!(BridgeError::TransientUpload {
            reason: "rate limited".to_string()
        }
        .is_transient());

        assert!(!BridgeError::PermanentUpload {
            reason: "bad format".to_string()
        }
        .is_transient());
        assert!(!BridgeError::RemoteUnavailable("down".to_string()).is_transient());
        assert!(!BridgeError::NotFound("a.jpg".to_string()).is_transient());
        assert!(!BridgeError::Io(std::io::Error::other("disk")).is_transient());
    }

    #[test]
    fn test_error_display() {
        let error = BridgeError::TransientUpload {
            reason: "429 Too Many Requests".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transient upload failure: 429 Too Many Requests"
        );
    }
}
