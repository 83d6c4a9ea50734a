use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote catalog unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Fatal failure during {operation} after {attempts} attempt(s): {reason}")]
    Fatal {
        operation: String,
        attempts: u32,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Staging error: {0}")]
    Staging(String),

    #[error("Bridge error: {0}")]
    Bridge(BridgeError),
}

impl SyncError {
    /// Whether the error terminates the whole run.
    ///
    /// Fatal errors come from the upload step; the caller logs them and
    /// stops. A rerun re-lists both catalogs from scratch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

impl From<BridgeError> for SyncError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::RemoteUnavailable(msg) => Self::RemoteUnavailable(msg),
            BridgeError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Bridge(other),
        }
    }
}

impl From<core_runtime::Error> for SyncError {
    fn from(error: core_runtime::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
