//! Error types for the offline cache synchronizer.

/// Synchronizer errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Transport failure while talking to the network.
    #[error("network error: {message}")]
    Network { message: String },

    /// Shell resources could not be staged.
    #[error("install failed: {message}")]
    Install { message: String },

    /// Reconciliation faulted; all stores were reset.
    #[error("activation failed, caches reset: {cause}")]
    Activation {
        #[source]
        cause: Box<SyncError>,
    },

    /// Cache store read/write failure.
    #[error("store error: {message}")]
    Store { message: String },

    /// A stored entry no longer matches its recorded digest.
    #[error("integrity check failed for {key}: expected {expected}, got {actual}")]
    Integrity {
        key: String,
        expected: String,
        actual: String,
    },

    /// Manifest could not be parsed or is malformed.
    #[error("invalid manifest: {message}")]
    Manifest { message: String },

    /// Deployment (manifest plus shell list) is inconsistent.
    #[error("invalid deployment: {message}")]
    Deployment { message: String },

    /// Remote endpoint returned something we could not use.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl SyncError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Config / input issues
            Self::Config { .. } => 1,
            Self::Manifest { .. } => 1,
            Self::Deployment { .. } => 1,

            // Lifecycle failures
            Self::Install { .. } => 3,
            Self::Activation { .. } => 3,

            // Storage
            Self::Store { .. } => 4,
            Self::Integrity { .. } => 4,

            // Network/transient
            Self::Network { .. } => 5,
            Self::InvalidResponse { .. } => 5,
        }
    }

    /// Whether the failure came from the network rather than local state.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub(crate) fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for synchronizer operations.
pub type SyncResult<T> = Result<T, SyncError>;
