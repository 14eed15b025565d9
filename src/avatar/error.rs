//! Error types for avatar fetching and saving
//!
//! Each variant maps one way a single avatar can fail. None of them abort a
//! batch; the caller logs the error and moves on to the next avatar.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AvatarError {
    /// The identifying key was empty
    #[error("Avatar key cannot be empty")]
    EmptyKey,

    /// The configured service URL could not be parsed
    #[error("Invalid service URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// HTTP client construction failed
    #[error("Failed to create HTTP client: {message}")]
    Client { message: String },

    /// Expiry date falls outside the representable range
    #[error("Expiry of {days} days is out of range")]
    ExpiryOutOfRange { days: u32 },

    /// Connection or transport failure
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// Request exceeded the configured timeout
    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// Service answered with a non-success status
    #[error("Service returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Response body could not be read
    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    /// Writing the avatar to disk failed
    #[error("Failed to save avatar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AvatarError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that come from the remote service rather than local disk
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AvatarError::Network { .. }
                | AvatarError::Timeout { .. }
                | AvatarError::Status { .. }
                | AvatarError::Body { .. }
        )
    }
}
