//! Types for expiry tracking
//!
//! - TrackedAvatar: one generated file and the moment it expires
//! - SweepReport / ClearReport: counters returned by the cleanup passes
//! - ExpiryError: store I/O and serialization failures

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A generated avatar file and its expiration timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedAvatar {
    /// Absolute location of the avatar on disk
    pub path: PathBuf,
    /// Moment after which the avatar may be deleted (UTC)
    pub expires_at: DateTime<Utc>,
}

impl TrackedAvatar {
    pub fn new(path: impl Into<PathBuf>, expires_at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            expires_at,
        }
    }

    /// Returns true once `now` is strictly past `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Result of a sweep over the tracking store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries examined
    pub scanned: usize,
    /// Expired files removed from disk
    pub deleted: usize,
    /// Expired entries whose file was already gone
    pub missing: usize,
    /// Expired files that could not be removed (entry dropped anyway)
    pub failed: usize,
}

impl SweepReport {
    /// Number of entries pruned from the store
    pub fn pruned(&self) -> usize {
        self.deleted + self.missing + self.failed
    }
}

/// Result of a full reset of an output directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Files removed from the output directory
    pub deleted: usize,
    /// Files that could not be removed
    pub failed: usize,
    /// Tracking entries dropped from the store
    pub entries_dropped: usize,
}

/// Errors raised while persisting the tracking store
#[derive(Error, Debug)]
pub enum ExpiryError {
    #[error("Tracking store I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tracking store serialization failed for {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExpiryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.into(),
            source,
        }
    }
}
