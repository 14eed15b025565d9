//! Expiry tracker for generated avatars
//!
//! Keeps a mapping of avatar path to expiration timestamp, persisted as a
//! single JSON file. The store is read once at startup, mutated in memory
//! and written back once before exit.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::expiry::types::{ClearReport, ExpiryError, SweepReport, TrackedAvatar};

/// Default file name of the tracking store
pub const DEFAULT_TRACKING_FILE: &str = ".avatar_expiry.json";

/// In-memory view of the tracking store
#[derive(Debug, Clone)]
pub struct ExpiryTracker {
    store_path: PathBuf,
    entries: BTreeMap<PathBuf, DateTime<Utc>>,
}

impl ExpiryTracker {
    /// Creates an empty tracker bound to `store_path` without touching disk
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads the tracking store
    ///
    /// A missing or unreadable store yields an empty tracker. Losing the
    /// tracking data only means old avatars are not swept, so this never fails.
    pub async fn load(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();

        let json = match fs::read_to_string(&store_path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(store = %store_path.display(), "No tracking store found, starting empty");
                return Self::new(store_path);
            }
            Err(e) => {
                warn!(
                    store = %store_path.display(),
                    "Could not read tracking store, starting empty: {}", e
                );
                return Self::new(store_path);
            }
        };

        match serde_json::from_str::<BTreeMap<PathBuf, DateTime<Utc>>>(&json) {
            Ok(entries) => {
                debug!(
                    store = %store_path.display(),
                    entries = entries.len(),
                    "Loaded tracking store"
                );
                Self {
                    store_path,
                    entries,
                }
            }
            Err(e) => {
                warn!(
                    store = %store_path.display(),
                    "Invalid tracking store format, starting empty: {}", e
                );
                Self::new(store_path)
            }
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expiry recorded for `path`, if any
    #[cfg(test)]
    pub fn get(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.entries.get(path).copied()
    }

    /// Iterates over all tracked avatars in path order
    pub fn avatars(&self) -> impl Iterator<Item = TrackedAvatar> + '_ {
        self.entries
            .iter()
            .map(|(path, expires_at)| TrackedAvatar::new(path.clone(), *expires_at))
    }

    /// Records (or overwrites) the expiry of `path`
    pub fn record(&mut self, path: impl Into<PathBuf>, expires_at: DateTime<Utc>) {
        let path = path.into();
        debug!(path = %path.display(), expires_at = %expires_at, "Tracking avatar expiry");
        self.entries.insert(path, expires_at);
    }

    /// Deletes every avatar whose expiry lies before `now`
    ///
    /// Expired entries leave the store whether or not their file could be
    /// removed. A file that is already gone is not an error.
    pub async fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport {
            scanned: self.entries.len(),
            ..SweepReport::default()
        };

        let expired: Vec<TrackedAvatar> = self.avatars().filter(|a| a.is_expired(now)).collect();

        for avatar in expired {
            match fs::remove_file(&avatar.path).await {
                Ok(()) => {
                    info!(path = %avatar.path.display(), "Deleted expired avatar");
                    report.deleted += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %avatar.path.display(), "Expired avatar already removed");
                    report.missing += 1;
                }
                Err(e) => {
                    error!(path = %avatar.path.display(), "Failed to delete expired avatar: {}", e);
                    report.failed += 1;
                }
            }
            self.entries.remove(&avatar.path);
        }

        info!(
            scanned = report.scanned,
            deleted = report.deleted,
            missing = report.missing,
            failed = report.failed,
            "Expiry sweep complete"
        );

        report
    }

    /// Full reset: removes every regular file in `directory` and forgets all entries
    ///
    /// Subdirectories are left alone. A missing directory still clears the store.
    pub async fn clear_all(&mut self, directory: &Path) -> ClearReport {
        let mut report = ClearReport {
            entries_dropped: self.entries.len(),
            ..ClearReport::default()
        };
        self.entries.clear();

        let mut dir = match fs::read_dir(directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(directory = %directory.display(), "Output directory not found, nothing to delete");
                return report;
            }
            Err(e) => {
                error!(directory = %directory.display(), "Failed to read output directory: {}", e);
                return report;
            }
        };

        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!(directory = %directory.display(), "Failed to list output directory: {}", e);
                    break;
                }
            };

            let path = entry.path();
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = %path.display(), "Could not stat entry: {}", e);
                    continue;
                }
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Deleted avatar");
                    report.deleted += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    error!(path = %path.display(), "Failed to delete avatar: {}", e);
                    report.failed += 1;
                }
            }
        }

        info!(
            directory = %directory.display(),
            deleted = report.deleted,
            failed = report.failed,
            entries_dropped = report.entries_dropped,
            "Full reset complete"
        );

        report
    }

    /// Writes the store to disk, replacing any previous contents
    pub async fn save(&self) -> Result<(), ExpiryError> {
        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ExpiryError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ExpiryError::serialization(&self.store_path, e))?;

        fs::write(&self.store_path, json)
            .await
            .map_err(|e| ExpiryError::io(&self.store_path, e))?;

        debug!(
            store = %self.store_path.display(),
            entries = self.entries.len(),
            "Saved tracking store"
        );
        Ok(())
    }
}
