//! Avatar generation
//!
//! Creates random keys, fetches the matching image, writes it into the
//! output directory and records its expiry.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, error, info};

use crate::avatar::error::AvatarError;
use crate::avatar::source::AvatarSource;
use crate::expiry::ExpiryTracker;

/// Extension of saved avatar files
pub const AVATAR_EXTENSION: &str = "png";

/// Returns a fresh random key: SHA-256 hex digest of a UUID v4
pub fn generate_key() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{:x}", Sha256::digest(random.as_bytes()))
}

/// File name an avatar with `key` is saved under
pub fn avatar_file_name(key: &str) -> String {
    format!("{}.{}", key, AVATAR_EXTENSION)
}

/// Outcome of a batch of avatar requests
#[derive(Debug, Default)]
pub struct GenerationSummary {
    /// Paths of the avatars written, in creation order
    pub saved: Vec<PathBuf>,
    /// Number of avatars that could not be fetched or saved
    pub failed: usize,
}

impl GenerationSummary {
    pub fn generated(&self) -> usize {
        self.saved.len()
    }
}

/// Writes avatars into one output directory
#[derive(Debug, Clone)]
pub struct AvatarGenerator {
    output_dir: PathBuf,
    expires_in_days: u32,
}

impl AvatarGenerator {
    /// `expires_in_days == 0` disables expiry tracking for new avatars
    pub fn new(output_dir: impl Into<PathBuf>, expires_in_days: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            expires_in_days,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Expiry for an avatar created at `now`, `None` when tracking is off
    ///
    /// # Errors
    /// * `AvatarError::ExpiryOutOfRange` - the lifetime runs past the representable date range
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, AvatarError> {
        if self.expires_in_days == 0 {
            return Ok(None);
        }

        TimeDelta::try_days(i64::from(self.expires_in_days))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .map(Some)
            .ok_or(AvatarError::ExpiryOutOfRange {
                days: self.expires_in_days,
            })
    }

    /// Fetches one avatar for `key` and saves it
    ///
    /// The output directory is created on first write. When expiry is
    /// enabled the saved path is recorded in `tracker`.
    ///
    /// # Returns
    /// * `Ok(path)` - absolute path of the written file
    /// * `Err(AvatarError)` - fetch or write failed; nothing is recorded
    pub async fn create(
        &self,
        source: &dyn AvatarSource,
        key: &str,
        tracker: &mut ExpiryTracker,
    ) -> Result<PathBuf, AvatarError> {
        if key.is_empty() {
            return Err(AvatarError::EmptyKey);
        }

        let expires_at = self.expiry_from(Utc::now())?;
        let bytes = source.fetch(key).await?;

        let output_dir = std::path::absolute(&self.output_dir)
            .map_err(|e| AvatarError::io(&self.output_dir, e))?;
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| AvatarError::io(&output_dir, e))?;

        let path = output_dir.join(avatar_file_name(key));
        fs::write(&path, &bytes)
            .await
            .map_err(|e| AvatarError::io(&path, e))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Saved avatar");

        if let Some(expires_at) = expires_at {
            tracker.record(&path, expires_at);
        }

        Ok(path)
    }

    /// Generates `count` avatars one after another
    ///
    /// A failed avatar is logged and counted; the remaining ones still run.
    /// `on_progress` is called after each attempt with `(done, total, result)`.
    pub async fn generate_batch<F>(
        &self,
        source: &dyn AvatarSource,
        count: usize,
        tracker: &mut ExpiryTracker,
        mut on_progress: F,
    ) -> GenerationSummary
    where
        F: FnMut(usize, usize, &Result<PathBuf, AvatarError>),
    {
        let mut summary = GenerationSummary::default();

        info!(
            count = count,
            source = source.name(),
            output_dir = %self.output_dir.display(),
            "Generating avatars"
        );

        for done in 1..=count {
            let key = generate_key();
            let result = self.create(source, &key, tracker).await;

            match &result {
                Ok(path) => summary.saved.push(path.clone()),
                Err(e) => {
                    error!(key = %key, remote = e.is_remote(), "Avatar generation failed: {}", e);
                    summary.failed += 1;
                }
            }

            on_progress(done, count, &result);
        }

        info!(
            generated = summary.generated(),
            failed = summary.failed,
            "Avatar generation complete"
        );

        summary
    }
}
