use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::avatar::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, RobotSet};
use crate::expiry::DEFAULT_TRACKING_FILE;

/// Default directory avatars are written to
pub const DEFAULT_OUTPUT_DIR: &str = "avatars";
/// Default lifetime of a generated avatar
pub const DEFAULT_EXPIRES_IN_DAYS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image service root, keys are appended as a path segment
    pub base_url: String,

    pub output_dir: PathBuf,

    /// Days until a new avatar expires (0 disables tracking)
    pub expires_in_days: u32,

    /// Location of the tracking store
    pub tracking_file: PathBuf,

    pub robot_set: RobotSet,

    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            expires_in_days: DEFAULT_EXPIRES_IN_DAYS,
            tracking_file: PathBuf::from(DEFAULT_TRACKING_FILE),
            robot_set: RobotSet::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
