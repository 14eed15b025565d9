//! Avatar fetching and storage

pub mod error;
pub mod generator;
#[cfg(test)]
pub mod mock;
pub mod source;

pub use generator::{AvatarGenerator, GenerationSummary};
pub use source::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, RoboHashClient, RobotSet};
