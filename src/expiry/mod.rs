//! Expiry tracking for generated avatars
//!
//! Records when each avatar should be deleted and removes expired ones
//! (or everything, on a full reset) at startup.

pub mod tracker;
pub mod types;

pub use tracker::{DEFAULT_TRACKING_FILE, ExpiryTracker};
