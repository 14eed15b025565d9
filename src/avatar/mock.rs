//! Mock avatar source for testing
//!
//! Serves a fixed payload and can be told to fail specific calls, so batch
//! behavior can be exercised without a network.

use std::collections::HashSet;
use std::sync::Mutex;

use bytes::Bytes;

use crate::avatar::error::AvatarError;
use crate::avatar::source::AvatarSource;

pub struct MockAvatarSource {
    payload: Bytes,
    /// Zero-based call indices that should fail
    fail_on: Mutex<HashSet<usize>>,
    /// Keys received, in call order
    keys: Mutex<Vec<String>>,
}

impl MockAvatarSource {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            fail_on: Mutex::new(HashSet::new()),
            keys: Mutex::new(Vec::new()),
        }
    }

    /// Makes the `index`-th call (zero-based) return a status error
    pub fn fail_call(&self, index: usize) {
        self.fail_on.lock().unwrap().insert(index);
    }

    pub fn call_count(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AvatarSource for MockAvatarSource {
    async fn fetch(&self, key: &str) -> Result<Bytes, AvatarError> {
        let index = {
            let mut keys = self.keys.lock().unwrap();
            keys.push(key.to_string());
            keys.len() - 1
        };

        if self.fail_on.lock().unwrap().contains(&index) {
            return Err(AvatarError::Status {
                url: format!("mock://{}", key),
                status: 503,
            });
        }

        Ok(self.payload.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
