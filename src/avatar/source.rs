//! Remote avatar sources
//!
//! `AvatarSource` abstracts the image service so the generator can be driven
//! by a mock in tests. `RoboHashClient` is the HTTP implementation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::avatar::error::AvatarError;

/// Default image service
pub const DEFAULT_BASE_URL: &str = "https://robohash.org";
/// Default timeout for HTTP requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Maximum number of redirects to follow
const MAX_REDIRECTS: usize = 5;

/// Image set offered by RoboHash
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotSet {
    /// Robots
    #[default]
    Set1,
    /// Monsters
    Set2,
    /// Robot heads
    Set3,
    /// Kittens
    Set4,
}

impl RobotSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            RobotSet::Set1 => "set1",
            RobotSet::Set2 => "set2",
            RobotSet::Set3 => "set3",
            RobotSet::Set4 => "set4",
        }
    }
}

impl fmt::Display for RobotSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RobotSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "set1" => Ok(RobotSet::Set1),
            "set2" => Ok(RobotSet::Set2),
            "set3" => Ok(RobotSet::Set3),
            "set4" => Ok(RobotSet::Set4),
            other => Err(format!(
                "unknown image set '{}' (expected set1, set2, set3 or set4)",
                other
            )),
        }
    }
}

/// A service that turns an identifying key into image bytes
#[async_trait::async_trait]
pub trait AvatarSource: Send + Sync {
    /// Fetches the raw image for `key`
    async fn fetch(&self, key: &str) -> Result<Bytes, AvatarError>;

    /// Human-readable name used in logs
    fn name(&self) -> &str;
}

/// HTTP client for the RoboHash service
#[derive(Debug, Clone)]
pub struct RoboHashClient {
    client: reqwest::Client,
    base_url: Url,
    set: RobotSet,
    timeout_secs: u64,
}

impl RoboHashClient {
    /// Builds a client for `base_url`
    ///
    /// # Errors
    /// * `AvatarError::InvalidUrl` - base URL is unparseable or not http(s)
    /// * `AvatarError::Client` - reqwest client could not be built
    pub fn new(base_url: &str, set: RobotSet, timeout_secs: u64) -> Result<Self, AvatarError> {
        let mut parsed = Url::parse(base_url).map_err(|e| AvatarError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(AvatarError::InvalidUrl {
                url: base_url.to_string(),
                message: format!(
                    "unsupported protocol '{}', only http:// and https:// are allowed",
                    scheme
                ),
            });
        }

        // Keys are joined as a trailing path segment
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("avatargen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AvatarError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: parsed,
            set,
            timeout_secs,
        })
    }

    /// Full request URL for `key`
    pub fn avatar_url(&self, key: &str) -> Result<Url, AvatarError> {
        if key.is_empty() {
            return Err(AvatarError::EmptyKey);
        }

        let mut url = self.base_url.join(key).map_err(|e| AvatarError::InvalidUrl {
            url: format!("{}{}", self.base_url, key),
            message: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("set", self.set.as_str());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl AvatarSource for RoboHashClient {
    async fn fetch(&self, key: &str) -> Result<Bytes, AvatarError> {
        let url = self.avatar_url(key)?;
        debug!(url = %url, "Requesting avatar");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AvatarError::Timeout {
                        url: url.to_string(),
                        seconds: self.timeout_secs,
                    }
                } else {
                    AvatarError::Network {
                        url: url.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AvatarError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| AvatarError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        debug!(url = %url, bytes = body.len(), "Avatar downloaded");
        Ok(body)
    }

    fn name(&self) -> &str {
        "robohash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_robot_set_from_str() {
        assert_eq!("set2".parse::<RobotSet>().unwrap(), RobotSet::Set2);
        assert_eq!("SET4".parse::<RobotSet>().unwrap(), RobotSet::Set4);
        assert!("set9".parse::<RobotSet>().is_err());
        assert!("kittens".parse::<RobotSet>().is_err());
    }

    #[test]
    fn test_robot_set_serde_lowercase() {
        let json = serde_json::to_string(&RobotSet::Set3).unwrap();
        assert_eq!(json, "\"set3\"");
        let set: RobotSet = serde_json::from_str("\"set4\"").unwrap();
        assert_eq!(set, RobotSet::Set4);
    }

    #[test]
    fn test_new_rejects_non_http_scheme() {
        let err = RoboHashClient::new("ftp://robohash.org", RobotSet::Set1, 5).unwrap_err();
        assert!(matches!(err, AvatarError::InvalidUrl { .. }));
    }

    #[test]
    fn test_new_rejects_garbage_url() {
        let err = RoboHashClient::new("not a url", RobotSet::Set1, 5).unwrap_err();
        assert!(matches!(err, AvatarError::InvalidUrl { .. }));
    }

    #[test]
    fn test_avatar_url_embeds_key_and_set() {
        let client = RoboHashClient::new("https://robohash.org", RobotSet::Set2, 5).unwrap();
        let url = client.avatar_url("abc123").unwrap();
        assert_eq!(url.as_str(), "https://robohash.org/abc123?set=set2");
    }

    #[test]
    fn test_avatar_url_keeps_base_path() {
        let client = RoboHashClient::new("http://localhost:8080/api", RobotSet::Set1, 5).unwrap();
        let url = client.avatar_url("k").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/k?set=set1");
    }

    #[test]
    fn test_avatar_url_rejects_empty_key() {
        let client = RoboHashClient::new("https://robohash.org", RobotSet::Set1, 5).unwrap();
        assert!(matches!(client.avatar_url(""), Err(AvatarError::EmptyKey)));
    }

    #[tokio::test]
    async fn test_fetch_returns_body_verbatim() {
        let server = MockServer::start().await;
        let png = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
        Mock::given(method("GET"))
            .and(path("/deadbeef"))
            .and(query_param("set", "set1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let client = RoboHashClient::new(&server.uri(), RobotSet::Set1, 5).unwrap();
        let body = client.fetch("deadbeef").await.unwrap();
        assert_eq!(body.as_ref(), png.as_slice());
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = RoboHashClient::new(&server.uri(), RobotSet::Set1, 5).unwrap();
        let err = client.fetch("abc").await.unwrap_err();
        assert!(matches!(err, AvatarError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = RoboHashClient::new(&server.uri(), RobotSet::Set1, 1).unwrap();
        let err = client.fetch("slow").await.unwrap_err();
        assert!(matches!(err, AvatarError::Timeout { seconds: 1, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        // Port 9 (discard) is not expected to be listening on loopback
        let client = RoboHashClient::new("http://127.0.0.1:9", RobotSet::Set1, 5).unwrap();
        let err = client.fetch("abc").await.unwrap_err();
        assert!(err.is_remote());
    }
}
