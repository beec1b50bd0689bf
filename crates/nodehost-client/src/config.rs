//! Client configuration
//!
//! The base API URL and the shared signing secret are required up front;
//! construction fails fast if either is missing rather than surfacing the
//! problem on the first request.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{NodehostError, Result};

/// Environment variable holding the base API URL
pub const ENV_API_URL: &str = "NODEHOST_API_URL";
/// Environment variable holding the shared signing secret
pub const ENV_APP_SECRET: &str = "NODEHOST_APP_SECRET";

/// Default request timeout for non-streaming calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`NodehostClient`](crate::NodehostClient)
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub app_secret: SecretString,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration from a base URL string and signing secret.
    ///
    /// Fails if the URL does not parse or the secret is empty.
    pub fn new(base_url: &str, app_secret: SecretString) -> Result<Self> {
        use secrecy::ExposeSecret as _;

        let base_url = Url::parse(base_url)?;
        if app_secret.expose_secret().is_empty() {
            return Err(NodehostError::config("app secret must not be empty"));
        }

        Ok(Self {
            base_url,
            app_secret,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Load the configuration from `NODEHOST_API_URL` and `NODEHOST_APP_SECRET`.
    ///
    /// Absence of either variable is a fatal configuration error.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_API_URL)
            .map_err(|_| NodehostError::config(format!("{ENV_API_URL} is not set")))?;
        let secret = std::env::var(ENV_APP_SECRET)
            .map_err(|_| NodehostError::config(format!("{ENV_APP_SECRET} is not set")))?;

        Self::new(&base_url, SecretString::from(secret))
    }

    /// Override the request timeouts
    #[must_use]
    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = ClientConfig::new("https://api.example", SecretString::from("s3cr3t"));
        assert!(config.is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let config = ClientConfig::new("not a url", SecretString::from("s3cr3t"));
        assert!(matches!(config, Err(NodehostError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let config = ClientConfig::new("https://api.example", SecretString::from(""));
        assert!(matches!(config, Err(NodehostError::Config(_))));
    }
}
