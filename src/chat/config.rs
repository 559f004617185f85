//! Configuration for the classifier client.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{ChatError, ChatResult};

/// Environment variable selecting the runtime target.
pub const TARGET_ENV: &str = "JUSTICE_AI_TARGET";
/// Environment variable overriding the endpoint URL.
pub const ENDPOINT_ENV: &str = "JUSTICE_AI_ENDPOINT";
/// Environment variable for the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "JUSTICE_AI_TIMEOUT_SECS";
/// Environment variable for the connect timeout, in seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "JUSTICE_AI_CONNECT_TIMEOUT_SECS";

/// Android emulators reach the host loopback through this alias.
const EMULATOR_ENDPOINT: &str = "http://10.0.2.2:5000/predict";
/// Physical devices talk to the backend over the LAN.
const DEVICE_ENDPOINT: &str = "http://192.168.159.164:5000/predict";
/// Desktop builds run next to the backend.
const DESKTOP_ENDPOINT: &str = "http://127.0.0.1:5000/predict";

/// Where the client runs, which decides the default endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeTarget {
    /// Android emulator.
    Emulator,
    /// Phone or tablet on the local network.
    Device,
    /// Same machine as the backend.
    #[default]
    Desktop,
}

impl RuntimeTarget {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emulator => "emulator",
            Self::Device => "device",
            Self::Desktop => "desktop",
        }
    }

    /// Default `/predict` endpoint for this target.
    #[must_use]
    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::Emulator => EMULATOR_ENDPOINT,
            Self::Device => DEVICE_ENDPOINT,
            Self::Desktop => DESKTOP_ENDPOINT,
        }
    }
}

impl fmt::Display for RuntimeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RuntimeTarget {
    type Err = ChatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "emulator" | "android-emulator" => Ok(Self::Emulator),
            "device" | "lan" => Ok(Self::Device),
            "desktop" | "local" => Ok(Self::Desktop),
            other => Err(ChatError::InvalidConfig(format!(
                "unknown runtime target: {other}"
            ))),
        }
    }
}

/// Configuration for talking to the classification service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Runtime target used to pick the default endpoint.
    pub target: RuntimeTarget,
    /// Explicit endpoint; wins over the target default.
    pub endpoint: Option<String>,
    /// Whole-request timeout. `None` waits forever.
    #[serde(with = "duration_serde")]
    pub request_timeout: Option<Duration>,
    /// Connection timeout. `None` uses the client default.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Option<Duration>,
}

impl ChatConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configuration from `JUSTICE_AI_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(target) = lookup(TARGET_ENV) {
            config.target = target.parse()?;
        }
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|e| !e.trim().is_empty()) {
            config.endpoint = Some(endpoint.trim().to_string());
        }
        if let Some(secs) = lookup(TIMEOUT_ENV) {
            config.request_timeout = Some(parse_secs(TIMEOUT_ENV, &secs)?);
        }
        if let Some(secs) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = Some(parse_secs(CONNECT_TIMEOUT_ENV, &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the runtime target.
    #[must_use]
    pub const fn with_target(mut self, target: RuntimeTarget) -> Self {
        self.target = target;
        self
    }

    /// Set an explicit endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Resolve the endpoint the dispatcher should post to.
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a valid http(s) URL.
    pub fn endpoint_url(&self) -> ChatResult<Url> {
        let raw = self
            .endpoint
            .as_deref()
            .unwrap_or_else(|| self.target.default_endpoint());
        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChatError::InvalidConfig(format!(
                "endpoint must be http or https: {raw}"
            )));
        }
        Ok(url)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the endpoint or a timeout is invalid.
    pub fn validate(&self) -> ChatResult<()> {
        self.endpoint_url()?;

        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ChatError::InvalidConfig(
                "request_timeout must be > 0".to_string(),
            ));
        }
        if self.connect_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ChatError::InvalidConfig(
                "connect_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> ChatResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ChatError::InvalidConfig(format!("{key}={value}: {e}")))
}

/// Serde module for optional Duration serialization as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    // Signature fixed by `#[serde(with)]`.
    #[allow(clippy::ref_option)]
    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_secs()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
