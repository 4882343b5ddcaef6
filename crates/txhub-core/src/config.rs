//! Form configuration
//!
//! One configurable form replaces the per-variant copies: auto-fetch,
//! Extended JSON input, preview pane and target endpoint are all options.
//! Values come from defaults, an optional TOML file and `TXHUB_*`
//! environment variables, in that order.

use crate::error::{HubError, HubResult};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use txhub_ejson::InputMode;

/// Production webhook
pub const PRODUCTION_ENDPOINT: &str =
    "https://n8n-heroku-backup-2ed39cd10b25.herokuapp.com/webhook/c600a845-e746-46f9-9d2d-e36bffe10953";

/// Test webhook (same workflow, test listener)
pub const TEST_ENDPOINT: &str =
    "https://n8n-heroku-backup-2ed39cd10b25.herokuapp.com/webhook-test/c600a845-e746-46f9-9d2d-e36bffe10953";

/// Named webhook target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointProfile {
    #[default]
    Production,
    Test,
}

impl EndpointProfile {
    #[inline]
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_ENDPOINT,
            Self::Test => TEST_ENDPOINT,
        }
    }
}

impl FromStr for EndpointProfile {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(HubError::Config(format!("unknown endpoint profile: {other}"))),
        }
    }
}

/// Transaction form configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Fetch records as soon as the session starts
    pub auto_fetch: bool,
    /// Accept Shell literals and Extended JSON in field text
    pub accept_extended_json: bool,
    /// Render the read-only preview pane
    pub show_preview: bool,
    /// Named endpoint, used when `endpoint` is unset
    pub profile: EndpointProfile,
    /// Explicit webhook URL, overrides `profile`
    pub endpoint: Option<String>,
    /// Page URL query parameter carrying the identifier
    pub id_param: String,
    /// Query parameter the fetch request uses for the identifier
    pub fetch_query_key: String,
    /// Delay before re-fetching after a successful update; 0 disables
    pub refresh_delay_ms: u64,
}

impl FormConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-fetch
    #[inline]
    #[must_use]
    pub fn with_auto_fetch(mut self, enabled: bool) -> Self {
        self.auto_fetch = enabled;
        self
    }

    /// With Extended JSON input
    #[inline]
    #[must_use]
    pub fn with_extended_json(mut self, enabled: bool) -> Self {
        self.accept_extended_json = enabled;
        self
    }

    /// With preview pane
    #[inline]
    #[must_use]
    pub fn with_preview(mut self, enabled: bool) -> Self {
        self.show_preview = enabled;
        self
    }

    /// With endpoint profile
    #[inline]
    #[must_use]
    pub fn with_profile(mut self, profile: EndpointProfile) -> Self {
        self.profile = profile;
        self
    }

    /// With explicit endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// With identifier parameter name
    #[inline]
    #[must_use]
    pub fn with_id_param(mut self, name: impl Into<String>) -> Self {
        self.id_param = name.into();
        self
    }

    /// With refresh delay
    #[inline]
    #[must_use]
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// How field text is parsed
    #[inline]
    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        if self.accept_extended_json {
            InputMode::Extended
        } else {
            InputMode::Plain
        }
    }

    /// Re-fetch delay, `None` when disabled
    #[inline]
    #[must_use]
    pub fn refresh_delay(&self) -> Option<Duration> {
        (self.refresh_delay_ms > 0).then(|| Duration::from_millis(self.refresh_delay_ms))
    }

    /// Resolved webhook URL
    ///
    /// # Errors
    /// [`HubError::Config`] when the configured endpoint is not a URL.
    pub fn endpoint_url(&self) -> HubResult<Url> {
        let raw = self.endpoint.as_deref().unwrap_or(self.profile.url());
        Url::parse(raw).map_err(|e| HubError::Config(format!("invalid endpoint {raw:?}: {e}")))
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// [`HubError::Config`] on malformed TOML or unknown values.
    pub fn from_toml_str(text: &str) -> HubResult<Self> {
        toml::from_str(text).map_err(|e| HubError::Config(format!("invalid config: {e}")))
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// [`HubError::Config`] when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Apply `TXHUB_*` overrides from the process environment
    ///
    /// # Errors
    /// [`HubError::Config`] on an unknown profile name.
    pub fn apply_env(self) -> HubResult<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source
    ///
    /// # Errors
    /// [`HubError::Config`] on an unknown profile name.
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> HubResult<Self> {
        if let Some(profile) = lookup("TXHUB_PROFILE") {
            self.profile = profile.parse()?;
        }
        if let Some(endpoint) = lookup("TXHUB_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(name) = lookup("TXHUB_ID_PARAM") {
            self.id_param = name;
        }
        Ok(self)
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            auto_fetch: true,
            accept_extended_json: true,
            show_preview: false,
            profile: EndpointProfile::Production,
            endpoint: None,
            id_param: "transactionId".to_string(),
            fetch_query_key: "_id".to_string(),
            refresh_delay_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = FormConfig::new();
        assert!(config.auto_fetch);
        assert_eq!(config.input_mode(), InputMode::Extended);
        assert_eq!(config.refresh_delay(), Some(Duration::from_secs(1)));
        assert_eq!(config.endpoint_url().unwrap().as_str(), PRODUCTION_ENDPOINT);
    }

    #[test]
    fn explicit_endpoint_overrides_profile() {
        let config = FormConfig::new()
            .with_profile(EndpointProfile::Test)
            .with_endpoint("http://127.0.0.1:9000/hook");
        assert_eq!(config.endpoint_url().unwrap().as_str(), "http://127.0.0.1:9000/hook");

        let config = FormConfig::new().with_profile(EndpointProfile::Test);
        assert_eq!(config.endpoint_url().unwrap().as_str(), TEST_ENDPOINT);
    }

    #[test]
    fn invalid_endpoint() {
        let config = FormConfig::new().with_endpoint("not a url");
        assert!(matches!(config.endpoint_url(), Err(HubError::Config(_))));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FormConfig::from_toml_str(
            r#"
            accept_extended_json = false
            show_preview = true
            profile = "test"
            id_param = "transaction"
            refresh_delay_ms = 0
            "#,
        )
        .unwrap();
        assert!(config.auto_fetch);
        assert_eq!(config.input_mode(), InputMode::Plain);
        assert!(config.show_preview);
        assert_eq!(config.profile, EndpointProfile::Test);
        assert_eq!(config.id_param, "transaction");
        assert_eq!(config.refresh_delay(), None);
    }

    #[test]
    fn bad_toml() {
        assert!(FormConfig::from_toml_str("profile = \"staging\"").is_err());
        assert!(FormConfig::from_toml_str("auto_fetch = ").is_err());
    }

    #[test]
    fn variable_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TXHUB_PROFILE", "test"),
            ("TXHUB_ID_PARAM", "transaction"),
        ]
        .into_iter()
        .collect();
        let config = FormConfig::new()
            .apply_vars(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.profile, EndpointProfile::Test);
        assert_eq!(config.id_param, "transaction");
        assert_eq!(config.endpoint, None);

        let err = FormConfig::new().apply_vars(|k| (k == "TXHUB_PROFILE").then(|| "qa".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn profile_names() {
        assert_eq!("prod".parse::<EndpointProfile>().unwrap(), EndpointProfile::Production);
        assert_eq!("Test".parse::<EndpointProfile>().unwrap(), EndpointProfile::Test);
    }
}
