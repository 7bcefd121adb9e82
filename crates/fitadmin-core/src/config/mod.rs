//! Client configuration shared by every console front end.
//!
//! A `ClientConfig` names the backend and the degrade policy. It is read
//! from JSON, then environment overrides are layered on top.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{normalize_base_url, normalize_text_option};
use crate::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://owntrainer.uz";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

pub const API_BASE_URL_ENV: &str = "FITADMIN_API_BASE_URL";
pub const OFFLINE_DEMO_ENV: &str = "FITADMIN_OFFLINE_DEMO";

/// Backend location, request timeout and the offline demo switch.
///
/// `offline_demo` enables sample listings and locally fabricated records
/// when the backend cannot be reached. Records fabricated this way are
/// always reported as not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub offline_demo: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            offline_demo: false,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON config document.
    pub fn parse(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid client config JSON: {error}")))?;
        config.validated()
    }

    /// Apply `FITADMIN_*` process environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = normalize_text_option(lookup(API_BASE_URL_ENV)) {
            self.api_base_url = url;
        }
        if let Some(raw) = normalize_text_option(lookup(OFFLINE_DEMO_ENV)) {
            self.offline_demo = parse_flag(&raw).ok_or_else(|| {
                Error::Config(format!("{OFFLINE_DEMO_ENV} must be true or false, got '{raw}'"))
            })?;
        }
        self.validated()
    }

    /// Normalized backend base URL without a trailing slash.
    pub fn base_url(&self) -> Result<String> {
        normalize_base_url(&self.api_base_url).map_err(Error::Config)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validated(mut self) -> Result<Self> {
        self.api_base_url = self.base_url()?;
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
