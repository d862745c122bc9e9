//! Configuration for the prediction client and its polling loop

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Default API base
pub const DEFAULT_API_BASE: &str
  = "https://api.replicate.com/v1";

/// Environment variable holding the API token
pub const API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

/// Environment variable overriding the API base
pub const API_BASE_ENV: &str = "REPLICATE_API_BASE";

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig
{   /// Delay before every status request, in milliseconds
    pub poll_interval_ms: u64
  , /// Extra delay after a failed status request, in milliseconds
    pub error_backoff_ms: u64
  , /// Transport errors tolerated before giving up
    pub max_poll_errors: usize
  , /// Upper bound on total wait; `None` polls until terminal
    pub max_wait_secs: Option<u64>
}

impl PollingConfig
{   pub fn poll_interval(&self) -> Duration
    {   Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration
    {   Duration::from_millis(self.error_backoff_ms)
    }

    pub fn max_wait(&self) -> Option<Duration>
    {   self.max_wait_secs.map(Duration::from_secs)
    }
}

impl Default for PollingConfig
{   fn default() -> Self
    {   PollingConfig
        {   poll_interval_ms: 5_000
          , error_backoff_ms: 10_000
          , max_poll_errors: 2
          , max_wait_secs: None
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig
{   /// API base URL, without trailing slash
    pub api_base: String
  , /// Bearer token supplied by the host
    pub api_token: Option<String>
  , /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>
  , /// Status polling behavior
    pub polling: PollingConfig
}

impl ClientConfig
{   /// Build a config from `REPLICATE_API_TOKEN` / `REPLICATE_API_BASE`
    pub fn from_env() -> Self
    {   let mut config = ClientConfig::default();
        config.api_token = std::env::var(API_TOKEN_ENV).ok()
          .filter(|t| !t.is_empty());
        if let Ok(base) = std::env::var(API_BASE_ENV)
        {   if !base.is_empty()
            {   config.api_base = base;
            }
        }
        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self
    {   self.api_token = Some(token.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self
    {   self.api_base = base.into();
        self
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str
    {   self.api_base.trim_end_matches('/')
    }
}

impl Default for ClientConfig
{   fn default() -> Self
    {   ClientConfig
        {   api_base: DEFAULT_API_BASE.to_string()
          , api_token: None
          , timeout_secs: Some(60)
          , polling: PollingConfig::default()
        }
    }
}
