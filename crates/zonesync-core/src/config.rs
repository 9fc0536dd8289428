//! Configuration types for zone synchronization
//!
//! This module defines all configuration structures used throughout the workspace.

use crate::batch::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Main synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zone files holding the desired state
    #[serde(default)]
    pub zone_files: Vec<String>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_files.is_empty() {
            return Err(crate::Error::config("No zone files configured"));
        }

        self.provider.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// DNS Made Easy provider
    #[serde(rename = "dnsmadeeasy")]
    DnsMadeEasy {
        /// API key, sent with every request
        api_key: String,
        /// Secret key used to sign requests
        secret_key: String,
        /// Use the sandbox API instead of production
        #[serde(default)]
        sandbox: bool,
        /// Maximum number of records per bulk create/delete request
        #[serde(default = "default_batch_size")]
        batch_size: usize,
        /// Reject records the API cannot represent instead of rewriting them
        #[serde(default = "default_strict_supports")]
        strict_supports: bool,
        /// Pause after every successful request, in milliseconds
        #[serde(default)]
        ratelimit_delay_ms: u64,
        /// HTTP request timeout, in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        /// Override the API base URL (testing)
        #[serde(default)]
        base_url: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// DNS Made Easy configuration with every optional setting at its default
    pub fn dnsmadeeasy(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        ProviderConfig::DnsMadeEasy {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            sandbox: false,
            batch_size: default_batch_size(),
            strict_supports: default_strict_supports(),
            ratelimit_delay_ms: 0,
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::DnsMadeEasy {
                api_key,
                secret_key,
                batch_size,
                timeout_secs,
                ..
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("DNS Made Easy api_key cannot be empty"));
                }
                if secret_key.is_empty() {
                    return Err(crate::Error::config("DNS Made Easy secret_key cannot be empty"));
                }
                if *batch_size == 0 {
                    return Err(crate::Error::config("batch_size must be > 0"));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("timeout_secs must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::DnsMadeEasy { .. } => "dnsmadeeasy",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }

    /// Configured bulk batch size, if this provider has one
    pub fn batch_size(&self) -> Option<NonZeroUsize> {
        match self {
            ProviderConfig::DnsMadeEasy { batch_size, .. } => NonZeroUsize::new(*batch_size),
            ProviderConfig::Custom { .. } => None,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_strict_supports() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of re-plan/apply attempts after a transient failure
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay before the first retry (in seconds); doubles on each attempt
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Upper bound for the retry delay (in seconds)
    #[serde(default = "default_max_retry_delay_secs")]
    pub max_retry_delay_secs: u64,

    /// Plan only; never apply
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        if self.max_retry_delay_secs < self.retry_delay_secs {
            return Err(crate::Error::config(
                "max_retry_delay_secs must be >= retry_delay_secs",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            max_retry_delay_secs: default_max_retry_delay_secs(),
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_secs() -> u64 {
    1
}

fn default_max_retry_delay_secs() -> u64 {
    30
}

fn default_event_channel_capacity() -> usize {
    100
}
