// # DNS Made Easy Provider
//
// This crate provides a DNS Made Easy provider implementation for zonesync.
//
// ## What it does
//
// - Reads a zone's records through the v2.0 managed DNS API
// - Creates the domain when a plan targets a zone the account lacks
// - Submits deletions and creations as sequential bulk batches
// - Encodes TXT values longer than 255 characters as quoted segments
// - Reports partial progress when a batch fails
//
// ## What it does not do
//
// - Retry or back off (owned by `ZoneSynchronizer`)
// - Update record sets in place (updates are delete + create)
// - Roll back committed batches
//
// ## Security Requirements
//
// - API and secret keys NEVER appear in logs or Debug output
// - The provider fails fast when either key is empty
//
// ## API Reference
//
// - DNS Made Easy API v2.0: https://api-docs.dnsmadeeasy.com/

pub mod client;
pub mod provider;
pub mod txt;
pub mod wire;

pub use client::{ClientOptions, DnsMadeEasyClient, PRODUCTION_BASE_URL, SANDBOX_BASE_URL};
pub use provider::{DnsMadeEasyProvider, PROVIDER_NAME};

use std::num::NonZeroUsize;
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::registry::ProviderRegistry;
use zonesync_core::traits::{DnsProvider, DnsProviderFactory};
use zonesync_core::{Error, Result};

/// Factory for creating DNS Made Easy providers from configuration
pub struct DnsMadeEasyFactory;

impl DnsProviderFactory for DnsMadeEasyFactory {
    fn create(&self, id: &str, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::DnsMadeEasy {
                api_key,
                secret_key,
                sandbox,
                batch_size,
                strict_supports,
                ratelimit_delay_ms,
                timeout_secs,
                base_url,
            } => {
                let batch_size = NonZeroUsize::new(*batch_size)
                    .ok_or_else(|| Error::config("batch_size must be > 0"))?;

                let options = ClientOptions {
                    sandbox: *sandbox,
                    base_url: base_url.clone(),
                    timeout: Duration::from_secs(*timeout_secs),
                    ratelimit_delay: Duration::from_millis(*ratelimit_delay_ms),
                };
                let client = DnsMadeEasyClient::new(api_key.as_str(), secret_key.as_str(), options)?;

                tracing::debug!(
                    "Created DNS Made Easy provider {} ({})",
                    id,
                    client.base_url()
                );

                Ok(Box::new(DnsMadeEasyProvider::new(
                    id,
                    client,
                    batch_size,
                    *strict_supports,
                )))
            }
            _ => Err(Error::config("Invalid config for DNS Made Easy provider")),
        }
    }
}

/// Register the DNS Made Easy provider with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(DnsMadeEasyFactory));
}
