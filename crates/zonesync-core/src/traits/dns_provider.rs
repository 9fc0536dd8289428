// # DNS Provider Trait
//
// Defines the interface between the synchronizer and a DNS hosting API.
//
// ## Implementations
//
// - DNS Made Easy: `zonesync-provider-dnsmadeeasy` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::{DnsProvider, Zone};
//
// async fn show(provider: &dyn DnsProvider) -> zonesync_core::Result<()> {
//     let mut existing = Zone::new("example.com.")?;
//     let exists = provider.populate(&mut existing).await?;
//     println!("{} records, exists={}", existing.len(), exists);
//     Ok(())
// }
// ```

use crate::batch::BatchSummary;
use crate::change::Plan;
use crate::record::Record;
use crate::zone::Zone;
use async_trait::async_trait;

/// Result of a successful apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Zone that was applied
    pub zone: String,
    /// Number of changes applied
    pub changes: usize,
    /// Whether the zone had to be created first
    pub zone_created: bool,
    /// Batches submitted, in submission order
    pub batches: Vec<BatchSummary>,
}

/// Trait for DNS provider implementations
///
/// Providers translate between the zone model and one hosting API. Planning
/// (diffing, retry, scheduling) belongs to the synchronizer; a provider only
/// reads remote state and submits the operations a plan calls for.
///
/// # Thread Safety
///
/// Implementations must be thread-safe: independent zones may be synchronized
/// concurrently through the same provider instance.
///
/// # Retries
///
/// Providers must not retry. A failed submission is returned as an error
/// (with batch progress for partial applies); the synchronizer decides
/// whether to re-plan and try again.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Check if this provider can represent the given record
    ///
    /// Unsupported records are left out of plans rather than failing them.
    fn supports(&self, record: &Record) -> bool;

    /// Apply provider-specific rewrites or rejections to a desired zone
    ///
    /// Called before any network access. Returning an error aborts the sync
    /// with the zone untouched.
    fn process_desired_zone(&self, desired: Zone) -> crate::Result<Zone> {
        Ok(desired)
    }

    /// Load the provider's current records into `zone`
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the zone exists at the provider
    /// - `Ok(false)`: the zone does not exist (nothing was added)
    /// - `Err(Error)`: the request failed
    async fn populate(&self, zone: &mut Zone) -> crate::Result<bool>;

    /// Submit the changes in `plan`
    ///
    /// Creates the zone first when it does not exist.
    async fn apply(&self, plan: &Plan) -> crate::Result<ApplyReport>;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `id`: Instance name used in logs and messages
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object
    fn create(
        &self,
        id: &str,
        config: &crate::config::ProviderConfig,
    ) -> crate::Result<Box<dyn DnsProvider>>;
}
