//! Zone synchronizer
//!
//! The ZoneSynchronizer is responsible for:
//! - Validating the desired zone before any network access
//! - Loading the provider's current records
//! - Computing the changes between the two
//! - Handing the plan to the provider and retrying transient failures
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ Desired Zone │───┐
//! └──────────────┘   │
//!                    ▼
//!           ┌──────────────────┐
//!           │ ZoneSynchronizer │
//!           └──────────────────┘
//!                    │
//!         ┌──────────┼────────────────────┐
//!         ▼          ▼                    ▼
//! ┌─────────────┐ ┌──────────────┐ ┌─────────────┐
//! │ DnsProvider │ │ DnsProvider  │ │   Events    │
//! │ (populate)  │ │ (apply)      │ │  (notify)   │
//! └─────────────┘ └──────────────┘ └─────────────┘
//! ```
//!
//! ## Sync Flow
//!
//! 1. Validate desired records, let the provider process the zone
//! 2. Populate the existing zone from the provider
//! 3. Diff desired against existing
//! 4. Apply (unless dry-run or nothing to do)
//! 5. On a transient failure, back off, re-plan from fresh remote state and
//!    apply what is still missing
//!
//! Re-planning is safe after a partial apply because changes are a pure
//! function of (desired, existing): batches that were committed simply no
//! longer show up in the next plan.

use crate::change::Plan;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::traits::{ApplyReport, DnsProvider};
use crate::zone::Zone;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events emitted by the ZoneSynchronizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A plan was computed
    PlanComputed {
        zone: String,
        creates: usize,
        updates: usize,
        deletes: usize,
    },

    /// The zone already matches the desired state
    NoChanges { zone: String },

    /// Changes were planned but not applied (dry-run)
    DryRun { zone: String, changes: usize },

    /// An apply attempt started
    ApplyStarted {
        zone: String,
        attempt: usize,
        changes: usize,
    },

    /// An apply attempt succeeded
    ApplySucceeded {
        zone: String,
        changes: usize,
        batches: usize,
    },

    /// A sync attempt failed
    ApplyFailed {
        zone: String,
        attempt: usize,
        error: String,
        will_retry: bool,
    },
}

/// What a sync did
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Nothing to do
    NoChanges,
    /// Dry-run: the plan that would have been applied
    Planned(Plan),
    /// Changes were applied
    Applied(ApplyReport),
}

/// Plans and applies desired zones against one provider
///
/// ## Threading
///
/// All methods take `&self`; share the synchronizer behind an `Arc` to
/// sync several zones concurrently. Batches of a single zone are always
/// applied sequentially by the provider.
pub struct ZoneSynchronizer {
    /// Provider holding the remote zones
    provider: Arc<dyn DnsProvider>,

    /// Retry and dry-run settings
    config: EngineConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl ZoneSynchronizer {
    /// Create a new synchronizer
    ///
    /// # Returns
    ///
    /// A tuple of (synchronizer, event_receiver) where event_receiver yields sync events
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let sync = Self {
            provider,
            config,
            event_tx: tx,
        };

        Ok((sync, rx))
    }

    /// The provider this synchronizer drives
    pub fn provider(&self) -> &Arc<dyn DnsProvider> {
        &self.provider
    }

    /// Compute the plan for `desired`.
    ///
    /// Validation failures are returned before the provider is contacted.
    pub async fn plan(&self, desired: Zone) -> Result<Plan> {
        for record in desired.records() {
            record.validate().map_err(|e| match e {
                crate::Error::Validation(msg) => {
                    crate::Error::validation(format!("{}: {}", desired.name(), msg))
                }
                other => other,
            })?;
        }

        let processed = self.provider.process_desired_zone(desired)?;

        let mut supported = Zone::new(processed.name())?;
        for record in processed.records() {
            if self.provider.supports(record) {
                supported.add_record(record.clone(), false)?;
            } else {
                warn!(
                    "{} does not support {} {}, skipping",
                    self.provider.provider_name(),
                    record.fqdn(processed.name()),
                    record.record_type()
                );
            }
        }

        let mut existing = Zone::new(supported.name())?;
        let exists = self.provider.populate(&mut existing).await?;

        let changes = supported.changes(&existing);
        let plan = Plan {
            desired: supported,
            existing,
            exists,
            changes,
        };

        let (creates, updates, deletes) = plan.counts();
        info!(
            "Plan for {}: {} create(s), {} update(s), {} delete(s) (exists={})",
            plan.desired.name(),
            creates,
            updates,
            deletes,
            exists
        );
        self.emit_event(SyncEvent::PlanComputed {
            zone: plan.desired.name().to_string(),
            creates,
            updates,
            deletes,
        });

        Ok(plan)
    }

    /// Apply a previously computed plan once, without retrying
    pub async fn apply(&self, plan: &Plan) -> Result<ApplyReport> {
        self.provider.apply(plan).await
    }

    /// Bring the provider's copy of `desired` up to date.
    ///
    /// Transient failures are retried up to `max_retries` times with
    /// exponential backoff; every retry re-plans against fresh remote state.
    pub async fn sync(&self, desired: &Zone) -> Result<SyncOutcome> {
        let zone = desired.name().to_string();
        let mut attempt = 0;

        loop {
            match self.sync_once(desired, attempt).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    let will_retry = e.is_transient() && attempt < self.config.max_retries;
                    warn!("Sync attempt {} for {} failed: {}", attempt, zone, e);
                    self.emit_event(SyncEvent::ApplyFailed {
                        zone: zone.clone(),
                        attempt,
                        error: e.to_string(),
                        will_retry,
                    });

                    if !will_retry {
                        return Err(e);
                    }

                    let delay = self.retry_delay(attempt);
                    debug!("Retrying {} in {:?}", zone, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn sync_once(&self, desired: &Zone, attempt: usize) -> Result<SyncOutcome> {
        let plan = self.plan(desired.clone()).await?;
        let zone = plan.desired.name().to_string();

        if plan.is_empty() {
            info!("{} is up to date", zone);
            self.emit_event(SyncEvent::NoChanges { zone });
            return Ok(SyncOutcome::NoChanges);
        }

        if self.config.dry_run {
            for change in &plan.changes {
                info!("[DRY-RUN] {}: {}", zone, change);
            }
            self.emit_event(SyncEvent::DryRun {
                zone,
                changes: plan.changes.len(),
            });
            return Ok(SyncOutcome::Planned(plan));
        }

        self.emit_event(SyncEvent::ApplyStarted {
            zone: zone.clone(),
            attempt,
            changes: plan.changes.len(),
        });

        let report = self.apply(&plan).await?;

        info!(
            "Applied {} change(s) to {} in {} batch(es)",
            report.changes,
            zone,
            report.batches.len()
        );
        self.emit_event(SyncEvent::ApplySucceeded {
            zone,
            changes: report.changes,
            batches: report.batches.len(),
        });

        Ok(SyncOutcome::Applied(report))
    }

    /// Backoff before retry number `attempt + 1`
    fn retry_delay(&self, attempt: usize) -> Duration {
        let factor = 1u64 << attempt.min(16);
        let secs = self
            .config
            .retry_delay_secs
            .saturating_mul(factor)
            .min(self.config.max_retry_delay_secs);
        Duration::from_secs(secs)
    }

    /// Emit a sync event
    fn emit_event(&self, event: SyncEvent) {
        // Never block a sync on a slow event consumer
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
