// # zonesync - DNS zone synchronizer
//
// Thin integration layer: reads configuration from the environment, builds
// the provider from the registry and hands every zone file to the
// `ZoneSynchronizer`. Planning, batching and retry live in the library
// crates, never here.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### DNS Provider
// - `ZONESYNC_PROVIDER_TYPE`: Provider type (dnsmadeeasy)
// - `ZONESYNC_API_KEY`: API key
// - `ZONESYNC_SECRET_KEY`: Secret key used to sign requests
// - `ZONESYNC_SANDBOX`: Use the sandbox API (true/false, default false)
// - `ZONESYNC_BATCH_SIZE`: Records per bulk request (default 200)
// - `ZONESYNC_STRICT_SUPPORTS`: Reject unrepresentable values (default true)
// - `ZONESYNC_RATELIMIT_DELAY_MS`: Pause after each request (default 0)
// - `ZONESYNC_TIMEOUT_SECS`: HTTP request timeout (default 30)
//
// ### Zones
// - `ZONESYNC_ZONE_FILES`: Comma-separated list of JSON zone files
// - `ZONESYNC_MODE`: `dry-run` (default) or `apply`
// - `ZONESYNC_MAX_CONCURRENT_ZONES`: Zones synchronized at once (default 4)
//
// ### Engine
// - `ZONESYNC_MAX_RETRIES`: Retries after a transient failure (default 3)
// - `ZONESYNC_RETRY_DELAY_SECS`: Initial backoff delay (default 1)
// - `ZONESYNC_MAX_RETRY_DELAY_SECS`: Backoff cap (default 30, or the
//   initial delay when that is larger)
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export ZONESYNC_API_KEY=your_api_key
// export ZONESYNC_SECRET_KEY=your_secret_key
// export ZONESYNC_ZONE_FILES=zones/example.com.json,zones/example.net.json
// export ZONESYNC_MODE=apply
//
// zonesync
// ```

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{
    DnsProvider, EngineConfig, ProviderConfig, ProviderRegistry, SyncConfig, SyncOutcome, Zone,
    ZoneSynchronizer, load_zone_file,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// Every zone is in sync (or was planned, in dry-run mode)
    Success = 0,
    /// Configuration error, unreadable zone file or startup failure
    ConfigError = 1,
    /// At least one zone failed to synchronize
    SyncError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    provider_type: String,
    api_key: String,
    secret_key: String,
    sandbox: bool,
    batch_size: usize,
    strict_supports: bool,
    ratelimit_delay_ms: u64,
    timeout_secs: u64,
    zone_files: Vec<PathBuf>,
    mode: String,
    max_concurrent_zones: usize,
    max_retries: usize,
    retry_delay_secs: u64,
    max_retry_delay_secs: u64,
    log_level: String,
}

// Custom Debug implementation that hides the keys
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("provider_type", &self.provider_type)
            .field("api_key", &"<REDACTED>")
            .field("secret_key", &"<REDACTED>")
            .field("sandbox", &self.sandbox)
            .field("batch_size", &self.batch_size)
            .field("zone_files", &self.zone_files)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let retry_delay_secs = parse_var(&lookup, "ZONESYNC_RETRY_DELAY_SECS", 1)?;

        Ok(Self {
            provider_type: lookup("ZONESYNC_PROVIDER_TYPE")
                .unwrap_or_else(|| "dnsmadeeasy".to_string()),
            api_key: lookup("ZONESYNC_API_KEY").unwrap_or_default(),
            secret_key: lookup("ZONESYNC_SECRET_KEY").unwrap_or_default(),
            sandbox: parse_var(&lookup, "ZONESYNC_SANDBOX", false)?,
            batch_size: parse_var(&lookup, "ZONESYNC_BATCH_SIZE", 200)?,
            strict_supports: parse_var(&lookup, "ZONESYNC_STRICT_SUPPORTS", true)?,
            ratelimit_delay_ms: parse_var(&lookup, "ZONESYNC_RATELIMIT_DELAY_MS", 0)?,
            timeout_secs: parse_var(&lookup, "ZONESYNC_TIMEOUT_SECS", 30)?,
            zone_files: lookup("ZONESYNC_ZONE_FILES")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect(),
            mode: lookup("ZONESYNC_MODE").unwrap_or_else(|| "dry-run".to_string()),
            max_concurrent_zones: parse_var(&lookup, "ZONESYNC_MAX_CONCURRENT_ZONES", 4)?,
            max_retries: parse_var(&lookup, "ZONESYNC_MAX_RETRIES", 3)?,
            retry_delay_secs,
            max_retry_delay_secs: parse_var(
                &lookup,
                "ZONESYNC_MAX_RETRY_DELAY_SECS",
                retry_delay_secs.max(30),
            )?,
            log_level: lookup("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.provider_type.as_str() {
            "dnsmadeeasy" => {}
            _ => anyhow::bail!(
                "ZONESYNC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: dnsmadeeasy",
                self.provider_type
            ),
        }

        // Keys, zone files, batch size, timeout and backoff bounds
        self.sync_config().validate().map_err(|e| {
            anyhow::anyhow!("{}. Check the ZONESYNC_* environment variables.", e)
        })?;

        // Common mistake: copying the example verbatim
        for (name, value) in [
            ("ZONESYNC_API_KEY", &self.api_key),
            ("ZONESYNC_SECRET_KEY", &self.secret_key),
        ] {
            let lower = value.to_lowercase();
            if lower.starts_with("your_") || lower.contains("replace_me") {
                anyhow::bail!(
                    "{} appears to be a placeholder. \
                    Use the key from your DNS Made Easy account.",
                    name
                );
            }
        }

        match self.mode.as_str() {
            "apply" | "dry-run" => {}
            _ => anyhow::bail!(
                "ZONESYNC_MODE '{}' is not valid. Valid modes: apply, dry-run",
                self.mode
            ),
        }

        if !(1..=64).contains(&self.max_concurrent_zones) {
            anyhow::bail!(
                "ZONESYNC_MAX_CONCURRENT_ZONES must be between 1 and 64. Got: {}",
                self.max_concurrent_zones
            );
        }

        if self.max_retries > 10 {
            anyhow::bail!(
                "ZONESYNC_MAX_RETRIES must be between 0 and 10. Got: {}",
                self.max_retries
            );
        }

        if self.retry_delay_secs > 300 {
            anyhow::bail!(
                "ZONESYNC_RETRY_DELAY_SECS must be at most 300 seconds. Got: {}",
                self.retry_delay_secs
            );
        }

        if self.max_retry_delay_secs > 3600 {
            anyhow::bail!(
                "ZONESYNC_MAX_RETRY_DELAY_SECS must be at most 3600 seconds. Got: {}",
                self.max_retry_delay_secs
            );
        }

        if self.timeout_secs > 300 {
            anyhow::bail!(
                "ZONESYNC_TIMEOUT_SECS must be at most 300 seconds. Got: {}",
                self.timeout_secs
            );
        }

        if parse_level(&self.log_level).is_none() {
            anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::DnsMadeEasy {
            api_key: self.api_key.clone(),
            secret_key: self.secret_key.clone(),
            sandbox: self.sandbox,
            batch_size: self.batch_size,
            strict_supports: self.strict_supports,
            ratelimit_delay_ms: self.ratelimit_delay_ms,
            timeout_secs: self.timeout_secs,
            base_url: None,
        }
    }

    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_retries: self.max_retries,
            retry_delay_secs: self.retry_delay_secs,
            max_retry_delay_secs: self.max_retry_delay_secs,
            dry_run: self.mode == "dry-run",
            ..EngineConfig::default()
        }
    }

    /// The library-level configuration handed to the synchronizer
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            provider: self.provider_config(),
            zone_files: self
                .zone_files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            engine: self.engine_config(),
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", name, raw, e)),
        _ => Ok(default),
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesync ({} mode)", config.mode);
    info!("Configuration loaded: {} zone file(s)", config.zone_files.len());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    rt.block_on(run(config.sync_config(), config.max_concurrent_zones)).into()
}

/// Load every zone and synchronize them
async fn run(config: SyncConfig, max_concurrent_zones: usize) -> ZonesyncExitCode {
    let mut zones = Vec::with_capacity(config.zone_files.len());
    for path in &config.zone_files {
        match load_zone_file(path).await {
            Ok(zone) => {
                info!("Loaded {} ({} records) from {}", zone.name(), zone.len(), path);
                zones.push(zone);
            }
            Err(e) => {
                error!("{}", e);
                return ZonesyncExitCode::ConfigError;
            }
        }
    }

    let sync = match build_synchronizer(&config) {
        Ok(sync) => Arc::new(sync),
        Err(e) => {
            error!("Startup error: {}", e);
            return ZonesyncExitCode::ConfigError;
        }
    };

    let failures = sync_zones(sync, zones, max_concurrent_zones).await;
    if failures == 0 {
        info!("All zones synchronized");
        ZonesyncExitCode::Success
    } else {
        error!("{} zone(s) failed to synchronize", failures);
        ZonesyncExitCode::SyncError
    }
}

/// Build the provider from the registry and wrap it in a synchronizer
fn build_synchronizer(config: &SyncConfig) -> Result<ZoneSynchronizer> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "dnsmadeeasy")]
    {
        debug!("Registering DNS Made Easy provider");
        zonesync_provider_dnsmadeeasy::register(&registry);
    }

    let provider: Arc<dyn DnsProvider> =
        Arc::from(registry.create_provider(config.provider.type_name(), &config.provider)?);

    let (sync, mut events) = ZoneSynchronizer::new(provider, config.engine.clone())?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Sync event: {:?}", event);
        }
    });

    Ok(sync)
}

/// Synchronize zones concurrently, at most `max_concurrent` at a time
///
/// Returns the number of zones that failed. A shutdown signal aborts the
/// zones still in flight and counts them as failed.
async fn sync_zones(sync: Arc<ZoneSynchronizer>, zones: Vec<Zone>, max_concurrent: usize) -> usize {
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut tasks = JoinSet::new();

    for zone in zones {
        let sync = sync.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = sync.sync(&zone).await;
            (zone.name().to_string(), result)
        });
    }

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    let mut shutdown_armed = true;
    let mut failures = 0;
    loop {
        tokio::select! {
            joined = tasks.join_next() => match joined {
                None => break,
                Some(Ok((zone, Ok(outcome)))) => report(&zone, &outcome),
                Some(Ok((zone, Err(e)))) => {
                    error!("{}: {}", zone, e);
                    failures += 1;
                }
                Some(Err(e)) => {
                    error!("Zone task failed: {}", e);
                    failures += 1;
                }
            },
            signal = &mut shutdown, if shutdown_armed => match signal {
                Ok(signal) => {
                    warn!("Received {}, aborting {} zone(s) in flight", signal, tasks.len());
                    failures += tasks.len();
                    tasks.abort_all();
                    break;
                }
                Err(e) => {
                    warn!("{}", e);
                    shutdown_armed = false;
                }
            }
        }
    }

    failures
}

fn report(zone: &str, outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::NoChanges => info!("{}: up to date", zone),
        SyncOutcome::Planned(plan) => {
            let (creates, updates, deletes) = plan.counts();
            info!(
                "{}: would create {}, update {}, delete {} (dry-run)",
                zone, creates, updates, deletes
            );
        }
        SyncOutcome::Applied(report) => info!(
            "{}: applied {} change(s) in {} batch(es){}",
            zone,
            report.changes,
            report.batches.len(),
            if report.zone_created { ", zone created" } else { "" }
        ),
    }
}

/// Wait for a shutdown signal (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Wait for a shutdown signal (SIGINT only)
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
