// # DNS Made Easy API client
//
// Thin, signed HTTP access to the v2.0 managed DNS API. The client maps HTTP
// status codes to core errors and never retries; retry policy belongs to the
// synchronizer.
//
// ## Authentication
//
// Every request carries three headers:
//
// ```http
// x-dnsme-apiKey: <api key>
// x-dnsme-requestDate: Mon, 05 Oct 2026 12:00:00 +0000
// x-dnsme-hmac: hex(HMAC-SHA1(secret key, request date))
// ```
//
// ## Endpoints
//
// - List domains: GET `/`
// - Get domain: GET `/id/{domain}`
// - Create domain: POST `/`
// - List records: GET `/{zone_id}/records`
// - Bulk delete: DELETE `/{zone_id}/records?ids=..&ids=..`
// - Bulk create: POST `/{zone_id}/records/createMulti`

use crate::wire::{ApiRecord, Domain, ErrorBody, NewDomain, Page, RecordParams};
use hmac::{Hmac, Mac};
use reqwest::{Method, RequestBuilder, Response};
use sha1::Sha1;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use zonesync_core::{Batch, BatchProgress, Error, Result};

/// Production API base URL
pub const PRODUCTION_BASE_URL: &str = "https://api.dnsmadeeasy.com/V2.0/dns/managed";

/// Sandbox API base URL
pub const SANDBOX_BASE_URL: &str = "https://api.sandbox.dnsmadeeasy.com/V2.0/dns/managed";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!(
    "zonesync-provider-dnsmadeeasy/",
    env!("CARGO_PKG_VERSION")
);

/// Record types whose value is a hostname, relative to the zone when it has
/// no trailing dot
const HOSTNAME_TYPES: [&str; 5] = ["ALIAS", "CNAME", "MX", "NS", "SRV"];

type HmacSha1 = Hmac<Sha1>;

/// Connection settings for [`DnsMadeEasyClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Use the sandbox API
    pub sandbox: bool,
    /// Explicit base URL, overrides `sandbox`
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Pause after every successful request
    pub ratelimit_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            sandbox: false,
            base_url: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
            ratelimit_delay: Duration::ZERO,
        }
    }
}

impl ClientOptions {
    fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.sandbox => SANDBOX_BASE_URL.to_string(),
            None => PRODUCTION_BASE_URL.to_string(),
        }
    }
}

/// DNS Made Easy API client
///
/// The account's domain list is fetched once and cached as
/// `"name." -> zone id`; domains created through [`domain_create`] are added
/// to it.
///
/// [`domain_create`]: DnsMadeEasyClient::domain_create
pub struct DnsMadeEasyClient {
    /// ⚠️ NEVER log this value
    api_key: String,

    /// ⚠️ NEVER log this value
    secret_key: String,

    base_url: String,
    ratelimit_delay: Duration,
    client: reqwest::Client,
    domains: Mutex<Option<HashMap<String, u64>>>,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for DnsMadeEasyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsMadeEasyClient")
            .field("api_key", &"<REDACTED>")
            .field("secret_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("ratelimit_delay", &self.ratelimit_delay)
            .finish()
    }
}

impl DnsMadeEasyClient {
    /// Create a new client
    ///
    /// Fails fast on empty credentials or when the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();

        if api_key.is_empty() {
            return Err(Error::config("DNS Made Easy api_key cannot be empty"));
        }
        if secret_key.is_empty() {
            return Err(Error::config("DNS Made Easy secret_key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            secret_key,
            base_url: options.resolved_base_url(),
            ratelimit_delay: options.ratelimit_delay,
            client,
            domains: Mutex::new(None),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All domains in the account, keyed by `"name."`
    pub async fn domains(&self) -> Result<HashMap<String, u64>> {
        let mut cache = self.domains.lock().await;
        if let Some(domains) = cache.as_ref() {
            return Ok(domains.clone());
        }

        let response = self.send(self.request(Method::GET, "/")?, "list domains").await?;
        let page: Page<Domain> = parse(response).await?;

        let domains: HashMap<String, u64> = page
            .data
            .into_iter()
            .map(|d| (format!("{}.", d.name), d.id))
            .collect();
        tracing::debug!("Fetched {} domain(s)", domains.len());

        *cache = Some(domains.clone());
        Ok(domains)
    }

    /// Zone id of `zone_name` (`"example.com."`), if the account has it
    pub async fn zone_id(&self, zone_name: &str) -> Result<Option<u64>> {
        Ok(self.domains().await?.get(zone_name).copied())
    }

    /// Look up one domain by name (`"example.com"`, no trailing dot)
    ///
    /// Returns `Error::NotFound` when the account has no such domain.
    pub async fn domain(&self, name: &str) -> Result<Domain> {
        let path = format!("/id/{}", name);
        let response = self
            .send(self.request(Method::GET, &path)?, "get domain")
            .await?;
        parse(response).await
    }

    /// Create a domain (`"example.com"`, no trailing dot)
    pub async fn domain_create(&self, name: &str) -> Result<Domain> {
        let request = self
            .request(Method::POST, "/")?
            .json(&NewDomain { name });
        let response = self.send(request, "create domain").await?;
        let domain: Domain = parse(response).await?;

        tracing::info!("Created domain {} (id {})", name, domain.id);

        let mut cache = self.domains.lock().await;
        if let Some(domains) = cache.as_mut() {
            domains.insert(format!("{}.", name), domain.id);
        } else {
            let mut domains = HashMap::new();
            domains.insert(format!("{}.", name), domain.id);
            *cache = Some(domains);
        }

        Ok(domain)
    }

    /// Records of `zone_name` (`"example.com."`), normalized to the zone model
    ///
    /// `ANAME` is reported as `ALIAS` and relative hostnames in
    /// ALIAS/CNAME/MX/NS/SRV values are made absolute (an empty value is the
    /// zone apex). Returns `None` when the account has no such zone.
    pub async fn records(&self, zone_name: &str) -> Result<Option<Vec<ApiRecord>>> {
        let zone_id = match self.zone_id(zone_name).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let path = format!("/{}/records", zone_id);
        let response = self
            .send(self.request(Method::GET, &path)?, "list records")
            .await?;
        let page: Page<ApiRecord> = parse(response).await?;

        let records = page
            .data
            .into_iter()
            .map(|record| normalize(record, zone_name))
            .collect();
        Ok(Some(records))
    }

    /// Delete record ids batch by batch, marking each batch in `progress`
    ///
    /// Stops at the first failed batch; batches before it stay deleted.
    pub async fn record_multi_delete(
        &self,
        zone_id: u64,
        batches: &[Batch<u64>],
        progress: &mut BatchProgress,
    ) -> Result<()> {
        let path = format!("/{}/records", zone_id);
        for batch in batches {
            let ids: Vec<(&str, String)> =
                batch.items.iter().map(|id| ("ids", id.to_string())).collect();
            let request = self.request(Method::DELETE, &path)?.query(&ids);
            self.send(request, "delete records").await?;

            tracing::debug!("Deleted batch {} ({} records)", batch.index, batch.len());
            progress.mark_applied();
        }
        Ok(())
    }

    /// Create records batch by batch, marking each batch in `progress`
    ///
    /// Stops at the first failed batch; batches before it stay created.
    pub async fn record_multi_create(
        &self,
        zone_id: u64,
        batches: &[Batch<RecordParams>],
        progress: &mut BatchProgress,
    ) -> Result<()> {
        let path = format!("/{}/records/createMulti", zone_id);
        for batch in batches {
            let request = self.request(Method::POST, &path)?.json(&batch.items);
            self.send(request, "create records").await?;

            tracing::debug!("Created batch {} ({} records)", batch.index, batch.len());
            progress.mark_applied();
        }
        Ok(())
    }

    /// Build a signed request for `path` under the base URL
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let now = request_date();
        let hmac = sign(&self.secret_key, &now)?;
        let url = format!("{}{}", self.base_url, path);

        Ok(self
            .client
            .request(method, url)
            .header("x-dnsme-apiKey", &self.api_key)
            .header("x-dnsme-hmac", hmac)
            .header("x-dnsme-requestDate", now))
    }

    /// Send a request and map non-success statuses to errors
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} returned {}", what, status);
            return Err(status_error(response).await);
        }

        if !self.ratelimit_delay.is_zero() {
            tokio::time::sleep(self.ratelimit_delay).await;
        }

        Ok(response)
    }
}

/// Current time in the format the API signs
fn request_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S +0000")
        .to_string()
}

/// Hex encoded HMAC-SHA1 of `message` under `secret`
pub(crate) fn sign(secret: &str, message: &str) -> Result<String> {
    let mut mac = <HmacSha1 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::config(format!("Invalid secret key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

async fn status_error(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    match status {
        400 => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if !parsed.error.is_empty() => Error::BadRequest(parsed.error),
            _ => Error::BadRequest(vec![body]),
        },
        401 | 403 => Error::Unauthorized,
        404 => Error::NotFound,
        _ => Error::api(status, body),
    }
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;
    Ok(serde_json::from_slice(&body)?)
}

fn normalize(mut record: ApiRecord, zone_name: &str) -> ApiRecord {
    if record.record_type == "ANAME" {
        record.record_type = "ALIAS".to_string();
    }

    if HOSTNAME_TYPES.contains(&record.record_type.as_str()) {
        if record.value.is_empty() {
            record.value = zone_name.to_string();
        } else if !record.value.ends_with('.') {
            record.value = format!("{}.{}", record.value, zone_name);
        }
    }

    record
}
