// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the
// failover service.
//
// ## Behavior
//
// - ✅ Lists every A/AAAA record in one zone, following pagination
// - ✅ Filters by an allow-list of record names (empty = all)
// - ✅ Rewrites a record by ID, keeping its type, name and proxy flag
// - ✅ HTTP timeout configured (default 15 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (a failed record is picked up on the next decision)
// - ❌ NO caching (records are cached by the engine)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token or zone is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=N&per_page=100`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Zone Details: GET `/zones/:zone_id`

use async_trait::async_trait;
use failover_core::config::ProviderConfig;
use failover_core::traits::{DnsProvider, DnsRecord, RecordType, UpdateResult};
use failover_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Records requested per list page
const PAGE_SIZE: u32 = 100;

const PROVIDER: &str = "cloudflare";

/// Cloudflare DNS provider
///
/// Stateless and single-shot: one HTTP request per record update, no retries.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (record listing, zone check)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone holding the managed records
    zone_id: String,

    /// API root, overridable for tests
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Zone holding the managed records
    /// - `timeout`: Bound on every API request
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token or zone is empty, or if
    /// the HTTP client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: impl Into<String>,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        let zone_id = zone_id.into();

        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Build a provider from the typed configuration
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no changes will be made"
                    );
                }
                Self::new(api_token.clone(), zone_id.clone(), timeout, *dry_run)
            }
        }
    }

    /// Point the provider at a different API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, self.zone_id)
    }

    /// GET a URL and decode the Cloudflare envelope
    async fn get<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<Envelope<T>> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", context, e)))?;

        decode(response, context).await
    }

    /// Fetch one page of records
    async fn list_page(&self, page: u32) -> Result<(Vec<CfRecord>, u32)> {
        let url = format!(
            "{}?page={}&per_page={}",
            self.records_url(),
            page,
            PAGE_SIZE
        );
        let envelope: Envelope<Vec<CfRecord>> = self.get(&url, "list records").await?;

        let total_pages = envelope
            .result_info
            .as_ref()
            .map(|info| info.total_pages)
            .unwrap_or(1);

        Ok((envelope.result.unwrap_or_default(), total_pages))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_records(&self, names: &[String]) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let (batch, total_pages) = self.list_page(page).await?;
            let batch_len = batch.len();

            for raw in batch {
                let Some(record_type) = RecordType::from_wire(&raw.record_type) else {
                    continue;
                };
                if !names.is_empty() && !names.iter().any(|n| n == &raw.name) {
                    continue;
                }
                records.push(DnsRecord {
                    id: raw.id,
                    name: raw.name,
                    record_type,
                    content: raw.content,
                    ttl: raw.ttl,
                    proxied: raw.proxied,
                });
            }

            if batch_len == 0 || page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Cloudflare zone {} has {} managed record(s)",
            self.zone_id,
            records.len()
        );

        for name in names {
            if !records.iter().any(|r| &r.name == name) {
                tracing::warn!("Configured record {} not found in zone", name);
            }
        }

        Ok(records)
    }

    async fn update_record(
        &self,
        record: &DnsRecord,
        new_ip: IpAddr,
        ttl: u32,
    ) -> Result<UpdateResult> {
        if !record.record_type.accepts(&new_ip) {
            return Err(Error::invalid_input(format!(
                "cannot write {} to {} record {}",
                new_ip, record.record_type, record.name
            )));
        }

        let url = format!("{}/{}", self.records_url(), record.id);
        let payload = UpdatePayload {
            record_type: record.record_type.as_str(),
            name: &record.name,
            content: new_ip.to_string(),
            ttl,
            proxied: record.proxied,
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(UpdateResult::Simulated { new_ip });
        }

        tracing::debug!(
            "Updating Cloudflare record {} ({}) -> {}",
            record.name,
            record.id,
            new_ip
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("update {}: request failed: {}", record.name, e)))?;

        let _: Envelope<CfRecord> = decode(response, &format!("update {}", record.name)).await?;

        Ok(UpdateResult::Updated {
            previous_content: record.content.clone(),
            new_ip,
        })
    }

    async fn check_access(&self) -> Result<()> {
        let url = format!("{}/zones/{}", self.api_base, self.zone_id);
        let envelope: Envelope<Zone> = self.get(&url, "zone check").await?;

        if let Some(zone) = envelope.result {
            tracing::debug!("Cloudflare zone {} reachable ({})", zone.id, zone.name);
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Standard Cloudflare v4 response wrapper
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default = "first_page")]
    total_pages: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct CfRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default)]
    proxied: bool,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: String,
    ttl: u32,
    proxied: bool,
}

/// Check the status and decode the body of an API response
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<Envelope<T>> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(status_error(status.as_u16(), context, &error_text));
    }

    let envelope: Envelope<T> = response
        .json()
        .await
        .map_err(|e| Error::provider(PROVIDER, format!("{}: failed to parse response: {}", context, e)))?;

    if !envelope.success {
        let messages: Vec<String> = envelope
            .errors
            .iter()
            .map(|e| format!("[{}] {}", e.code, e.message))
            .collect();
        return Err(Error::provider(
            PROVIDER,
            format!("{}: API reported failure: {}", context, messages.join("; ")),
        ));
    }

    Ok(envelope)
}

/// Map a non-success HTTP status to an error
fn status_error(status: u16, context: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions (status {})",
            context, status
        )),
        404 => Error::not_found(format!("{}: zone or record not found", context)),
        409 => Error::provider(
            PROVIDER,
            format!("{}: conflict, record is being changed elsewhere", context),
        ),
        429 => Error::rate_limited(format!("{}: rate limit exceeded", context)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("{}: server error (transient): {} - {}", context, status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{}: {} - {}", context, status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> CloudflareProvider {
        CloudflareProvider::new("test_token", "zone", DEFAULT_HTTP_TIMEOUT, false).unwrap()
    }

    #[test]
    fn empty_credentials_rejected() {
        assert!(CloudflareProvider::new("", "zone", DEFAULT_HTTP_TIMEOUT, false).is_err());
        assert!(CloudflareProvider::new("token", "", DEFAULT_HTTP_TIMEOUT, false).is_err());
    }

    #[test]
    fn from_config_carries_dry_run() {
        let config = ProviderConfig::Cloudflare {
            api_token: "token".to_string(),
            zone_id: "zone".to_string(),
            dry_run: true,
        };
        let provider = CloudflareProvider::from_config(&config, DEFAULT_HTTP_TIMEOUT).unwrap();
        assert!(provider.is_dry_run());
        assert_eq!(provider.provider_name(), "cloudflare");
    }

    #[test]
    fn api_token_not_exposed_in_debug() {
        let provider =
            CloudflareProvider::new("secret_token_12345", "zone", DEFAULT_HTTP_TIMEOUT, false)
                .unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareProvider"));
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let provider = provider().with_api_base("http://127.0.0.1:9999/");
        assert_eq!(
            provider.records_url(),
            "http://127.0.0.1:9999/zones/zone/dns_records"
        );
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status_error(401, "x", ""), Error::Authentication(_)));
        assert!(matches!(status_error(403, "x", ""), Error::Authentication(_)));
        assert!(matches!(status_error(404, "x", ""), Error::NotFound(_)));
        assert!(matches!(status_error(429, "x", ""), Error::RateLimited(_)));
        assert!(matches!(
            status_error(409, "x", ""),
            Error::Provider { .. }
        ));
        match status_error(502, "x", "bad gateway") {
            Error::Provider { message, .. } => assert!(message.contains("transient")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn update_payload_shape() {
        let payload = UpdatePayload {
            record_type: "A",
            name: "app.example.com",
            content: "192.0.2.2".to_string(),
            ttl: 60,
            proxied: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "A",
                "name": "app.example.com",
                "content": "192.0.2.2",
                "ttl": 60,
                "proxied": true
            })
        );
    }

    #[tokio::test]
    async fn family_mismatch_fails_before_any_request() {
        // Unroutable base: a request would fail with an HTTP error instead.
        let provider = provider().with_api_base("http://127.0.0.1:1");
        let record = DnsRecord {
            id: "1".to_string(),
            name: "v6.example.com".to_string(),
            record_type: RecordType::Aaaa,
            content: "2001:db8::1".to_string(),
            ttl: 60,
            proxied: false,
        };

        let err = provider
            .update_record(&record, "192.0.2.2".parse().unwrap(), 60)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
