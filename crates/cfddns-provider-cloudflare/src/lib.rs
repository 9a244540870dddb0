// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare v4 binding of `DnsProvider` for the
// cfddns agent.
//
// ## Behaviour
//
// - ✅ One logical API operation per call (listings follow pagination)
// - ✅ Full error propagation to the engine
// - ✅ HTTP timeout configured (10 seconds by default)
// - ✅ Specific error handling for HTTP status codes (401, 403, 404, 429, 5xx)
// - ✅ Envelope-level failures (`success: false`) reported as `Ok(false)` on upsert
// - ❌ NO retry logic (a failed call is retried by the next scheduled run)
// - ❌ NO caching (the resolver decides what to look up)
// - ❌ NO record creation (records must already exist in the zone)
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if credentials are empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones/?page=N&per_page=50`
// - List DNS Records: GET `/zones/:zone_id/dns_records/?page=N&per_page=50`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfddns_core::config::Credentials;
use cfddns_core::traits::{DnsProvider, DnsRecord, RecordUpdate, Zone};
use cfddns_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (10 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size requested from listing endpoints
const PAGE_SIZE: u32 = 50;

/// Response envelope shared by every v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    /// Absent on some listing responses
    success: Option<bool>,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
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
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RecordEntry {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    content: String,
}

/// Join the provider's error messages into one line
fn describe_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details returned".to_string();
    }
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Cloudflare DNS provider
///
/// Authenticates with the legacy global API key (`X-Auth-Email` /
/// `X-Auth-Key`), which is what the stored configuration document carries.
pub struct CloudflareProvider {
    /// Account email
    email: String,

    /// Global API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Account email and global API key
    /// - `api_base`: API base URL (normally [`CLOUDFLARE_API_BASE`])
    /// - `timeout`: Per-request timeout
    ///
    /// # Errors
    ///
    /// - `Error::Config` if either credential is empty
    /// - `Error::Provider` if the HTTP client cannot be built
    pub fn new(credentials: &Credentials, api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        if credentials.email.trim().is_empty() || credentials.api_key.trim().is_empty() {
            return Err(Error::config("missing Cloudflare auth credentials"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::provider("cloudflare", format!("Failed to build HTTP client: {}", e)))?;

        let api_base = api_base.into().trim_end_matches('/').to_string();

        Ok(Self {
            email: credentials.email.clone(),
            api_key: credentials.api_key.clone(),
            api_base,
            client,
        })
    }

    /// Start a request carrying the auth headers
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Auth-Email", &self.email)
            .header("X-Auth-Key", &self.api_key)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Map a non-2xx response to an error, pass a 2xx response through
    async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());

        Err(match status.as_u16() {
            401 | 403 => Error::auth(format!(
                "Invalid API key or insufficient permissions. Status: {}",
                status
            )),
            404 => Error::not_found(format!("{}: {}", context, status)),
            429 => Error::rate_limited(format!(
                "Rate limit exceeded. Please retry later. Status: {}",
                status
            )),
            500..=599 => Error::provider(
                "cloudflare",
                format!("Cloudflare server error (transient): {} - {}", status, error_text),
            ),
            _ => Error::provider(
                "cloudflare",
                format!("{} failed: {} - {}", context, status, error_text),
            ),
        })
    }

    /// Fetch every page of a listing endpoint
    async fn list_all<T: DeserializeOwned>(&self, url: &str, context: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self
                .request(reqwest::Method::GET, url)
                .query(&[("page", page), ("per_page", PAGE_SIZE)])
                .send()
                .await
                .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

            let response = Self::check_status(response, context).await?;

            let envelope: Envelope<Vec<T>> = response
                .json()
                .await
                .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {}", e)))?;

            if envelope.success == Some(false) {
                return Err(Error::provider(
                    "cloudflare",
                    format!("{} failed: {}", context, describe_errors(&envelope.errors)),
                ));
            }

            let batch = envelope.result.ok_or_else(|| {
                Error::provider("cloudflare", "Invalid response format: result is missing")
            })?;
            items.extend(batch);

            let total_pages = envelope
                .result_info
                .and_then(|info| info.total_pages)
                .unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List every zone visible to the credentials
    ///
    /// ```http
    /// GET /zones/?page=1&per_page=50
    /// X-Auth-Email: <email>
    /// X-Auth-Key: <key>
    /// ```
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let url = format!("{}/zones/", self.api_base);
        let zones: Vec<ZoneEntry> = self.list_all(&url, "Zone listing").await?;

        tracing::debug!("Cloudflare lists {} zone(s)", zones.len());
        Ok(zones
            .into_iter()
            .map(|z| Zone { id: z.id, name: z.name })
            .collect())
    }

    /// List every record in a zone
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records/?page=1&per_page=50
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let url = format!("{}/zones/{}/dns_records/", self.api_base, zone_id);
        let records: Vec<RecordEntry> = self.list_all(&url, "Record listing").await?;

        tracing::debug!("Zone {} lists {} record(s)", zone_id, records.len());
        Ok(records
            .into_iter()
            .map(|r| DnsRecord {
                id: r.id,
                name: r.name,
                record_type: r.record_type,
                content: r.content,
            })
            .collect())
    }

    /// Overwrite an existing record with the new address
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "id": "<record_id>",
    ///   "type": "A" or "AAAA",
    ///   "name": "<host name>",
    ///   "content": "1.2.3.4"
    /// }
    /// ```
    async fn upsert_record(&self, update: &RecordUpdate) -> Result<bool> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, update.zone_id, update.record_id
        );

        let payload = serde_json::json!({
            "id": update.record_id,
            "type": update.record_type.as_str(),
            "name": update.name,
            "content": update.content,
        });

        tracing::debug!("PUT {} ({} -> {})", url, update.record_type, update.content);

        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        let response = Self::check_status(response, "Record update").await?;

        let envelope: Envelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {}", e)))?;

        let success = envelope.success.unwrap_or(false);
        if !success {
            tracing::warn!(
                "Cloudflare rejected update of record {}: {}",
                update.record_id,
                describe_errors(&envelope.errors)
            );
        }

        Ok(success)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
