// # DNS Provider Trait
//
// Defines the interface for the provider's zone directory and record updates.
//
// ## Implementations
//
// - Cloudflare: `cfddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::traits::{DnsProvider, RecordUpdate};
// use cfddns_core::config::RecordType;
//
// let provider = /* DnsProvider implementation */;
// let zones = provider.list_zones().await?;
// let applied = provider.upsert_record(&RecordUpdate {
//     zone_id: "z1".into(),
//     record_id: "r1".into(),
//     record_type: RecordType::A,
//     name: "www".into(),
//     content: "1.2.3.4".into(),
// }).await?;
// ```

use async_trait::async_trait;

use crate::config::RecordType;

/// A zone as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// The zone ID (provider-specific)
    pub id: String,
    /// The zone name (e.g. "example.com")
    pub name: String,
}

/// A DNS record as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type as the provider reports it ("A", "AAAA", "MX", ...)
    pub record_type: String,
    /// Record content (the address for A/AAAA)
    pub content: String,
}

/// Parameters of a single upsert call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub zone_id: String,
    pub record_id: String,
    pub record_type: RecordType,
    /// Host name as configured (the label, not the FQDN)
    pub name: String,
    /// New address
    pub content: String,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// Providers execute exactly one logical API operation per call:
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ❌ Retry (a failed call is retried by the next scheduled run)
/// - ❌ Touch the configuration or decide whether an update is needed
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every zone visible to the credentials
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Zone>)`: All zones, across pages
    /// - `Err(Error)`: Transport, HTTP status or authentication failure
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List every record in a zone
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Provider zone identifier
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Update an existing record, keyed by its identifier
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The provider confirmed the update
    /// - `Ok(false)`: The provider answered but reported a logical failure
    /// - `Err(Error)`: Transport or HTTP failure
    ///
    /// Callers treat `Ok(false)` and `Err` the same way: the update did not
    /// happen.
    async fn upsert_record(&self, update: &RecordUpdate) -> Result<bool, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
