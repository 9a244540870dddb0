//! Test doubles and common utilities for engine contract tests
//!
//! The doubles record every call so tests can assert on exactly which
//! provider operations a run performed.

#![allow(dead_code)]

use cfddns_core::config::{Configuration, Credentials, Domain, EngineConfig, Host, IpFamily};
use cfddns_core::error::{Error, Result};
use cfddns_core::store::MemoryConfigStore;
use cfddns_core::traits::{DnsProvider, DnsRecord, IpSource, RecordUpdate, Zone};
use cfddns_core::ReconcileEngine;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IpSource returning fixed answers per family
pub struct StaticIpSource {
    ipv4: Option<String>,
    ipv6: Option<String>,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ipv4: Option<&str>, ipv6: Option<&str>) -> Self {
        Self {
            ipv4: ipv4.map(str::to_owned),
            ipv6: ipv6.map(str::to_owned),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn v4(ipv4: &str) -> Self {
        Self::new(Some(ipv4), None)
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self, family: IpFamily) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let answer = match family {
            IpFamily::V4 => self.ipv4.clone(),
            IpFamily::V6 => self.ipv6.clone(),
        };
        answer.ok_or_else(|| Error::ip_source(format!("no {} connectivity", family)))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// How the mock answers an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertBehaviour {
    /// `Ok(true)`
    Confirm,
    /// `Ok(false)`: provider answered with `success: false`
    Reject,
    /// `Err(..)`: transport/HTTP failure
    Error,
}

/// A mock DnsProvider that tracks calls
pub struct MockDnsProvider {
    /// `None` makes list_zones fail
    zones: Arc<Mutex<Option<Vec<Zone>>>>,
    records: Arc<Mutex<HashMap<String, Vec<DnsRecord>>>>,
    failing_record_zones: Arc<Mutex<Vec<String>>>,
    upsert_behaviour: Arc<Mutex<HashMap<String, UpsertBehaviour>>>,
    list_zones_count: Arc<AtomicUsize>,
    list_records_count: Arc<AtomicUsize>,
    upserts: Arc<Mutex<Vec<RecordUpdate>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Mutex::new(Some(Vec::new()))),
            records: Arc::new(Mutex::new(HashMap::new())),
            failing_record_zones: Arc::new(Mutex::new(Vec::new())),
            upsert_behaviour: Arc::new(Mutex::new(HashMap::new())),
            list_zones_count: Arc::new(AtomicUsize::new(0)),
            list_records_count: Arc::new(AtomicUsize::new(0)),
            upserts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a zone to the directory
    pub fn with_zone(self, id: &str, name: &str) -> Self {
        if let Some(zones) = self.zones.lock().unwrap().as_mut() {
            zones.push(Zone {
                id: id.to_string(),
                name: name.to_string(),
            });
        }
        self
    }

    /// Make list_zones fail as with bad credentials
    pub fn with_zone_listing_error(self) -> Self {
        *self.zones.lock().unwrap() = None;
        self
    }

    /// Add a record to a zone
    pub fn with_record(self, zone_id: &str, id: &str, name: &str, record_type: &str) -> Self {
        self.records
            .lock()
            .unwrap()
            .entry(zone_id.to_string())
            .or_default()
            .push(DnsRecord {
                id: id.to_string(),
                name: name.to_string(),
                record_type: record_type.to_string(),
                content: "192.0.2.1".to_string(),
            });
        self
    }

    /// Make list_records fail for a zone
    pub fn with_record_listing_error(self, zone_id: &str) -> Self {
        self.failing_record_zones
            .lock()
            .unwrap()
            .push(zone_id.to_string());
        self
    }

    /// Set how upserts for a record id are answered (default: confirm)
    pub fn with_upsert(self, record_id: &str, behaviour: UpsertBehaviour) -> Self {
        self.upsert_behaviour
            .lock()
            .unwrap()
            .insert(record_id.to_string(), behaviour);
        self
    }

    /// Create a new MockDnsProvider that shares directory and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            records: Arc::clone(&other.records),
            failing_record_zones: Arc::clone(&other.failing_record_zones),
            upsert_behaviour: Arc::clone(&other.upsert_behaviour),
            list_zones_count: Arc::clone(&other.list_zones_count),
            list_records_count: Arc::clone(&other.list_records_count),
            upserts: Arc::clone(&other.upserts),
        }
    }

    pub fn list_zones_count(&self) -> usize {
        self.list_zones_count.load(Ordering::SeqCst)
    }

    pub fn list_records_count(&self) -> usize {
        self.list_records_count.load(Ordering::SeqCst)
    }

    /// Every upsert attempted, in call order
    pub fn upserts(&self) -> Vec<RecordUpdate> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list_zones_count.fetch_add(1, Ordering::SeqCst);
        self.zones
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::auth("Invalid API key"))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        self.list_records_count.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_record_zones
            .lock()
            .unwrap()
            .iter()
            .any(|z| z == zone_id)
        {
            return Err(Error::provider("mock", "Cloudflare server error (transient): 502"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(zone_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_record(&self, update: &RecordUpdate) -> Result<bool> {
        self.upserts.lock().unwrap().push(update.clone());
        let behaviour = self
            .upsert_behaviour
            .lock()
            .unwrap()
            .get(&update.record_id)
            .copied()
            .unwrap_or(UpsertBehaviour::Confirm);

        match behaviour {
            UpsertBehaviour::Confirm => Ok(true),
            UpsertBehaviour::Reject => Ok(false),
            UpsertBehaviour::Error => Err(Error::provider("mock", "HTTP request failed: connection reset")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a configuration from domains with valid credentials
pub fn config_with(domains: Vec<Domain>) -> Configuration {
    Configuration {
        user: Credentials::new("admin@example.com", "test-key"),
        domains,
        extra: BTreeMap::new(),
    }
}

/// `example.com` (id unset) with host `www` (id unset, types ["A"], ipv4 unset)
pub fn scenario_config() -> Configuration {
    config_with(vec![
        Domain::new("example.com").with_host(Host::new("www").with_type("A")),
    ])
}

/// Provider whose directory matches [`scenario_config`]
pub fn scenario_provider() -> MockDnsProvider {
    MockDnsProvider::new()
        .with_zone("z1", "example.com")
        .with_record("z1", "r1", "www.example.com", "A")
}

/// Build an engine whose collaborators share state with the given handles
pub fn engine(
    ip_source: StaticIpSource,
    provider: &MockDnsProvider,
    store: &MemoryConfigStore,
) -> ReconcileEngine {
    ReconcileEngine::new(
        Box::new(ip_source),
        Box::new(MockDnsProvider::sharing_counters_with(provider)),
        Box::new(store.clone()),
        EngineConfig::default(),
    )
}

/// Like [`engine`] but in dry-run mode
pub fn dry_run_engine(
    ip_source: StaticIpSource,
    provider: &MockDnsProvider,
    store: &MemoryConfigStore,
) -> ReconcileEngine {
    ReconcileEngine::new(
        Box::new(ip_source),
        Box::new(MockDnsProvider::sharing_counters_with(provider)),
        Box::new(store.clone()),
        EngineConfig { dry_run: true },
    )
}
