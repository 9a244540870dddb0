//! Core reconciliation engine
//!
//! The ReconcileEngine is responsible for:
//! - Probing the public address of each family via IpSource
//! - Resolving missing zone/record ids via the DirectoryResolver
//! - Comparing each record's stored address with the probed one
//! - Upserting drifted records via DnsProvider
//! - Persisting the configuration only when an update succeeded
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  IpSource   │──▶│ DirectoryResolver│──▶│  reconcile  │──▶│ persistence  │
//! │  (probe)    │   │ (zone/record ids)│   │ (per type)  │   │    gate      │
//! └─────────────┘   └──────────────────┘   └─────────────┘   └──────────────┘
//!                            │                    │                  │
//!                            ▼                    ▼                  ▼
//!                     ┌─────────────┐      ┌─────────────┐    ┌─────────────┐
//!                     │ DnsProvider │      │ DnsProvider │    │ ConfigStore │
//!                     │   (list)    │      │  (upsert)   │    │  (persist)  │
//!                     └─────────────┘      └─────────────┘    └─────────────┘
//! ```
//!
//! ## State Transition
//!
//! A host's stored address moves from its old value to the probed value if
//! and only if the provider confirms the update. The stored value can lag
//! provider reality after a failure but never runs ahead of it; the next run
//! sees the mismatch again and retries.

pub mod report;
pub mod resolver;

use tracing::{debug, error, info, warn};

use crate::config::{Configuration, EngineConfig, Host, RecordType};
use crate::error::{Error, Result};
use crate::traits::{ConfigStore, DnsProvider, IpSource, ProbedAddresses, RecordUpdate};

pub use report::{RecordOutcome, RecordReport, RunReport, SkipReason};
pub use resolver::DirectoryResolver;

/// Core reconciliation engine
///
/// One call to [`ReconcileEngine::run`] is one complete, sequential pass.
/// Nothing is retried within a pass; retry is the next scheduled run.
pub struct ReconcileEngine {
    /// IP source for probing public addresses
    ip_source: Box<dyn IpSource>,

    /// DNS provider for directory lookups and updates
    provider: Box<dyn DnsProvider>,

    /// Store the configuration is loaded from and persisted to
    store: Box<dyn ConfigStore>,

    config: EngineConfig,
}

impl ReconcileEngine {
    /// Create a new engine
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        store: Box<dyn ConfigStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ip_source,
            provider,
            store,
            config,
        }
    }

    /// Load the configuration from the store and run one pass over it
    pub async fn run_once(&self) -> Result<RunReport> {
        let mut config = self.store.load().await?;
        self.run(&mut config).await
    }

    /// Run one full pass over an already-loaded configuration
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: The pass completed; individual records may still
    ///   have failed (see [`RunReport::has_failures`])
    /// - `Err(Error::Config)`: Credentials are missing
    /// - `Err(Error::NoAddress)`: Neither family could be probed
    /// - `Err(Error::Store)`: Updates succeeded but persisting them failed
    pub async fn run(&self, config: &mut Configuration) -> Result<RunReport> {
        config.validate()?;

        let probed = ProbedAddresses::probe(self.ip_source.as_ref()).await;
        if probed.is_empty() {
            error!("Failed to get any public IP address");
            return Err(Error::NoAddress);
        }

        DirectoryResolver::new(self.provider.as_ref())
            .resolve(config)
            .await;

        let mut report = self.reconcile(config, &probed).await;

        // Persistence gate: write once, and only if something changed
        if report.has_updates() {
            self.store.persist(config).await?;
            info!("Updates completed ({} record(s) updated). bye.", report.updated());
        } else if self.config.dry_run && report.would_update() > 0 {
            info!(
                "[DRY-RUN] {} record(s) would be updated, config left untouched. bye.",
                report.would_update()
            );
        } else {
            info!("Nothing to update. bye.");
        }

        report.finish();
        Ok(report)
    }

    /// Compare every requested record against the probed addresses and
    /// upsert the ones that drifted
    ///
    /// Mutates stored addresses in `config` for confirmed updates only. Does
    /// not resolve ids and does not persist.
    pub async fn reconcile(&self, config: &mut Configuration, probed: &ProbedAddresses) -> RunReport {
        let mut report = RunReport::new();

        for domain in &mut config.domains {
            if domain.name.is_empty() {
                report.push("", None, RecordOutcome::Skipped(SkipReason::DomainNameMissing));
                continue;
            }

            let Some(zone_id) = domain.id.clone() else {
                warn!("Skipping all updates for \"{}\": zone id unresolved", domain.name);
                report.push(
                    domain.name.as_str(),
                    None,
                    RecordOutcome::Skipped(SkipReason::ZoneUnresolved),
                );
                continue;
            };

            for host in &mut domain.hosts {
                if host.name.is_empty() {
                    warn!("Host name missing in \"{}\", skipping entry", domain.name);
                    report.push(
                        domain.name.as_str(),
                        None,
                        RecordOutcome::Skipped(SkipReason::HostNameMissing),
                    );
                    continue;
                }

                let fqdn = host.fqdn(&domain.name);
                for requested in host.types.clone() {
                    let outcome = self
                        .reconcile_type(&zone_id, host, &fqdn, &requested, probed)
                        .await;
                    report.push(fqdn.as_str(), Some(requested.as_str()), outcome);
                }
            }
        }

        report
    }

    /// Reconcile a single host/type pair
    async fn reconcile_type(
        &self,
        zone_id: &str,
        host: &mut Host,
        fqdn: &str,
        requested: &str,
        probed: &ProbedAddresses,
    ) -> RecordOutcome {
        let Some(record_type) = RecordType::parse(requested) else {
            warn!("Wrong or missing dns record type for {}: {:?}", fqdn, requested);
            return RecordOutcome::Skipped(SkipReason::InvalidType(requested.to_string()));
        };

        let family = record_type.family();
        let Some(address) = probed.for_type(record_type) else {
            warn!(
                "Cannot set {} record for {} because no {} address is available",
                record_type, fqdn, family
            );
            return RecordOutcome::Skipped(SkipReason::AddressUnavailable(family));
        };

        let previous = host.stored_address(family).map(str::to_owned);
        if previous.as_deref() == Some(address) {
            debug!("{} record for {} already points at {}", record_type, fqdn, address);
            return RecordOutcome::Unchanged {
                address: address.to_string(),
            };
        }

        let Some(record_id) = host.id.clone() else {
            warn!(
                "Update failed (type: {}, fqdn: {}, ip: {}): record id unresolved",
                record_type, fqdn, address
            );
            return RecordOutcome::Failed {
                address: address.to_string(),
                reason: "record id unresolved".to_string(),
            };
        };

        if self.config.dry_run {
            info!(
                "[DRY-RUN] Would update (type: {}, fqdn: {}, ip: {} -> {})",
                record_type,
                fqdn,
                previous.as_deref().unwrap_or("none"),
                address
            );
            return RecordOutcome::WouldUpdate {
                address: address.to_string(),
            };
        }

        let update = RecordUpdate {
            zone_id: zone_id.to_string(),
            record_id,
            record_type,
            name: host.name.clone(),
            content: address.to_string(),
        };

        let reason = match self.provider.upsert_record(&update).await {
            Ok(true) => {
                host.set_stored_address(family, address.to_string());
                info!(
                    "Update successful (type: {}, fqdn: {}, ip: {})",
                    record_type, fqdn, address
                );
                return RecordOutcome::Updated {
                    previous,
                    address: address.to_string(),
                };
            }
            Ok(false) => format!("{} rejected the update", self.provider.provider_name()),
            Err(e) => e.to_string(),
        };

        error!(
            "Update failed (type: {}, fqdn: {}, ip: {}): {}",
            record_type, fqdn, address, reason
        );
        RecordOutcome::Failed {
            address: address.to_string(),
            reason,
        }
    }
}
