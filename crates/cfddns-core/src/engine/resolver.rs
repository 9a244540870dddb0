//! Directory resolver
//!
//! Fills in missing zone and record identifiers by exact name match against
//! the provider's directory. Identifiers already present are trusted and
//! never looked up again, so a domain's zone list is fetched at most once per
//! run no matter how many hosts it carries.
//!
//! Every failure here is local to the domain or host it concerns: the
//! resolver logs it, leaves the identifier unset, and moves on.

use tracing::{debug, error, info, warn};

use crate::config::{Configuration, Domain};
use crate::traits::{DnsProvider, DnsRecord};

/// Resolves zone and record identifiers in place
pub struct DirectoryResolver<'a> {
    provider: &'a dyn DnsProvider,
}

impl<'a> DirectoryResolver<'a> {
    pub fn new(provider: &'a dyn DnsProvider) -> Self {
        Self { provider }
    }

    /// Resolve every domain in document order
    pub async fn resolve(&self, config: &mut Configuration) {
        for domain in &mut config.domains {
            self.resolve_domain(domain).await;
        }
    }

    /// Resolve one domain's zone id, then the record ids of its hosts
    pub async fn resolve_domain(&self, domain: &mut Domain) {
        if domain.name.is_empty() {
            warn!("Missing domain name, skipping entry");
            return;
        }

        if domain.id.is_none() && !self.resolve_zone_id(domain).await {
            return;
        }

        let Some(zone_id) = domain.id.clone() else {
            return;
        };

        // Fetched lazily, once, the first time a host needs it
        let mut listing: Option<Vec<DnsRecord>> = None;

        for host in &mut domain.hosts {
            if host.name.is_empty() || host.id.is_some() {
                continue;
            }

            let fqdn = host.fqdn(&domain.name);
            info!("Host id for \"{}\" is missing, looking it up", fqdn);

            if listing.is_none() {
                match self.provider.list_records(&zone_id).await {
                    Ok(records) => {
                        debug!("Zone {} lists {} record(s)", domain.name, records.len());
                        listing = Some(records);
                    }
                    Err(e) => {
                        error!(
                            "Could not list records for zone \"{}\": {}",
                            domain.name, e
                        );
                        // Remaining hosts in this zone keep their ids unset
                        return;
                    }
                }
            }

            let matched = listing
                .as_deref()
                .and_then(|records| records.iter().find(|r| r.name == fqdn));

            match matched {
                Some(record) => {
                    info!("Host id for \"{}\" is {}", fqdn, record.id);
                    host.id = Some(record.id.clone());
                }
                None => {
                    warn!("No record named \"{}\" exists in zone \"{}\"", fqdn, domain.name);
                }
            }
        }
    }

    /// Look up the zone id; returns false when host resolution must be skipped
    async fn resolve_zone_id(&self, domain: &mut Domain) -> bool {
        info!("Zone id for \"{}\" is missing, looking it up", domain.name);

        let zones = match self.provider.list_zones().await {
            Ok(zones) => zones,
            Err(e) => {
                error!(
                    "Could not get zone id for \"{}\" (possible causes: wrong domain and/or auth credentials): {}",
                    domain.name, e
                );
                return false;
            }
        };

        match zones.into_iter().find(|zone| zone.name == domain.name) {
            Some(zone) => {
                info!("Zone id for \"{}\" is {}", domain.name, zone.id);
                domain.id = Some(zone.id);
                true
            }
            None => {
                warn!(
                    "No zone named \"{}\" is visible to these credentials via {}",
                    domain.name,
                    self.provider.provider_name()
                );
                false
            }
        }
    }
}
