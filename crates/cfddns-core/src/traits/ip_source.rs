// # IP Source Trait
//
// Defines the interface for discovering the machine's public addresses.
//
// ## Implementations
//
// - Echo service over HTTP(S): `cfddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::traits::{IpSource, ProbedAddresses};
//
// let source = /* IpSource implementation */;
// let probed = ProbedAddresses::probe(&source).await;
// if probed.is_empty() {
//     // nothing to reconcile against
// }
// ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{IpFamily, RecordType};

/// Trait for IP source implementations
///
/// Each family is queried separately. Addresses are returned as the raw,
/// trimmed text the source produced; no syntax validation is performed.
///
/// # Trust Level: Semi-Trusted
///
/// IP sources are observers. They may perform network I/O against their own
/// endpoint but must not retry, cache across runs, or touch the configuration.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public address for one family
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The non-empty address text
    /// - `Err(Error)`: Timeout, DNS failure, non-2xx response or empty body
    async fn current(&self, family: IpFamily) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Addresses observed at the start of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbedAddresses {
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

impl ProbedAddresses {
    /// Probe both families independently
    ///
    /// A failure for one family leaves that family `None` and never affects
    /// the other.
    pub async fn probe(source: &dyn IpSource) -> Self {
        Self {
            ipv4: Self::probe_family(source, IpFamily::V4).await,
            ipv6: Self::probe_family(source, IpFamily::V6).await,
        }
    }

    async fn probe_family(source: &dyn IpSource, family: IpFamily) -> Option<String> {
        match source.current(family).await {
            Ok(address) => {
                info!("Public {} address: {}", family, address);
                Some(address)
            }
            Err(e) => {
                warn!(
                    "No public {} address detected via {}: {}",
                    family,
                    source.source_name(),
                    e
                );
                None
            }
        }
    }

    /// Address for a family, if it was probed successfully
    pub fn for_family(&self, family: IpFamily) -> Option<&str> {
        match family {
            IpFamily::V4 => self.ipv4.as_deref(),
            IpFamily::V6 => self.ipv6.as_deref(),
        }
    }

    /// Address a record of the given type should point at
    pub fn for_type(&self, record_type: RecordType) -> Option<&str> {
        self.for_family(record_type.family())
    }

    /// True when neither family produced an address
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_none() && self.ipv6.is_none()
    }
}
