//! Core traits for the cfddns agent
//!
//! This module defines the abstract interfaces the engine runs against.
//!
//! - [`IpSource`]: Discover the public address of each family
//! - [`DnsProvider`]: List zones and records, update records
//! - [`ConfigStore`]: Load and persist the configuration document

pub mod ip_source;
pub mod dns_provider;
pub mod config_store;

pub use ip_source::{IpSource, ProbedAddresses};
pub use dns_provider::{DnsProvider, DnsRecord, RecordUpdate, Zone};
pub use config_store::ConfigStore;
