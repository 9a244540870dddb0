// # cfddns-core
//
// Core library for the cfddns reconciliation agent.
//
// ## Architecture Overview
//
// This library provides the core functionality for one reconciliation run:
// - **IpSource**: Trait for probing the public IPv4/IPv6 address
// - **DnsProvider**: Trait for the provider's zone directory and record updates
// - **ConfigStore**: Trait for loading and persisting the configuration document
// - **DirectoryResolver**: Fills in missing zone and record ids
// - **ReconcileEngine**: Orchestrates probe → resolve → reconcile → persist
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP bindings
// 2. **Library-First**: All core functionality can be used as a library
// 3. **Confirmed State Only**: Stored addresses change only after the provider confirms
// 4. **Single Write**: The configuration is persisted at most once per run

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod store;

// Re-export core types for convenience
pub use traits::{ConfigStore, DnsProvider, IpSource, ProbedAddresses};
pub use engine::{DirectoryResolver, ReconcileEngine, RecordOutcome, RunReport, SkipReason};
pub use config::{Configuration, Credentials, Domain, EngineConfig, Host, IpFamily, RecordType};
pub use error::{Error, Result};
pub use store::{FileConfigStore, MemoryConfigStore};
