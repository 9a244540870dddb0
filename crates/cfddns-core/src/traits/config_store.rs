// # Config Store Trait
//
// Defines how the configuration document is loaded and written back.
//
// ## Purpose
//
// The document doubles as the agent's state: the last applied address per
// record and the resolved provider ids live in it. The store is therefore
// read once per run and written at most once, after the engine reports at
// least one confirmed update.
//
// ## Implementations
//
// - File-based: `FileConfigStore` (atomic write-then-rename)
// - In-memory: `MemoryConfigStore` (tests, embedding)

use async_trait::async_trait;

use crate::config::Configuration;

/// Trait for config store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// Stores perform storage I/O only. They never decide when to persist; that
/// decision belongs to the engine's persistence gate.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the configuration document
    ///
    /// # Returns
    ///
    /// - `Ok(Configuration)`: The parsed document
    /// - `Err(Error::Config)`: The document is missing or unparseable
    async fn load(&self) -> Result<Configuration, crate::Error>;

    /// Overwrite the stored document with `config`
    async fn persist(&self, config: &Configuration) -> Result<(), crate::Error>;
}
