// # File Config Store
//
// File-based implementation of ConfigStore.
//
// ## Crash Safety
//
// - Atomic writes: the new document goes to `<path>.tmp`, then is renamed
//   over the original
// - Backup: the previous document is copied to `<path>.backup` before the
//   rename
//
// A document that fails to parse is never replaced by the backup
// automatically. It is a fatal configuration error and the operator decides
// what to restore.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::Configuration;
use crate::traits::config_store::ConfigStore;

/// File-based config store
///
/// # Example
///
/// ```rust,no_run
/// use cfddns_core::store::FileConfigStore;
/// use cfddns_core::traits::ConfigStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("cf-ddns.conf");
///     let config = store.load().await?;
///
///     // ... reconcile ...
///
///     store.persist(&config).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        Self::with_suffix(&self.path, ".tmp")
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        Self::with_suffix(path, ".backup")
    }

    fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut name: OsString = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Configuration, Error> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let config = Configuration::from_json(&content)?;
        tracing::debug!(
            "Loaded config from {}: {} domain(s)",
            self.path.display(),
            config.domains.len()
        );
        Ok(config)
    }

    async fn persist(&self, config: &Configuration) -> Result<(), Error> {
        let json = config.to_json()?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Create backup of current file (if it exists)
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Config written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, Domain, Host, IpFamily};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn sample() -> Configuration {
        Configuration {
            user: Credentials::new("admin@example.com", "key"),
            domains: vec![Domain::new("example.com").with_host(Host::new("www").with_type("A"))],
            extra: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cf-ddns.conf");
        let store = FileConfigStore::new(&path);

        let mut config = sample();
        config.domains[0].id = Some("z1".to_string());
        config.domains[0].hosts[0].set_stored_address(IpFamily::V4, "1.2.3.4".to_string());
        store.persist(&config).await.unwrap();

        assert!(path.exists());
        assert!(!store.temp_path().exists(), "temp file must be renamed away");

        let loaded = FileConfigStore::new(&path).load().await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_persist_keeps_backup_of_previous_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cf-ddns.conf");
        let store = FileConfigStore::new(&path);

        let first = sample();
        store.persist(&first).await.unwrap();

        let mut second = sample();
        second.domains[0].hosts[0].set_stored_address(IpFamily::V4, "5.6.7.8".to_string());
        store.persist(&second).await.unwrap();

        let backup_path = FileConfigStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after second write");

        let backup = FileConfigStore::new(&backup_path).load().await.unwrap();
        assert_eq!(backup, first);
        assert_eq!(store.load().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::new(dir.path().join("absent.conf"));

        let err = store.load().await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn test_corrupted_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cf-ddns.conf");
        fs::write(&path, b"corrupted json data").await.unwrap();

        let err = FileConfigStore::new(&path).load().await.unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_sidecar_paths_keep_extension() {
        let store = FileConfigStore::new("/etc/cfddns/cf-ddns.conf");
        assert_eq!(store.temp_path(), PathBuf::from("/etc/cfddns/cf-ddns.conf.tmp"));
        assert_eq!(
            FileConfigStore::backup_path(store.path()),
            PathBuf::from("/etc/cfddns/cf-ddns.conf.backup")
        );
    }
}
