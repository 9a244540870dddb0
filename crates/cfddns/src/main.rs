// # cfddns - Cloudflare dynamic DNS agent
//
// A one-shot run meant to be scheduled externally (cron, systemd timer).
// Each invocation probes the public addresses, brings drifted records in
// line, and rewrites the configuration file only if something changed.
//
// This binary is a THIN integration layer: it reads settings, initializes
// logging and the runtime, wires the concrete components together and maps
// the outcome to an exit code. All reconciliation logic lives in cfddns-core.
//
// ## Configuration
//
// Runtime settings come from environment variables only:
//
// - `CFDDNS_CONFIG`: Path to the configuration document (default `cf-ddns.conf`)
// - `CFDDNS_API_BASE`: Cloudflare API base URL
// - `CFDDNS_IPV4_URL`: IPv4 echo service
// - `CFDDNS_IPV6_URL`: IPv6 echo service
// - `CFDDNS_HTTP_TIMEOUT_SECS`: Per-request timeout, 1 to 120 (default 10)
// - `CFDDNS_LOG_LEVEL`: trace, debug, info, warn or error (default info)
// - `CFDDNS_MODE`: `live` or `dry-run` (default live)
//
// Credentials and the managed domains live in the configuration document.
//
// ## Example
//
// ```bash
// # crontab: every five minutes
// */5 * * * * CFDDNS_CONFIG=/etc/cfddns/cf-ddns.conf /usr/local/bin/cfddns
// ```

use anyhow::Result;
use cfddns_core::{EngineConfig, FileConfigStore, ReconcileEngine, RunReport};
use cfddns_core::traits::ConfigStore;
use cfddns_ip_http::EchoIpSource;
use cfddns_provider_cloudflare::{CLOUDFLARE_API_BASE, CloudflareProvider};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible run outcomes
///
/// - 0: Run completed, every requested record is in sync or was skipped
/// - 1: Configuration error (settings, unreadable document, missing credentials)
/// - 2: Runtime error (no public address, persisting failed)
/// - 3: Run completed but at least one record failed to update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CfddnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    RecordFailures = 3,
}

impl From<CfddnsExitCode> for ExitCode {
    fn from(code: CfddnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl CfddnsExitCode {
    fn for_error(err: &cfddns_core::Error) -> Self {
        if err.is_config() {
            Self::ConfigError
        } else {
            Self::RuntimeError
        }
    }

    fn for_report(report: &RunReport) -> Self {
        if report.has_failures() {
            Self::RecordFailures
        } else {
            Self::Success
        }
    }
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    config_path: PathBuf,
    api_base: String,
    ipv4_url: String,
    ipv6_url: String,
    http_timeout_secs: u64,
    log_level: String,
    dry_run: bool,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let http_timeout_secs = match lookup("CFDDNS_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                anyhow::anyhow!(
                    "CFDDNS_HTTP_TIMEOUT_SECS must be a whole number of seconds. Got: {}",
                    raw
                )
            })?,
            None => cfddns_ip_http::DEFAULT_HTTP_TIMEOUT.as_secs(),
        };

        let dry_run = match lookup("CFDDNS_MODE")
            .unwrap_or_else(|| "live".to_string())
            .to_lowercase()
            .as_str()
        {
            "live" => false,
            "dry-run" => true,
            other => anyhow::bail!(
                "CFDDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                other
            ),
        };

        Ok(Self {
            config_path: PathBuf::from(
                lookup("CFDDNS_CONFIG").unwrap_or_else(|| "cf-ddns.conf".to_string()),
            ),
            api_base: lookup("CFDDNS_API_BASE").unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string()),
            ipv4_url: lookup("CFDDNS_IPV4_URL")
                .unwrap_or_else(|| cfddns_ip_http::DEFAULT_IPV4_URL.to_string()),
            ipv6_url: lookup("CFDDNS_IPV6_URL")
                .unwrap_or_else(|| cfddns_ip_http::DEFAULT_IPV6_URL.to_string()),
            http_timeout_secs,
            log_level: lookup("CFDDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            dry_run,
        })
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("CFDDNS_CONFIG cannot be empty");
        }

        for (name, url) in [
            ("CFDDNS_API_BASE", &self.api_base),
            ("CFDDNS_IPV4_URL", &self.ipv4_url),
            ("CFDDNS_IPV6_URL", &self.ipv6_url),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", name, url);
            }
        }

        if !(1..=120).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "CFDDNS_HTTP_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "CFDDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }

    fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CfddnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {}", e);
        return CfddnsExitCode::ConfigError.into();
    }

    let log_level = settings.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfddnsExitCode::ConfigError.into();
    }

    // Every call is awaited in turn, one thread is plenty
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfddnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(settings)).into()
}

/// Wire the components together and perform one run
async fn run(settings: Settings) -> CfddnsExitCode {
    info!(
        "Starting cfddns (config: {}, mode: {})",
        settings.config_path.display(),
        if settings.dry_run { "DRY-RUN" } else { "LIVE" }
    );

    let store = FileConfigStore::new(&settings.config_path);
    let mut config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return CfddnsExitCode::for_error(&e);
        }
    };

    // The provider authenticates with the credentials from the document
    let provider = match CloudflareProvider::new(&config.user, &settings.api_base, settings.http_timeout()) {
        Ok(provider) => provider,
        Err(e) => {
            error!("{}", e);
            return CfddnsExitCode::for_error(&e);
        }
    };

    let ip_source = match EchoIpSource::new(&settings.ipv4_url, &settings.ipv6_url, settings.http_timeout()) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            return CfddnsExitCode::RuntimeError;
        }
    };

    if settings.dry_run {
        warn!("Running in DRY-RUN mode - no records or files will be changed");
    }

    let engine = ReconcileEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        Box::new(store),
        EngineConfig {
            dry_run: settings.dry_run,
        },
    );

    match engine.run(&mut config).await {
        Ok(report) => {
            info!(
                "Run finished: {} updated, {} unchanged, {} skipped, {} failed ({} ms)",
                report.updated(),
                report.unchanged(),
                report.skipped(),
                report.failed(),
                report.elapsed().map(|d| d.num_milliseconds()).unwrap_or_default()
            );
            match report.to_json() {
                Ok(json) => debug!("Run report: {}", json),
                Err(e) => warn!("Failed to render run report: {}", e),
            }
            CfddnsExitCode::for_report(&report)
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            CfddnsExitCode::for_error(&e)
        }
    }
}
