//! Per-record outcomes of a reconciliation pass

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::config::IpFamily;

/// Why a unit of work was not attempted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Domain entry has an empty name
    DomainNameMissing,
    /// Zone id could not be resolved
    ZoneUnresolved,
    /// Host entry has an empty name
    HostNameMissing,
    /// Requested type is neither A nor AAAA
    InvalidType(String),
    /// The family this type needs was not probed
    AddressUnavailable(IpFamily),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DomainNameMissing => write!(f, "missing domain name"),
            SkipReason::ZoneUnresolved => write!(f, "zone id unresolved"),
            SkipReason::HostNameMissing => write!(f, "host name missing"),
            SkipReason::InvalidType(t) => write!(f, "wrong or missing dns record type: {:?}", t),
            SkipReason::AddressUnavailable(family) => write!(f, "no {} address available", family),
        }
    }
}

/// Result for one domain/host/type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Provider confirmed the update; the stored address now matches
    Updated {
        previous: Option<String>,
        address: String,
    },
    /// Stored address already equals the probed one
    Unchanged { address: String },
    /// Dry run: an update would have been sent
    WouldUpdate { address: String },
    /// Not attempted
    Skipped(SkipReason),
    /// Attempted (or due) but did not happen; stored state untouched
    Failed { address: String, reason: String },
}

/// One line of the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordReport {
    /// FQDN, or the bare domain name for domain-level skips
    pub target: String,
    /// Requested type as written in the document, if the outcome is per type
    pub record_type: Option<String>,
    pub outcome: RecordOutcome,
}

/// Summary of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: Vec<RecordReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            records: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, target: impl Into<String>, record_type: Option<&str>, outcome: RecordOutcome) {
        self.records.push(RecordReport {
            target: target.into(),
            record_type: record_type.map(str::to_owned),
            outcome,
        });
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    fn count(&self, pred: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }

    /// Number of confirmed updates
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Updated { .. }))
    }

    /// Number of records already in sync
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Unchanged { .. }))
    }

    /// Number of updates a dry run held back
    pub fn would_update(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::WouldUpdate { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RecordOutcome::Failed { .. }))
    }

    /// At least one update succeeded, so the configuration must be persisted
    pub fn has_updates(&self) -> bool {
        self.updated() > 0
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Render the report as a single-line JSON document
    pub fn to_json(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wall-clock duration of the run, once finished
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end.signed_duration_since(self.started_at))
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
