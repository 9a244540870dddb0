//! Configuration document for the cfddns agent
//!
//! The whole tree is read once at start, mutated in place by the resolver and
//! the engine, and written back at most once per run.
//!
//! ## Document format
//!
//! ```json
//! {
//!  "domains": [
//!   {
//!    "hosts": [
//!     {"id": null, "ipv4": null, "ipv6": null, "name": "www", "types": ["A"]}
//!    ],
//!    "id": null,
//!    "name": "example.com"
//!   }
//!  ],
//!  "user": {"api_key": "...", "email": "admin@example.com"}
//! }
//! ```
//!
//! Keys are written sorted so that successive rewrites diff cleanly. Keys the
//! agent does not know about are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Root of the persisted configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Provider credentials
    pub user: Credentials,

    /// Zones to reconcile, in document order
    #[serde(default)]
    pub domains: Vec<Domain>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Configuration {
    /// Parse a configuration document
    pub fn from_json(content: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(content)
            .map_err(|e| crate::Error::config(format!("problem with the config file: {}", e)))
    }

    /// Serialize the document with sorted keys and one-space indentation
    pub fn to_json(&self) -> Result<String, crate::Error> {
        let value = sort_keys(serde_json::to_value(self)?);

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        value.serialize(&mut ser)?;
        buf.push(b'\n');

        String::from_utf8(buf).map_err(|e| crate::Error::store(format!("Serialized config is not UTF-8: {}", e)))
    }

    /// Validate the preconditions of a run
    ///
    /// Only credentials are checked here. Empty domain or host names are not
    /// fatal; they are skipped with a warning during the run.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.user.email.trim().is_empty() || self.user.api_key.trim().is_empty() {
            return Err(crate::Error::config("missing Cloudflare auth credentials"));
        }
        Ok(())
    }
}

/// Rebuild every object in `value` with its keys in sorted order
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, sort_keys(v)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Provider credentials
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email, sent as `X-Auth-Email`
    #[serde(default)]
    pub email: String,

    /// Global API key, sent as `X-Auth-Key`
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub api_key: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
            extra: BTreeMap::new(),
        }
    }
}

// Custom Debug implementation that hides the API key
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

/// A zone and the hosts managed inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Zone name (e.g. "example.com")
    #[serde(default)]
    pub name: String,

    /// Provider zone identifier, filled in by the resolver when absent
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub hosts: Vec<Host>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            hosts: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Set a known zone id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a host
    pub fn with_host(mut self, host: Host) -> Self {
        self.hosts.push(host);
        self
    }
}

/// A host record inside a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    /// Subdomain label (e.g. "www")
    #[serde(default)]
    pub name: String,

    /// Provider record identifier, filled in by the resolver when absent
    #[serde(default)]
    pub id: Option<String>,

    /// Requested record kinds, kept verbatim ("A", "AAAA", anything else is skipped)
    #[serde(default)]
    pub types: Vec<String>,

    /// Last IPv4 address this agent successfully applied
    #[serde(default)]
    pub ipv4: Option<String>,

    /// Last IPv6 address this agent successfully applied
    #[serde(default)]
    pub ipv6: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            types: Vec::new(),
            ipv4: None,
            ipv6: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set a known record id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Request a record kind
    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.types.push(record_type.into());
        self
    }

    /// Seed the stored address for a family
    pub fn with_stored(mut self, family: IpFamily, address: impl Into<String>) -> Self {
        self.set_stored_address(family, address.into());
        self
    }

    /// Fully-qualified name used to match provider records
    pub fn fqdn(&self, zone_name: &str) -> String {
        format!("{}.{}", self.name, zone_name)
    }

    /// Last applied address for a family
    pub fn stored_address(&self, family: IpFamily) -> Option<&str> {
        match family {
            IpFamily::V4 => self.ipv4.as_deref(),
            IpFamily::V6 => self.ipv6.as_deref(),
        }
    }

    /// Record a confirmed update
    pub fn set_stored_address(&mut self, family: IpFamily, address: String) {
        match family {
            IpFamily::V4 => self.ipv4 = Some(address),
            IpFamily::V6 => self.ipv6 = Some(address),
        }
    }
}

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IpFamily {
    V4,
    V6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// DNS record kinds the agent manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Parse a record kind as written in the document
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(RecordType::A),
            "AAAA" => Some(RecordType::Aaaa),
            _ => None,
        }
    }

    /// Address family the record carries
    pub fn family(self) -> IpFamily {
        match self {
            RecordType::A => IpFamily::V4,
            RecordType::Aaaa => IpFamily::V6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Perform all lookups but never call upsert
    ///
    /// Stored addresses are left untouched, so a dry run never persists.
    pub dry_run: bool,
}
