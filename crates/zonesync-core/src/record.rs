//! DNS record model
//!
//! A [`Record`] is `(name, ttl, data)` where `name` is relative to its zone
//! (`""` is the apex) and [`RecordData`] is a sum type over the supported
//! record kinds. Multi-value kinds keep their values sorted and deduplicated,
//! so two records compare equal regardless of the order values were given in.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Default TTL applied when a zone file omits one
pub const DEFAULT_TTL: u32 = 3600;

/// Supported DNS record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Alias,
    Caa,
    Cname,
    Mx,
    Ns,
    Ptr,
    Srv,
    Txt,
}

impl RecordType {
    /// Every supported type
    pub const ALL: [RecordType; 10] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Alias,
        RecordType::Caa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Ptr,
        RecordType::Srv,
        RecordType::Txt,
    ];

    /// Upper-case type name as it appears in zone files
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Alias => "ALIAS",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::validation(format!("Unsupported record type: {}", s)))
    }
}

/// CAA record value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaaValue {
    #[serde(default)]
    pub flags: u8,
    pub tag: String,
    pub value: String,
}

/// MX record value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MxValue {
    pub preference: u16,
    pub exchange: String,
}

/// SRV record value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SrvValue {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

/// Typed record content, one variant per record kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RecordData {
    #[serde(rename = "A")]
    A { values: Vec<Ipv4Addr> },
    #[serde(rename = "AAAA")]
    Aaaa { values: Vec<Ipv6Addr> },
    #[serde(rename = "ALIAS")]
    Alias { value: String },
    #[serde(rename = "CAA")]
    Caa { values: Vec<CaaValue> },
    #[serde(rename = "CNAME")]
    Cname { value: String },
    #[serde(rename = "MX")]
    Mx { values: Vec<MxValue> },
    #[serde(rename = "NS")]
    Ns { values: Vec<String> },
    #[serde(rename = "PTR")]
    Ptr { value: String },
    #[serde(rename = "SRV")]
    Srv { values: Vec<SrvValue> },
    #[serde(rename = "TXT")]
    Txt { values: Vec<String> },
}

fn sort_dedup<T: Ord>(values: &mut Vec<T>) {
    values.sort();
    values.dedup();
}

impl RecordData {
    /// The record type of this content
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::A { .. } => RecordType::A,
            RecordData::Aaaa { .. } => RecordType::Aaaa,
            RecordData::Alias { .. } => RecordType::Alias,
            RecordData::Caa { .. } => RecordType::Caa,
            RecordData::Cname { .. } => RecordType::Cname,
            RecordData::Mx { .. } => RecordType::Mx,
            RecordData::Ns { .. } => RecordType::Ns,
            RecordData::Ptr { .. } => RecordType::Ptr,
            RecordData::Srv { .. } => RecordType::Srv,
            RecordData::Txt { .. } => RecordType::Txt,
        }
    }

    /// Number of individual values held
    pub fn value_count(&self) -> usize {
        match self {
            RecordData::A { values } => values.len(),
            RecordData::Aaaa { values } => values.len(),
            RecordData::Caa { values } => values.len(),
            RecordData::Mx { values } => values.len(),
            RecordData::Ns { values } => values.len(),
            RecordData::Srv { values } => values.len(),
            RecordData::Txt { values } => values.len(),
            RecordData::Alias { .. } | RecordData::Cname { .. } | RecordData::Ptr { .. } => 1,
        }
    }

    fn normalize(&mut self) {
        match self {
            RecordData::A { values } => sort_dedup(values),
            RecordData::Aaaa { values } => sort_dedup(values),
            RecordData::Caa { values } => sort_dedup(values),
            RecordData::Mx { values } => sort_dedup(values),
            RecordData::Ns { values } => sort_dedup(values),
            RecordData::Srv { values } => sort_dedup(values),
            RecordData::Txt { values } => sort_dedup(values),
            RecordData::Alias { .. } | RecordData::Cname { .. } | RecordData::Ptr { .. } => {}
        }
    }
}

/// A single DNS record set: every value of one (name, type) in a zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Name relative to the zone, `""` for the apex
    #[serde(default)]
    pub name: String,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Typed content
    #[serde(flatten)]
    pub data: RecordData,
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

impl Record {
    /// Create a record, normalizing its values
    pub fn new(name: impl Into<String>, ttl: u32, data: RecordData) -> Self {
        let mut record = Self {
            name: name.into(),
            ttl,
            data,
        };
        record.normalize();
        record
    }

    /// Sort and deduplicate multi-value content in place
    pub fn normalize(&mut self) {
        self.data.normalize();
    }

    /// The record type
    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// Identity used for diffing
    pub fn key(&self) -> (String, RecordType) {
        (self.name.clone(), self.record_type())
    }

    /// Fully-qualified name of the record within `zone_name`
    pub fn fqdn(&self, zone_name: &str) -> String {
        if self.name.is_empty() {
            zone_name.to_string()
        } else {
            format!("{}.{}", self.name, zone_name)
        }
    }

    /// Check the record is well formed.
    ///
    /// Does not consult any provider; provider-specific restrictions are
    /// applied separately.
    pub fn validate(&self) -> Result<()> {
        let label = self.display_label();

        if self.name.ends_with('.') {
            return Err(Error::validation(format!("{}: name must be relative to the zone", label)));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(Error::validation(format!("{}: name contains whitespace", label)));
        }
        if self.data.value_count() == 0 {
            return Err(Error::validation(format!("{}: missing value(s)", label)));
        }

        match &self.data {
            RecordData::A { .. } | RecordData::Aaaa { .. } => Ok(()),
            RecordData::Alias { value } => {
                if !self.name.is_empty() {
                    return Err(Error::validation(format!("{}: non-root ALIAS not allowed", label)));
                }
                check_fqdn(&label, value)
            }
            RecordData::Cname { value } => {
                if self.name.is_empty() {
                    return Err(Error::validation(format!("{}: root CNAME not allowed", label)));
                }
                check_fqdn(&label, value)
            }
            RecordData::Ptr { value } => check_fqdn(&label, value),
            RecordData::Ns { values } => values.iter().try_for_each(|v| check_fqdn(&label, v)),
            RecordData::Mx { values } => values.iter().try_for_each(|v| check_fqdn(&label, &v.exchange)),
            RecordData::Srv { values } => {
                let mut labels = self.name.split('.');
                let service = labels.next().unwrap_or_default();
                let proto = labels.next().unwrap_or_default();
                if service.len() < 2 || !service.starts_with('_') || proto.len() < 2 || !proto.starts_with('_') {
                    return Err(Error::validation(format!(
                        "{}: SRV name must be of the form _service._proto",
                        label
                    )));
                }
                values.iter().try_for_each(|v| check_fqdn(&label, &v.target))
            }
            RecordData::Caa { values } => values.iter().try_for_each(|v| {
                if v.tag.is_empty() || v.tag.len() > 15 || !v.tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(Error::validation(format!("{}: invalid CAA tag \"{}\"", label, v.tag)));
                }
                if v.value.is_empty() {
                    return Err(Error::validation(format!("{}: CAA value is empty", label)));
                }
                Ok(())
            }),
            RecordData::Txt { values } => {
                if values.iter().any(String::is_empty) {
                    return Err(Error::validation(format!("{}: empty TXT value", label)));
                }
                Ok(())
            }
        }
    }

    fn display_label(&self) -> String {
        let name = if self.name.is_empty() { "@" } else { self.name.as_str() };
        format!("{} {}", name, self.record_type())
    }
}

fn check_fqdn(label: &str, host: &str) -> Result<()> {
    if host.is_empty() {
        return Err(Error::validation(format!("{}: empty hostname", label)));
    }
    if !host.ends_with('.') {
        return Err(Error::validation(format!("{}: hostname \"{}\" missing trailing \".\"", label, host)));
    }
    Ok(())
}
