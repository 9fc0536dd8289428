//! Zones: a domain name and its records

use crate::change::Change;
use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use std::collections::BTreeMap;

/// A DNS zone
///
/// Records are unique by (name, type). Iteration is ordered by name, then
/// type, so change lists computed from zones are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    name: String,
    records: BTreeMap<(String, RecordType), Record>,
}

impl Zone {
    /// Create an empty zone. `name` must be absolute (`example.com.`).
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.len() < 2 || !name.ends_with('.') {
            return Err(Error::validation(format!(
                "Invalid zone name \"{}\": must be absolute with a trailing \".\"",
                name
            )));
        }
        Ok(Self {
            name,
            records: BTreeMap::new(),
        })
    }

    /// Zone name with trailing dot
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zone name without the trailing dot
    pub fn hostname(&self) -> &str {
        self.name.trim_end_matches('.')
    }

    /// Add a record.
    ///
    /// A second record with the same (name, type) is rejected unless
    /// `replace` is set. A CNAME cannot share its name with other records.
    pub fn add_record(&mut self, mut record: Record, replace: bool) -> Result<()> {
        record.normalize();
        let key = record.key();

        if !replace && self.records.contains_key(&key) {
            return Err(Error::validation(format!(
                "Duplicate record {} {} in zone {}",
                if key.0.is_empty() { "@" } else { key.0.as_str() },
                key.1,
                self.name
            )));
        }

        let conflicts_with_cname = self.records.keys().any(|(name, t)| {
            name == &key.0
                && *t != key.1
                && (*t == RecordType::Cname || key.1 == RecordType::Cname)
        });
        if conflicts_with_cname {
            return Err(Error::validation(format!(
                "Invalid state, CNAME at {} cannot coexist with other records",
                record.fqdn(&self.name)
            )));
        }

        self.records.insert(key, record);
        Ok(())
    }

    /// Remove and return the record with the given identity
    pub fn remove_record(&mut self, name: &str, record_type: RecordType) -> Option<Record> {
        self.records.remove(&(name.to_string(), record_type))
    }

    /// Look up a record by identity
    pub fn get(&self, name: &str, record_type: RecordType) -> Option<&Record> {
        self.records.get(&(name.to_string(), record_type))
    }

    /// All records, ordered by (name, type)
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the zone holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compute the changes that turn `existing` into `self`.
    ///
    /// An apex NS record in `existing` is left alone when `self` has none, so
    /// the provider's default nameservers are not removed by omission.
    pub fn changes(&self, existing: &Zone) -> Vec<Change> {
        let manage_root_ns = self.get("", RecordType::Ns).is_some();

        let mut keys: Vec<&(String, RecordType)> =
            self.records.keys().chain(existing.records.keys()).collect();
        keys.sort();
        keys.dedup();

        let mut changes = Vec::new();
        for key in keys {
            match (self.records.get(key), existing.records.get(key)) {
                (Some(new), None) => changes.push(Change::Create { new: new.clone() }),
                (None, Some(old)) => {
                    let is_root_ns = old.name.is_empty() && old.record_type() == RecordType::Ns;
                    if is_root_ns && !manage_root_ns {
                        continue;
                    }
                    changes.push(Change::Delete {
                        existing: old.clone(),
                    });
                }
                (Some(new), Some(old)) => {
                    if new != old {
                        changes.push(Change::Update {
                            existing: old.clone(),
                            new: new.clone(),
                        });
                    }
                }
                (None, None) => {}
            }
        }
        changes
    }

    /// Apply changes to this zone in memory.
    ///
    /// Used to reason about convergence; providers apply changes remotely.
    pub fn apply_changes(&mut self, changes: &[Change]) {
        for change in changes {
            match change {
                Change::Create { new } | Change::Update { new, .. } => {
                    self.records.insert(new.key(), new.clone());
                }
                Change::Delete { existing } => {
                    self.records.remove(&existing.key());
                }
            }
        }
    }
}
