//! Computed differences between a desired and an existing zone

use crate::record::{Record, RecordType};
use crate::zone::Zone;
use std::fmt;

/// One difference for a single (name, type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Present only in the desired zone
    Create { new: Record },
    /// Present in both with differing content
    Update { existing: Record, new: Record },
    /// Present only in the existing zone
    Delete { existing: Record },
}

impl Change {
    /// The record whose identity this change is about
    pub fn record(&self) -> &Record {
        match self {
            Change::Create { new } | Change::Update { new, .. } => new,
            Change::Delete { existing } => existing,
        }
    }

    /// Record name relative to the zone
    pub fn name(&self) -> &str {
        &self.record().name
    }

    /// Record type
    pub fn record_type(&self) -> RecordType {
        self.record().record_type()
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Create { .. } => "Create",
            Change::Update { .. } => "Update",
            Change::Delete { .. } => "Delete",
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name().is_empty() { "@" } else { self.name() };
        write!(f, "{} {} {}", self.kind(), name, self.record_type())
    }
}

/// The outcome of planning one zone against a provider
#[derive(Debug, Clone)]
pub struct Plan {
    /// Desired state, after provider processing
    pub desired: Zone,
    /// Remote state as populated from the provider
    pub existing: Zone,
    /// Whether the zone exists at the provider
    pub exists: bool,
    /// Ordered changes that bring `existing` to `desired`
    pub changes: Vec<Change>,
}

impl Plan {
    /// Whether there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Count of (creates, updates, deletes)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.changes.iter().fold((0, 0, 0), |(c, u, d), change| match change {
            Change::Create { .. } => (c + 1, u, d),
            Change::Update { .. } => (c, u + 1, d),
            Change::Delete { .. } => (c, u, d + 1),
        })
    }
}
