//! Test doubles and common utilities for synchronizer contract tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zonesync_core::{
    ApplyReport, BatchKind, BatchSummary, DnsProvider, EngineConfig, Error, Plan, Record,
    RecordData, RecordType, Result, Zone,
};

/// How the provider fails its next apply calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Commit the first change, then fail with a 503
    PartialTransient,
    /// Fail with 401 before doing anything
    Unauthorized,
}

/// A provider that keeps zones in memory and counts calls
#[derive(Clone)]
pub struct InMemoryProvider {
    zones: Arc<Mutex<HashMap<String, Zone>>>,
    populate_calls: Arc<AtomicUsize>,
    apply_calls: Arc<AtomicUsize>,
    applied_change_counts: Arc<Mutex<Vec<usize>>>,
    failures: Arc<Mutex<Vec<Failure>>>,
    unsupported: Option<RecordType>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            zones: Arc::new(Mutex::new(HashMap::new())),
            populate_calls: Arc::new(AtomicUsize::new(0)),
            apply_calls: Arc::new(AtomicUsize::new(0)),
            applied_change_counts: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            unsupported: None,
        }
    }

    /// Refuse to support one record type
    pub fn without_support_for(mut self, record_type: RecordType) -> Self {
        self.unsupported = Some(record_type);
        self
    }

    /// Queue failures for the next apply calls, in order
    pub fn fail_next(&self, failures: &[Failure]) {
        self.failures.lock().unwrap().extend_from_slice(failures);
    }

    /// Seed a remote zone
    pub fn insert_zone(&self, zone: Zone) {
        self.zones
            .lock()
            .unwrap()
            .insert(zone.name().to_string(), zone);
    }

    /// Current remote copy of a zone
    pub fn zone(&self, name: &str) -> Option<Zone> {
        self.zones.lock().unwrap().get(name).cloned()
    }

    pub fn populate_calls(&self) -> usize {
        self.populate_calls.load(Ordering::SeqCst)
    }

    pub fn apply_calls(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    /// Number of changes handed to each apply call
    pub fn applied_change_counts(&self) -> Vec<usize> {
        self.applied_change_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for InMemoryProvider {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    fn supports(&self, record: &Record) -> bool {
        Some(record.record_type()) != self.unsupported
    }

    async fn populate(&self, zone: &mut Zone) -> Result<bool> {
        self.populate_calls.fetch_add(1, Ordering::SeqCst);
        let zones = self.zones.lock().unwrap();
        match zones.get(zone.name()) {
            Some(remote) => {
                for record in remote.records() {
                    zone.add_record(record.clone(), false)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply(&self, plan: &Plan) -> Result<ApplyReport> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        self.applied_change_counts
            .lock()
            .unwrap()
            .push(plan.changes.len());

        let failure = {
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        };

        let name = plan.desired.name().to_string();
        let mut zones = self.zones.lock().unwrap();
        let created = !zones.contains_key(&name);
        let remote = zones
            .entry(name.clone())
            .or_insert_with(|| Zone::new(name.clone()).unwrap());

        match failure {
            Some(Failure::Unauthorized) => Err(Error::Unauthorized),
            Some(Failure::PartialTransient) => {
                remote.apply_changes(&plan.changes[..1]);
                Err(Error::PartialApply {
                    zone: name,
                    applied: vec![summary(0, 1)],
                    failed: summary(1, plan.changes.len() - 1),
                    not_attempted: vec![],
                    source: Box::new(Error::api(503, "Service Unavailable")),
                })
            }
            None => {
                remote.apply_changes(&plan.changes);
                Ok(ApplyReport {
                    zone: name,
                    changes: plan.changes.len(),
                    zone_created: created,
                    batches: vec![summary(0, plan.changes.len())],
                })
            }
        }
    }
}

fn summary(index: usize, size: usize) -> BatchSummary {
    BatchSummary {
        kind: BatchKind::Create,
        index,
        size,
    }
}

/// Engine config with instant retries
pub fn fast_retry_config(max_retries: usize) -> EngineConfig {
    EngineConfig {
        max_retries,
        retry_delay_secs: 0,
        max_retry_delay_secs: 0,
        dry_run: false,
        event_channel_capacity: 100,
    }
}

/// `name A ip` with a 300s TTL
pub fn a_record(name: &str, ip: &str) -> Record {
    Record::new(
        name,
        300,
        RecordData::A {
            values: vec![ip.parse().unwrap()],
        },
    )
}

/// A zone holding the given records
pub fn zone_with(name: &str, records: Vec<Record>) -> Zone {
    let mut zone = Zone::new(name).unwrap();
    for record in records {
        zone.add_record(record, false).unwrap();
    }
    zone
}
