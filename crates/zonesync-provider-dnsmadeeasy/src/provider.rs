// # DNS Made Easy provider
//
// Translates between the zone model and DNS Made Easy records.
//
// ## Reading
//
// Remote records are fetched once per zone and cached until the next apply
// of that zone, then grouped by (name, type) into record sets.
//
// ## Writing
//
// DNS Made Easy has no in-place update for a record set, so an update is a
// delete of every remote record of the (name, type) followed by a create of
// the new values. All deletions are submitted before any creation, each in
// sequential batches of at most `batch_size` records.
//
// The provider never retries. A failed batch ends the apply with a
// `PartialApply` error describing what was committed.

use crate::client::DnsMadeEasyClient;
use crate::txt;
use crate::wire::{ApiRecord, RecordParams};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use zonesync_core::{
    ApplyReport, BatchKind, BatchProgress, BatchSummary, CaaValue, Change, DnsProvider, Error,
    MxValue, Plan, Record, RecordData, RecordType, Result, SrvValue, Zone, partition,
};

/// Name reported by [`DnsProvider::provider_name`]
pub const PROVIDER_NAME: &str = "dnsmadeeasy";

/// DNS Made Easy DNS provider
#[derive(Debug)]
pub struct DnsMadeEasyProvider {
    /// Instance name, used in messages
    id: String,

    client: DnsMadeEasyClient,

    /// Maximum records per bulk request
    batch_size: NonZeroUsize,

    /// Reject TXT values with quotes instead of stripping them
    strict_supports: bool,

    /// Remote records per zone name, `None` when the zone does not exist
    zone_records: Mutex<HashMap<String, Option<Vec<ApiRecord>>>>,
}

impl DnsMadeEasyProvider {
    /// Create a provider around a configured client
    pub fn new(
        id: impl Into<String>,
        client: DnsMadeEasyClient,
        batch_size: NonZeroUsize,
        strict_supports: bool,
    ) -> Self {
        Self {
            id: id.into(),
            client,
            batch_size,
            strict_supports,
            zone_records: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying API client
    pub fn client(&self) -> &DnsMadeEasyClient {
        &self.client
    }

    /// Remote records of `zone_name`, fetched on first use
    async fn zone_records(&self, zone_name: &str) -> Result<Option<Vec<ApiRecord>>> {
        if let Some(records) = self.zone_records.lock().await.get(zone_name) {
            return Ok(records.clone());
        }

        // Not held across the fetch, so populates of other zones proceed
        let records = self.client.records(zone_name).await?;
        self.zone_records
            .lock()
            .await
            .insert(zone_name.to_string(), records.clone());
        Ok(records)
    }

    /// Forget cached records of `zone_name`
    async fn invalidate(&self, zone_name: &str) {
        self.zone_records.lock().await.remove(zone_name);
    }

    async fn apply_plan(&self, plan: &Plan) -> Result<ApplyReport> {
        let zone_name = plan.desired.name();
        let domain_name = plan.desired.hostname();

        tracing::debug!(
            "apply: zone={}, changes={}",
            zone_name,
            plan.changes.len()
        );

        let (zone_id, zone_created) = match self.client.domain(domain_name).await {
            Ok(domain) => (domain.id, false),
            Err(Error::NotFound) => {
                tracing::debug!("apply: no matching zone, creating domain {}", domain_name);
                (self.client.domain_create(domain_name).await?.id, true)
            }
            Err(e) => return Err(e),
        };

        let existing = if zone_created {
            Vec::new()
        } else {
            self.zone_records(zone_name).await?.unwrap_or_default()
        };

        let mut deletions = Vec::new();
        let mut creations = Vec::new();
        for change in &plan.changes {
            match change {
                Change::Create { new } => creations.extend(params_for(new)),
                Change::Update { existing: old, new } => {
                    deletions.extend(ids_for(&existing, old));
                    creations.extend(params_for(new));
                }
                Change::Delete { existing: old } => deletions.extend(ids_for(&existing, old)),
            }
        }

        let delete_batches = partition(&deletions, self.batch_size);
        let create_batches = partition(&creations, self.batch_size);

        let planned: Vec<BatchSummary> = delete_batches
            .iter()
            .map(|b| b.summary(BatchKind::Delete))
            .chain(create_batches.iter().map(|b| b.summary(BatchKind::Create)))
            .collect();
        let mut progress = BatchProgress::new(planned);

        if let Err(e) = self
            .client
            .record_multi_delete(zone_id, &delete_batches, &mut progress)
            .await
        {
            return Err(progress.into_partial_error(zone_name, e));
        }

        if let Err(e) = self
            .client
            .record_multi_create(zone_id, &create_batches, &mut progress)
            .await
        {
            return Err(progress.into_partial_error(zone_name, e));
        }

        let batches = progress.into_applied();
        tracing::info!(
            "apply: {} deleted, {} created in {} batch(es) for {}",
            deletions.len(),
            creations.len(),
            batches.len(),
            zone_name
        );

        Ok(ApplyReport {
            zone: zone_name.to_string(),
            changes: plan.changes.len(),
            zone_created,
            batches,
        })
    }
}

#[async_trait]
impl DnsProvider for DnsMadeEasyProvider {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, record: &Record) -> bool {
        if let RecordData::Srv { values } = &record.data {
            if values.iter().any(|v| v.target == ".") {
                tracing::warn!(
                    "{}: null SRV records are not supported, {} skipped",
                    self.id,
                    record.name
                );
                return false;
            }
        }
        true
    }

    fn process_desired_zone(&self, mut desired: Zone) -> Result<Zone> {
        let quoted: Vec<Record> = desired
            .records()
            .filter(|r| matches!(&r.data, RecordData::Txt { values } if values.iter().any(|v| v.contains('"'))))
            .cloned()
            .collect();

        for record in quoted {
            if self.strict_supports {
                return Err(Error::validation(format!(
                    "{}: Quotes not supported in TXT values",
                    self.id
                )));
            }

            tracing::warn!(
                "{}: Quotes not supported in TXT values, removing them from {}",
                self.id,
                record.fqdn(desired.name())
            );

            let values = match record.data {
                RecordData::Txt { values } => values.iter().map(|v| v.replace('"', "")).collect(),
                _ => continue,
            };
            desired.add_record(Record::new(record.name, record.ttl, RecordData::Txt { values }), true)?;
        }

        Ok(desired)
    }

    async fn populate(&self, zone: &mut Zone) -> Result<bool> {
        tracing::debug!("populate: name={}", zone.name());

        let records = match self.zone_records(zone.name()).await? {
            Some(records) => records,
            None => {
                tracing::info!("populate: {} does not exist", zone.name());
                return Ok(false);
            }
        };

        let mut sets: BTreeMap<(String, RecordType), Vec<ApiRecord>> = BTreeMap::new();
        for record in records {
            match record.record_type.parse::<RecordType>() {
                Ok(record_type) => sets
                    .entry((record.name.clone(), record_type))
                    .or_default()
                    .push(record),
                Err(_) => tracing::warn!(
                    "populate: skipping unsupported {} record {}",
                    record.record_type,
                    record.name
                ),
            }
        }

        let before = zone.len();
        for ((name, record_type), api_records) in sets {
            let ttl = api_records.first().map(|r| r.ttl).unwrap_or_default();
            let data = data_for(record_type, &api_records)?;
            if let Err(e) = zone.add_record(Record::new(name, ttl, data), false) {
                tracing::warn!("populate: {}", e);
            }
        }

        tracing::info!(
            "populate: found {} records for {}",
            zone.len() - before,
            zone.name()
        );
        Ok(true)
    }

    async fn apply(&self, plan: &Plan) -> Result<ApplyReport> {
        let result = self.apply_plan(plan).await;
        // Remote state changed (at least possibly); the next populate refetches
        self.invalidate(plan.desired.name()).await;
        result
    }
}

/// Remote record ids backing the record set of `record`
fn ids_for<'a>(existing: &'a [ApiRecord], record: &'a Record) -> impl Iterator<Item = u64> + 'a {
    let record_type = record.record_type().as_str();
    existing
        .iter()
        .filter(move |r| r.name == record.name && r.record_type == record_type)
        .map(|r| r.id)
}

/// Creation entries for every value of `record`
fn params_for(record: &Record) -> Vec<RecordParams> {
    let name = record.name.as_str();
    let ttl = record.ttl;

    match &record.data {
        RecordData::A { values } => values
            .iter()
            .map(|v| RecordParams::new(name, "A", v.to_string(), ttl))
            .collect(),
        RecordData::Aaaa { values } => values
            .iter()
            .map(|v| RecordParams::new(name, "AAAA", v.to_string(), ttl))
            .collect(),
        RecordData::Ns { values } => values
            .iter()
            .map(|v| RecordParams::new(name, "NS", v.as_str(), ttl))
            .collect(),
        RecordData::Alias { value } => vec![RecordParams::new(name, "ANAME", value.as_str(), ttl)],
        RecordData::Cname { value } => vec![RecordParams::new(name, "CNAME", value.as_str(), ttl)],
        RecordData::Ptr { value } => vec![RecordParams::new(name, "PTR", value.as_str(), ttl)],
        RecordData::Mx { values } => values
            .iter()
            .map(|v| RecordParams {
                mx_level: Some(v.preference),
                ..RecordParams::new(name, "MX", v.exchange.as_str(), ttl)
            })
            .collect(),
        RecordData::Srv { values } => values
            .iter()
            .map(|v| RecordParams {
                priority: Some(v.priority),
                weight: Some(v.weight),
                port: Some(v.port),
                ..RecordParams::new(name, "SRV", v.target.as_str(), ttl)
            })
            .collect(),
        RecordData::Caa { values } => values
            .iter()
            .map(|v| RecordParams {
                issuer_critical: Some(v.flags),
                caa_type: Some(v.tag.clone()),
                ..RecordParams::new(name, "CAA", v.value.as_str(), ttl)
            })
            .collect(),
        RecordData::Txt { values } => values
            .iter()
            .map(|v| RecordParams::new(name, "TXT", txt::encode(v), ttl))
            .collect(),
    }
}

/// Record content for one (name, type) group of remote records
fn data_for(record_type: RecordType, records: &[ApiRecord]) -> Result<RecordData> {
    let first_value = || records.first().map(|r| r.value.clone()).unwrap_or_default();

    let data = match record_type {
        RecordType::A => RecordData::A {
            values: records
                .iter()
                .map(|r| r.value.parse().map_err(|_| invalid_value(r)))
                .collect::<Result<_>>()?,
        },
        RecordType::Aaaa => RecordData::Aaaa {
            values: records
                .iter()
                .map(|r| r.value.parse().map_err(|_| invalid_value(r)))
                .collect::<Result<_>>()?,
        },
        RecordType::Alias => RecordData::Alias { value: first_value() },
        RecordType::Cname => RecordData::Cname { value: first_value() },
        RecordType::Ptr => RecordData::Ptr { value: first_value() },
        RecordType::Ns => RecordData::Ns {
            values: records.iter().map(|r| r.value.clone()).collect(),
        },
        RecordType::Mx => RecordData::Mx {
            values: records
                .iter()
                .map(|r| MxValue {
                    preference: r.mx_level.unwrap_or_default(),
                    exchange: r.value.clone(),
                })
                .collect(),
        },
        RecordType::Srv => RecordData::Srv {
            values: records
                .iter()
                .map(|r| SrvValue {
                    priority: r.priority.unwrap_or_default(),
                    weight: r.weight.unwrap_or_default(),
                    port: r.port.unwrap_or_default(),
                    target: r.value.clone(),
                })
                .collect(),
        },
        RecordType::Caa => RecordData::Caa {
            values: records
                .iter()
                .map(|r| CaaValue {
                    flags: r.issuer_critical.unwrap_or_default(),
                    tag: r.caa_type.clone().unwrap_or_default(),
                    value: strip_quotes(&r.value).to_string(),
                })
                .collect(),
        },
        RecordType::Txt => RecordData::Txt {
            values: records.iter().map(|r| txt::decode(&r.value)).collect(),
        },
    };

    Ok(data)
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn invalid_value(record: &ApiRecord) -> Error {
    Error::provider(
        PROVIDER_NAME,
        format!(
            "invalid {} value \"{}\" for record {}",
            record.record_type, record.value, record.id
        ),
    )
}
