//! Mock API server helpers for DNS Made Easy provider tests

#![allow(dead_code)]

use mockito::{Mock, ServerGuard};
use std::num::NonZeroUsize;
use zonesync_core::{EngineConfig, Record, RecordData, Zone};
use zonesync_provider_dnsmadeeasy::{ClientOptions, DnsMadeEasyClient, DnsMadeEasyProvider};

/// Zone id of `unit.tests.` in the fixtures
pub const ZONE_ID: u64 = 123123;

/// Read a file from `tests/fixtures`
pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path, e))
}

/// A provider talking to the mock server
pub fn provider(server: &ServerGuard, batch_size: usize, strict_supports: bool) -> DnsMadeEasyProvider {
    let options = ClientOptions {
        base_url: Some(server.url()),
        ..ClientOptions::default()
    };
    let client = DnsMadeEasyClient::new("api", "secret", options).unwrap();
    DnsMadeEasyProvider::new(
        "test",
        client,
        NonZeroUsize::new(batch_size).unwrap(),
        strict_supports,
    )
}

/// `GET /` listing the fixture domains
pub async fn mock_domains(server: &mut ServerGuard) -> Mock {
    json_mock(server, "GET", "/", 200, fixture("domains.json")).await
}

/// `GET /` listing no domains
pub async fn mock_no_domains(server: &mut ServerGuard) -> Mock {
    json_mock(server, "GET", "/", 200, page(serde_json::json!([]))).await
}

/// `GET /id/unit.tests` finding the domain
pub async fn mock_domain(server: &mut ServerGuard) -> Mock {
    json_mock(server, "GET", "/id/unit.tests", 200, fixture("domain.json")).await
}

/// `GET /123123/records` returning `body`
pub async fn mock_records(server: &mut ServerGuard, body: String) -> Mock {
    let path = format!("/{}/records", ZONE_ID);
    json_mock(server, "GET", &path, 200, body).await
}

/// A JSON response mock
pub async fn json_mock(
    server: &mut ServerGuard,
    method: &str,
    path: &str,
    status: usize,
    body: String,
) -> Mock {
    server
        .mock(method, path)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

/// Wrap records in the paged list envelope
pub fn page(data: serde_json::Value) -> String {
    let total = data.as_array().map(|a| a.len()).unwrap_or_default();
    serde_json::json!({
        "totalRecords": total,
        "totalPages": 1,
        "page": 0,
        "data": data,
    })
    .to_string()
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

/// `name A ips..` with a 300s TTL
pub fn a_record(name: &str, ips: &[&str]) -> Record {
    Record::new(
        name,
        300,
        RecordData::A {
            values: ips.iter().map(|ip| ip.parse().unwrap()).collect(),
        },
    )
}

/// `unit.tests.` holding the given records
pub fn unit_tests_zone(records: Vec<Record>) -> Zone {
    let mut zone = Zone::new("unit.tests.").unwrap();
    for record in records {
        zone.add_record(record, false).unwrap();
    }
    zone
}
