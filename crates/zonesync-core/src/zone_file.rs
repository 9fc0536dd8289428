// # Zone Files
//
// Desired zone state is read from JSON files:
//
// ```json
// {
//   "name": "example.com.",
//   "records": [
//     { "name": "www", "type": "A", "ttl": 300, "values": ["1.2.3.4"] },
//     { "name": "", "type": "MX", "values": [{ "preference": 10, "exchange": "mx.example.com." }] },
//     { "name": "docs", "type": "CNAME", "value": "example.com." }
//   ]
// }
// ```
//
// Single-valued kinds (ALIAS, CNAME, PTR) use `value`; all other kinds use
// `values`. `ttl` defaults to 3600.

use crate::error::{Error, Result};
use crate::record::{Record, RecordType};
use crate::zone::Zone;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ZoneFileFormat {
    name: String,
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

/// Parse a zone from its JSON representation
pub fn parse_zone(content: &str) -> Result<Zone> {
    let file: ZoneFileFormat = serde_json::from_str(content)?;

    let mut zone = Zone::new(file.name)?;
    for raw in file.records {
        // Unknown kinds are a validation failure, not a parse error
        if let Some(kind) = raw.get("type").and_then(|t| t.as_str()) {
            kind.parse::<RecordType>()?;
        }
        let record: Record = serde_json::from_value(raw)?;
        zone.add_record(record, false)?;
    }
    Ok(zone)
}

/// Load a zone from a JSON file
pub async fn load_zone_file(path: impl AsRef<Path>) -> Result<Zone> {
    let path = path.as_ref();
    tracing::debug!("Loading zone file: {}", path.display());

    let content = fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!("Failed to read zone file {}: {}", path.display(), e))
    })?;

    parse_zone(&content).map_err(|e| match e {
        Error::Json(json) => Error::config(format!(
            "Failed to parse zone file {}: {}",
            path.display(),
            json
        )),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordData, RecordType};
    use tempfile::tempdir;

    const EXAMPLE: &str = r#"{
        "name": "example.com.",
        "records": [
            {"name": "", "type": "A", "ttl": 300, "values": ["1.2.3.5", "1.2.3.4"]},
            {"name": "", "type": "ALIAS", "ttl": 1800, "value": "aname.example.com."},
            {"name": "_srv._tcp", "type": "SRV", "ttl": 600,
             "values": [{"priority": 10, "weight": 20, "port": 30, "target": "foo-1.example.com."}]},
            {"name": "txt", "type": "TXT", "ttl": 600, "values": ["Bah bah black sheep", "have you any wool."]}
        ]
    }"#;

    #[test]
    fn parses_records_of_several_kinds() {
        let zone = parse_zone(EXAMPLE).unwrap();
        assert_eq!(zone.name(), "example.com.");
        assert_eq!(zone.len(), 4);

        let apex = zone.get("", RecordType::A).unwrap();
        assert_eq!(apex.ttl, 300);
        assert_eq!(
            apex.data,
            RecordData::A {
                values: vec!["1.2.3.4".parse().unwrap(), "1.2.3.5".parse().unwrap()]
            }
        );
        assert!(zone.get("_srv._tcp", RecordType::Srv).is_some());
    }

    #[test]
    fn duplicate_records_are_rejected() {
        let content = r#"{"name": "example.com.", "records": [
            {"name": "www", "type": "A", "values": ["1.2.3.4"]},
            {"name": "www", "type": "A", "values": ["1.2.3.5"]}
        ]}"#;
        assert!(matches!(parse_zone(content), Err(Error::Validation(_))));
    }

    #[test]
    fn unsupported_record_types_are_validation_errors() {
        let content = r#"{"name": "example.com.", "records": [
            {"name": "", "type": "SPF", "values": ["v=spf1 -all"]}
        ]}"#;
        let err = parse_zone(content).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("SPF"));
    }

    #[tokio::test]
    async fn unsupported_record_types_survive_loading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("example.com.json");
        fs::write(&path, r#"{"name": "example.com.", "records": [{"type": "HTTPRED", "value": "x"}]}"#)
            .await
            .unwrap();

        let err = load_zone_file(&path).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn relative_zone_names_are_rejected() {
        assert!(parse_zone(r#"{"name": "example.com"}"#).is_err());
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("example.com.json");
        fs::write(&path, EXAMPLE).await.unwrap();

        let zone = load_zone_file(&path).await.unwrap();
        assert_eq!(zone.len(), 4);
    }

    #[tokio::test]
    async fn missing_and_corrupt_files_are_config_errors() {
        let dir = tempdir().unwrap();

        let missing = load_zone_file(dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(Error::Config(_))));

        let path = dir.path().join("corrupt.json");
        fs::write(&path, b"not json").await.unwrap();
        let corrupt = load_zone_file(&path).await;
        assert!(matches!(corrupt, Err(Error::Config(_))));
    }
}
