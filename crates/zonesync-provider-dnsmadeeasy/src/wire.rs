//! DNS Made Easy v2.0 API payloads

use serde::{Deserialize, Serialize};

/// Paged list envelope (`{"data": [...], "page": 0, ...}`)
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
}

/// A managed domain
#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

/// Body of a 400 response
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Vec<String>,
}

/// Domain creation request
#[derive(Debug, Clone, Serialize)]
pub struct NewDomain<'a> {
    pub name: &'a str,
}

/// A record as returned by `GET /{zone_id}/records`
///
/// After [`crate::DnsMadeEasyClient::records`] normalization `record_type`
/// uses zone-model names (`ALIAS`, not `ANAME`) and hostnames are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecord {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub value: String,
    pub ttl: u32,
    #[serde(default)]
    pub mx_level: Option<u16>,
    #[serde(default)]
    pub priority: Option<u16>,
    #[serde(default)]
    pub weight: Option<u16>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub issuer_critical: Option<u8>,
    #[serde(default)]
    pub caa_type: Option<String>,
}

/// One entry of a `createMulti` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordParams {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    pub ttl: u32,
    pub gtd_location: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mx_level: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_critical: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caa_type: Option<String>,
}

impl RecordParams {
    /// Plain `name type value ttl` entry in the default GTD location
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
        ttl: u32,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            value: value.into(),
            ttl,
            gtd_location: "DEFAULT",
            mx_level: None,
            priority: None,
            weight: None,
            port: None,
            issuer_critical: None,
            caa_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_record_ignores_unknown_fields() {
        let record: ApiRecord = serde_json::from_value(json!({
            "id": 11189874,
            "name": "",
            "type": "MX",
            "value": "smtp-1.unit.tests.",
            "ttl": 300,
            "mxLevel": 10,
            "source": 1,
            "dynamicDns": false,
            "failover": false,
            "gtdLocation": "DEFAULT",
            "sourceId": 123123
        }))
        .unwrap();

        assert_eq!(record.record_type, "MX");
        assert_eq!(record.mx_level, Some(10));
        assert_eq!(record.priority, None);
    }

    #[test]
    fn params_skip_unset_options() {
        let params = RecordParams::new("www", "A", "1.2.3.4", 300);
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "name": "www",
                "type": "A",
                "value": "1.2.3.4",
                "ttl": 300,
                "gtdLocation": "DEFAULT"
            })
        );
    }

    #[test]
    fn caa_params_use_camel_case() {
        let params = RecordParams {
            issuer_critical: Some(0),
            caa_type: Some("issue".to_string()),
            ..RecordParams::new("", "CAA", "ca.unit.tests", 3600)
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["issuerCritical"], 0);
        assert_eq!(value["caaType"], "issue");
    }
}
