//! API resources
//!
//! Every field is optional: the API omits whatever does not apply, and
//! absent fields are left out again when a resource is serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A virtual machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Droplet {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backups_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backups: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<Vec<serde_json::Value>>,
    /// Set on a freshly created droplet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_pub_key: Option<String>,
}

/// A DNS zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_zone_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_file_with_error: Option<String>,
}

/// A DNS record inside a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::opt_u64", skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64", skip_serializing_if = "Option::is_none")]
    pub priority: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64", skip_serializing_if = "Option::is_none")]
    pub port: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64", skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
}

/// Progress of an asynchronous droplet or image operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub droplet_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64", skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u64>,
}

/// Fields sent when creating or editing a DNS record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordParams {
    /// A, CNAME, NS, TXT, MX or SRV
    pub record_type: String,
    pub data: String,
    pub name: Option<String>,
    pub priority: Option<u64>,
    pub port: Option<u64>,
    pub weight: Option<u64>,
}

/// Fields sent when creating a droplet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDroplet {
    pub name: String,
    pub size_id: u64,
    pub image_id: u64,
    pub region_id: u64,
    pub ssh_key_ids: Vec<u64>,
    pub private_networking: bool,
    pub backups_enabled: bool,
}

/// Which images to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFilter {
    #[default]
    All,
    /// Public images only
    Global,
    /// The account's own snapshots and backups
    MyImages,
}

impl ImageFilter {
    pub fn as_param(&self) -> Option<&'static str> {
        match self {
            ImageFilter::All => None,
            ImageFilter::Global => Some("global"),
            ImageFilter::MyImages => Some("my_images"),
        }
    }
}

/// Numbers the API sometimes sends as strings
mod lenient {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrString::Number(n)) => Ok(Some(n)),
            Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
            Some(NumberOrString::String(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_droplet_from_full_json() {
        let droplet: Droplet = serde_json::from_value(json!({
            "id": 100823,
            "name": "test222",
            "image_id": 420,
            "size_id": 33,
            "region_id": 1,
            "backups_active": false,
            "ip_address": "127.0.0.1",
            "private_ip_address": null,
            "locked": false,
            "status": "active",
            "created_at": "2013-01-01T09:30:00Z"
        }))
        .unwrap();

        assert_eq!(droplet.id, 100823);
        assert_eq!(droplet.name.as_deref(), Some("test222"));
        assert_eq!(droplet.private_ip_address, None);
        assert_eq!(droplet.created_at.unwrap().to_rfc3339(), "2013-01-01T09:30:00+00:00");
    }

    #[test]
    fn test_missing_fields_become_none_and_are_skipped() {
        let region: Region = serde_json::from_value(json!({"id": 1})).unwrap();
        assert_eq!(region.name, None);

        let out = serde_json::to_value(&region).unwrap();
        assert_eq!(out, json!({"id": 1}));
    }

    #[test]
    fn test_record_accepts_numeric_strings() {
        let record: Record = serde_json::from_value(json!({
            "id": 16,
            "domain_id": "100",
            "record_type": "MX",
            "name": "@",
            "data": "mail.example.com",
            "priority": 10,
            "port": null,
            "weight": ""
        }))
        .unwrap();

        assert_eq!(record.domain_id, Some(100));
        assert_eq!(record.priority, Some(10));
        assert_eq!(record.port, None);
        assert_eq!(record.weight, None);
    }

    #[test]
    fn test_event_percentage_as_string() {
        let event: Event = serde_json::from_value(json!({
            "id": 7499,
            "action_status": "done",
            "droplet_id": 100824,
            "event_type_id": 1,
            "percentage": "100"
        }))
        .unwrap();

        assert_eq!(event.percentage, Some(100));
    }

    #[test]
    fn test_record_rejects_garbage_number() {
        let result: Result<Record, _> =
            serde_json::from_value(json!({"id": 1, "priority": "high"}));
        assert!(result.is_err());
    }
}
