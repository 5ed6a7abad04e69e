//! Typed snapshots and listing types

use std::collections::HashMap;

use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use serde::Deserialize;

use crate::headers::{self, MetaScope};

/// Account usage counters, parsed from the account HEAD response headers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountInfo {
    /// Number of containers
    pub container_count: u64,
    /// Number of objects
    pub object_count: u64,
    /// Bytes stored
    pub bytes_used: u64,
}

impl AccountInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            container_count: header_u64(headers, headers::ACCOUNT_CONTAINER_COUNT),
            object_count: header_u64(headers, headers::ACCOUNT_OBJECT_COUNT),
            bytes_used: header_u64(headers, headers::ACCOUNT_BYTES_USED),
        }
    }
}

/// Container usage counters, parsed from the container HEAD response headers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Number of objects
    pub object_count: u64,
    /// Bytes stored
    pub bytes_used: u64,
}

impl ContainerInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            object_count: header_u64(headers, headers::CONTAINER_OBJECT_COUNT),
            bytes_used: header_u64(headers, headers::CONTAINER_BYTES_USED),
        }
    }
}

/// Object metadata, parsed from the object HEAD response headers
#[derive(Clone, Debug, Default)]
pub struct ObjectInfo {
    /// Content length in bytes
    pub content_length: u64,
    /// Content type
    pub content_type: Option<String>,
    /// ETag
    pub etag: Option<String>,
    /// Last modified timestamp as sent by the server
    pub last_modified: Option<String>,
    /// User metadata, `X-Object-Meta-` prefix stripped
    pub metadata: HashMap<String, String>,
}

impl ObjectInfo {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            content_length: header_u64(headers, CONTENT_LENGTH.as_str()),
            content_type: header_str(headers, CONTENT_TYPE.as_str()),
            etag: header_str(headers, ETAG.as_str()).map(|s| s.trim_matches('"').to_string()),
            last_modified: header_str(headers, LAST_MODIFIED.as_str()),
            metadata: headers::user_metadata(MetaScope::Object, headers),
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// One object row of a `format=json` container listing
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object name
    pub name: String,
    /// Size in bytes
    pub bytes: u64,
    /// Content hash
    pub hash: String,
    /// Last modified timestamp as sent by the server
    pub last_modified: String,
    /// Content type
    pub content_type: Option<String>,
}

/// One entry of a container listing.
///
/// `Subdir` rows appear when listing with a delimiter.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ListEntry {
    Subdir { subdir: String },
    Object(ObjectSummary),
}

impl ListEntry {
    /// Name of the entry, usable as the next listing marker
    pub fn name(&self) -> &str {
        match self {
            ListEntry::Subdir { subdir } => subdir,
            ListEntry::Object(object) => &object.name,
        }
    }
}

/// One row of a `format=json` account listing
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Container name
    pub name: String,
    /// Number of objects
    pub count: u64,
    /// Bytes stored
    pub bytes: u64,
}

/// Options for listing operations
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    /// Maximum entries to return
    pub limit: Option<u32>,
    /// Return entries strictly after this name
    pub marker: Option<String>,
    /// Filter by prefix
    pub prefix: Option<String>,
    /// Delimiter for grouping pseudo-directories
    pub delimiter: Option<String>,
    /// Response format (`json`, `xml` or plain when unset)
    pub format: Option<String>,
}

impl ListOptions {
    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(marker) = &self.marker {
            query.push(("marker", marker.clone()));
        }
        if let Some(prefix) = &self.prefix {
            query.push(("prefix", prefix.clone()));
        }
        if let Some(delimiter) = &self.delimiter {
            query.push(("delimiter", delimiter.clone()));
        }
        if let Some(format) = &self.format {
            query.push(("format", format.clone()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_list_entries() {
        let json = r#"
        [
            {
                "subdir": "photos/"
            },
            {
                "bytes": 147,
                "hash": "5e6b5b70b0426b1cc1968003e1afa5ad",
                "name": "notes.txt",
                "content_type": "text/plain",
                "last_modified": "2023-11-01T03:00:23.147480"
            }
        ]
        "#;

        let entries: Vec<ListEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            ListEntry::Subdir {
                subdir: "photos/".to_string()
            }
        );
        assert_eq!(entries[0].name(), "photos/");
        assert_eq!(
            entries[1],
            ListEntry::Object(ObjectSummary {
                name: "notes.txt".to_string(),
                bytes: 147,
                hash: "5e6b5b70b0426b1cc1968003e1afa5ad".to_string(),
                last_modified: "2023-11-01T03:00:23.147480".to_string(),
                content_type: Some("text/plain".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_container_summaries() {
        let json = r#"[{"name": "backups", "count": 4, "bytes": 1024}]"#;
        let containers: Vec<ContainerSummary> = serde_json::from_str(json).unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].name, "backups");
        assert_eq!(containers[0].count, 4);
    }

    #[test]
    fn test_account_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Account-Container-Count", HeaderValue::from_static("3"));
        headers.insert("X-Account-Object-Count", HeaderValue::from_static("42"));
        headers.insert("X-Account-Bytes-Used", HeaderValue::from_static("1048576"));

        let info = AccountInfo::from_headers(&headers);
        assert_eq!(info.container_count, 3);
        assert_eq!(info.object_count, 42);
        assert_eq!(info.bytes_used, 1_048_576);
    }

    #[test]
    fn test_missing_counters_parse_as_zero() {
        let info = ContainerInfo::from_headers(&HeaderMap::new());
        assert_eq!(info, ContainerInfo::default());
    }

    #[test]
    fn test_list_options_query() {
        let options = ListOptions {
            limit: Some(1),
            marker: Some("notes.txt".to_string()),
            ..Default::default()
        };
        assert_eq!(
            options.to_query(),
            vec![
                ("limit", "1".to_string()),
                ("marker", "notes.txt".to_string()),
            ]
        );
    }
}
