//! Wire types for the Elasticsearch HTTP API.
//!
//! Only the parts of the responses that the exporter actually consumes are
//! modeled here; everything else is ignored during deserialization.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Response of `GET /` — cluster identity and version.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    /// Cluster name.
    #[serde(default)]
    pub cluster_name: String,

    /// Server version block.
    pub version: VersionInfo,
}

/// Version block inside [`ClusterInfo`].
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    /// Version number, e.g. `"7.17.9"`.
    pub number: String,
}

/// Response of `_count`.
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// Response of `_search` and `_search/scroll`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Continuation token for the next scroll request.
    ///
    /// Absent on clusters that do not return one (e.g. a plain search).
    #[serde(rename = "_scroll_id")]
    pub scroll_id: Option<String>,

    /// Matched documents for this page.
    pub hits: HitsEnvelope,
}

/// The `hits` object wrapping total count and the page of hits.
#[derive(Debug, Clone, Deserialize)]
pub struct HitsEnvelope {
    /// Total matching documents.
    pub total: TotalHits,

    /// Hits on this page. An empty page signals scroll exhaustion.
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// Total hit count, which changed shape across server major versions:
/// older clusters return a bare number, newer ones an object with a
/// `value` and a `relation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Legacy(u64),
    Tracked { value: u64 },
}

impl TotalHits {
    /// The total as a plain number, whatever the wire shape was.
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Legacy(n) => *n,
            TotalHits::Tracked { value } => *value,
        }
    }
}

/// A single document hit with its projected fields.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,

    /// Mapping type, absent on typeless clusters.
    #[serde(rename = "_type", default)]
    pub doc_type: Option<String>,

    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,

    /// Projected field values. Each value is an array of scalar items;
    /// a field missing from the document is missing from the map.
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl SearchHit {
    /// Human-readable source location for error reporting.
    pub fn location(&self) -> String {
        match &self.doc_type {
            Some(t) => format!("{}/{}/{}", self.index, t, self.id),
            None => format!("{}/{}", self.index, self.id),
        }
    }
}
