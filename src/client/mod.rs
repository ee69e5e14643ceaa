//! Elasticsearch client used by the exporter.
//!
//! A thin typed wrapper over the cluster's HTTP API covering exactly the
//! operations the export path needs: connection probing, index/type
//! existence checks, counting, and the scan/scroll protocol. The filter
//! query is passed through opaquely as JSON to both `_count` and `_search`.

pub mod response;

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::error::{ConnectionError, Result};

pub use response::{ClusterInfo, CountResponse, SearchHit, SearchResponse};

/// The default filter predicate: match every document.
pub fn match_all() -> Value {
    json!({ "match_all": {} })
}

/// Handle to one Elasticsearch cluster.
pub struct EsClient {
    http: reqwest::Client,
    base: Url,
}

impl EsClient {
    /// Create a client for the given host URL.
    ///
    /// Performs no I/O; connectivity is only verified by [`EsClient::ping`].
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(host)
            .map_err(|_| ConnectionError::InvalidHost(host.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ConnectionError::InvalidHost(host.to_string()).into());
        }
        // Path joining below relies on a trailing slash.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;

        Ok(Self { http, base })
    }

    /// Probe the cluster root and return its identity.
    pub async fn ping(&self) -> Result<ClusterInfo> {
        let url = self.url("")?;
        let resp = self.http.get(url).send().await.map_err(connect_err)?;
        let resp = check_status(resp).await?;
        let info = resp.json::<ClusterInfo>().await?;
        debug!(
            cluster = %info.cluster_name,
            version = %info.version.number,
            "cluster responded to ping"
        );
        Ok(info)
    }

    /// Check whether an index (or alias) exists.
    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = self.url(index)?;
        let resp = self.http.head(url).send().await.map_err(connect_err)?;
        exists_from_status(resp).await
    }

    /// Check whether a mapping type exists inside an index.
    pub async fn type_exists(&self, index: &str, doc_type: &str) -> Result<bool> {
        let url = self.url(&format!("{index}/_mapping/{doc_type}"))?;
        let resp = self.http.head(url).send().await.map_err(connect_err)?;
        exists_from_status(resp).await
    }

    /// Count documents matching `query`, scoped to the index and optional
    /// mapping types. Uses the same restriction as the scan so the total is
    /// comparable to what the scroll will return.
    pub async fn count(&self, index: &str, types: &[String], query: &Value) -> Result<u64> {
        let url = self.url(&format!("{}/_count", scope(index, types)))?;
        let body = json!({ "query": query });
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(connect_err)?;
        let resp = check_status(resp).await?;
        let count = resp.json::<CountResponse>().await?;
        Ok(count.count)
    }

    /// Open a scroll cursor: the initial search with field projection,
    /// page size and keep-alive. The response carries the first page and
    /// the continuation token.
    pub async fn open_scroll(
        &self,
        index: &str,
        types: &[String],
        query: &Value,
        fields: &[String],
        page_size: Option<u32>,
        keep_alive: &str,
    ) -> Result<SearchResponse> {
        let url = self.url(&format!("{}/_search", scope(index, types)))?;

        let mut body = json!({
            "query": query,
            "fields": fields,
            "_source": false,
            "sort": ["_doc"],
        });
        if let Some(size) = page_size {
            body["size"] = json!(size);
        }

        debug!(index, ?types, keep_alive, "opening scroll cursor");
        let resp = self
            .http
            .post(url)
            .query(&[("scroll", keep_alive)])
            .json(&body)
            .send()
            .await
            .map_err(connect_err)?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<SearchResponse>().await?)
    }

    /// Fetch the next page of an open scroll.
    pub async fn continue_scroll(
        &self,
        scroll_id: &str,
        keep_alive: &str,
    ) -> Result<SearchResponse> {
        let url = self.url("_search/scroll")?;
        let body = json!({ "scroll": keep_alive, "scroll_id": scroll_id });
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(connect_err)?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<SearchResponse>().await?)
    }

    /// Release the server-side scroll context.
    pub async fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        let url = self.url("_search/scroll")?;
        let body = json!({ "scroll_id": [scroll_id] });
        let resp = self
            .http
            .delete(url)
            .json(&body)
            .send()
            .await
            .map_err(connect_err)?;
        check_status(resp).await?;
        debug!("cleared scroll context");
        Ok(())
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|_| ConnectionError::InvalidHost(format!("{}{path}", self.base)).into())
    }
}

/// Scope an API path to the index and optional mapping types, the way typed
/// clusters address them: `index` or `index/type1,type2`.
fn scope(index: &str, types: &[String]) -> String {
    if types.is_empty() {
        index.to_string()
    } else {
        format!("{}/{}", index, types.join(","))
    }
}

fn connect_err(err: reqwest::Error) -> crate::error::EsdumpError {
    ConnectionError::ConnectionFailed(err.to_string()).into()
}

/// Map a non-success status to a [`ConnectionError::RequestFailed`] carrying
/// a truncated body snippet for diagnostics.
async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut body = resp.text().await.unwrap_or_default();
    truncate_utf8(&mut body, 200);
    Err(ConnectionError::RequestFailed {
        status: status.as_u16(),
        body,
    }
    .into())
}

/// Truncate to at most `max` bytes without splitting a multi-byte UTF-8
/// character; error bodies carry arbitrary text such as index names.
fn truncate_utf8(s: &mut String, max: usize) {
    if s.len() > max {
        let cut = (0..=max)
            .rev()
            .find(|&i| s.is_char_boundary(i))
            .unwrap_or(0);
        s.truncate(cut);
    }
}

/// Interpret a HEAD response: 200 means the resource exists, 404 means it
/// does not; anything else is a request failure.
async fn exists_from_status(resp: Response) -> Result<bool> {
    match resp.status() {
        StatusCode::OK => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        status => Err(ConnectionError::RequestFailed {
            status: status.as_u16(),
            body: String::new(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all_shape() {
        assert_eq!(match_all(), json!({"match_all": {}}));
    }

    #[test]
    fn test_scope_with_and_without_types() {
        assert_eq!(scope("customers", &[]), "customers");
        assert_eq!(
            scope("customers", &["customer".to_string(), "lead".to_string()]),
            "customers/customer,lead"
        );
    }

    #[test]
    fn test_new_rejects_invalid_host() {
        assert!(EsClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(EsClient::new("mailto:x@y", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_truncate_utf8_respects_char_boundaries() {
        // A two-byte character straddling the cut point must not split.
        let mut body = "x".repeat(199);
        body.push('é');
        assert_eq!(body.len(), 201);
        truncate_utf8(&mut body, 200);
        assert_eq!(body.len(), 199);

        let mut short = "índice_não_encontrado".to_string();
        let original = short.clone();
        truncate_utf8(&mut short, 200);
        assert_eq!(short, original);

        let mut multi = "ééé".to_string();
        truncate_utf8(&mut multi, 1);
        assert!(multi.is_empty());
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let client = EsClient::new("http://localhost:9200/es", Duration::from_secs(1)).unwrap();
        let url = client.url("customers/_count").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/es/customers/_count");
    }
}
