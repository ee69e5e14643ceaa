//! Streaming cursor abstraction for export runs.
//!
//! [`DocumentStream`] gives the driver a uniform page-at-a-time view of the
//! source. [`ScrollStream`] is the Elasticsearch implementation over the
//! scan/scroll protocol: the continuation token lives here, and `close()`
//! releases the server-side scroll context. The stream must be closed on
//! every exit path, including aborted runs.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{EsClient, SearchHit};
use crate::error::{ExportError, Result};

/// Trait for fetching pages of documents from the source.
#[async_trait]
pub trait DocumentStream: Send {
    /// Fetch the next page of documents.
    ///
    /// # Returns
    /// * `Result<Option<Vec<SearchHit>>>` - Next page, or `None` once the
    ///   cursor is exhausted
    async fn next_page(&mut self) -> Result<Option<Vec<SearchHit>>>;

    /// Close the cursor and release server-side resources.
    async fn close(&mut self) -> Result<()>;
}

/// Scroll-cursor stream over one Elasticsearch search.
pub struct ScrollStream<'a> {
    client: &'a EsClient,
    keep_alive: String,
    scroll_id: Option<String>,
    /// First page, returned by the search that opened the scroll.
    pending: Option<Vec<SearchHit>>,
    total_fetched: u64,
    exhausted: bool,
    closed: bool,
}

impl<'a> ScrollStream<'a> {
    /// Open a scroll cursor scoped to the index, optional mapping types,
    /// filter query and field projection.
    #[allow(clippy::too_many_arguments)]
    pub async fn open(
        client: &'a EsClient,
        index: &str,
        types: &[String],
        query: &Value,
        fields: &[String],
        page_size: Option<u32>,
        keep_alive: &str,
    ) -> Result<ScrollStream<'a>> {
        let resp = client
            .open_scroll(index, types, query, fields, page_size, keep_alive)
            .await?;

        debug!(
            total = resp.hits.total.value(),
            first_page = resp.hits.hits.len(),
            "scroll cursor opened"
        );

        Ok(ScrollStream {
            client,
            keep_alive: keep_alive.to_string(),
            scroll_id: resp.scroll_id,
            pending: Some(resp.hits.hits),
            total_fetched: 0,
            exhausted: false,
            closed: false,
        })
    }
}

#[async_trait]
impl DocumentStream for ScrollStream<'_> {
    async fn next_page(&mut self) -> Result<Option<Vec<SearchHit>>> {
        if self.closed || self.exhausted {
            return Ok(None);
        }

        if let Some(page) = self.pending.take() {
            if page.is_empty() {
                self.exhausted = true;
                return Ok(None);
            }
            self.total_fetched += page.len() as u64;
            return Ok(Some(page));
        }

        let scroll_id = match self.scroll_id.clone() {
            Some(id) => id,
            // Mid-stream the server must hand us a continuation token.
            None => {
                self.exhausted = true;
                return Err(ExportError::Scroll(
                    "server returned no continuation token".to_string(),
                )
                .into());
            }
        };

        let resp = self
            .client
            .continue_scroll(&scroll_id, &self.keep_alive)
            .await?;

        // Keep the previous token if the server did not send a fresh one,
        // so close() can still clear the context.
        if let Some(id) = resp.scroll_id {
            self.scroll_id = Some(id);
        }

        if resp.hits.hits.is_empty() {
            debug!(
                total_fetched = self.total_fetched,
                "scroll cursor exhausted"
            );
            self.exhausted = true;
            Ok(None)
        } else {
            self.total_fetched += resp.hits.hits.len() as u64;
            debug!(
                page = resp.hits.hits.len(),
                total_fetched = self.total_fetched,
                "fetched scroll page"
            );
            Ok(Some(resp.hits.hits))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(id) = self.scroll_id.take() {
            self.client.clear_scroll(&id).await?;
            info!(
                total_fetched = self.total_fetched,
                "closed scroll cursor"
            );
        }
        Ok(())
    }
}

impl Drop for ScrollStream<'_> {
    fn drop(&mut self) {
        // The scroll context cannot be cleared from a synchronous drop;
        // the server reclaims it after the keep-alive expires.
        if !self.closed && self.scroll_id.is_some() {
            debug!("scroll stream dropped without close; context expires after keep-alive");
        }
    }
}
