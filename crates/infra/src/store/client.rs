//! HTTP-backed record store
//!
//! Implements the `RecordStore` port against a JSON/REST endpoint. Transport
//! failures, non-success statuses, and body-parse failures all map uniformly
//! to [`SableError::Remote`]; retry policy belongs to the callers driving
//! this adapter, not to the transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use sable_core::RecordStore;
use sable_domain::{Attribute, AttributeList, QueryPage, RecordHandle, Result, SableError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for [`HttpRecordStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the record store API (e.g. `https://store.example.com/v1`)
    pub base_url: String,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// User agent reported to the store
    pub user_agent: String,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("sable/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP implementation of the `RecordStore` port.
pub struct HttpRecordStore {
    client: Client,
    config: HttpStoreConfig,
}

#[derive(Debug, Deserialize)]
struct AttributesResponse {
    attributes: Vec<Attribute>,
}

#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    identifiers: Vec<String>,
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteAttributesRequest<'a> {
    attributes: &'a [Attribute],
}

impl HttpRecordStore {
    /// Create a store adapter with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpStoreConfig::default())
    }

    /// Create a store adapter with custom configuration.
    pub fn with_config(config: HttpStoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| SableError::Remote(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { client, config })
    }

    fn record_url(&self, record: &RecordHandle) -> String {
        format!(
            "{}/domains/{}/records/{}/attributes",
            self.config.base_url,
            urlencoding::encode(&record.domain),
            urlencoding::encode(&record.identifier)
        )
    }

    fn listing_url(&self, domain: &str) -> String {
        format!("{}/domains/{}/records", self.config.base_url, urlencoding::encode(domain))
    }

    async fn into_success(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(SableError::Remote(format!("{context} failed ({status}): {body}")))
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_attributes(&self, record: &RecordHandle) -> Result<AttributeList> {
        let url = self.record_url(record);
        debug!(url = %url, "fetching record attributes");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| SableError::Remote(format!("attribute fetch failed: {err}")))?;
        let response = Self::into_success(response, "attribute fetch").await?;

        let parsed: AttributesResponse = response.json().await.map_err(|err| {
            SableError::Remote(format!("failed to parse attribute response: {err}"))
        })?;
        Ok(parsed.attributes)
    }

    async fn query_page(
        &self,
        domain: &str,
        filter: Option<&str>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<QueryPage> {
        let url = self.listing_url(domain);
        debug!(url = %url, page_size, "requesting listing page");

        let mut request = self.client.get(&url).query(&[("limit", page_size.to_string())]);
        if let Some(filter) = filter {
            request = request.query(&[("filter", filter)]);
        }
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SableError::Remote(format!("listing page request failed: {err}")))?;
        let response = Self::into_success(response, "listing page").await?;

        let parsed: ListRecordsResponse = response
            .json()
            .await
            .map_err(|err| SableError::Remote(format!("failed to parse listing page: {err}")))?;
        Ok(QueryPage { next_cursor: parsed.next_cursor, identifiers: parsed.identifiers })
    }

    async fn delete_attributes(
        &self,
        record: &RecordHandle,
        attributes: Option<&[Attribute]>,
    ) -> Result<()> {
        let url = self.record_url(record);
        let mut request = self.client.delete(&url);

        // No body carries delete-all semantics.
        match attributes {
            Some(named) if !named.is_empty() => {
                debug!(url = %url, count = named.len(), "deleting named attributes");
                request = request.json(&DeleteAttributesRequest { attributes: named });
            }
            _ => debug!(url = %url, "deleting all attributes"),
        }

        let response = request
            .send()
            .await
            .map_err(|err| SableError::Remote(format!("attribute delete failed: {err}")))?;
        Self::into_success(response, "attribute delete").await?;
        Ok(())
    }
}
