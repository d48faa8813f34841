//! Per-domain client facade
//!
//! `DomainClient` exposes the operations of one domain (namespace) of the
//! remote record store: single-record fetch, paged listing, deletes, and the
//! three bulk fetch entry points backed by the bounded pool in [`crate::bulk`].

use std::collections::HashMap;
use std::sync::Arc;

use sable_domain::{Attribute, AttributeList, QueryPage, RecordHandle, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::bulk::{take_aggregated, BulkFetchConfig, FetchPool, QueryPager, ResultSink};
use crate::ports::{RecordListener, RecordStore};

/// Client for one domain of the remote record store.
pub struct DomainClient {
    domain: String,
    store: Arc<dyn RecordStore>,
    config: BulkFetchConfig,
    cancellation: CancellationToken,
}

impl DomainClient {
    /// Create a client for `domain` backed by `store`.
    pub fn new(domain: impl Into<String>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            domain: domain.into(),
            store,
            config: BulkFetchConfig::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Replace the bulk fetch configuration.
    ///
    /// Configure before issuing bulk calls; adjusting the limits while a
    /// bulk call is in flight is undefined.
    pub fn with_config(mut self, config: BulkFetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a cancellation token honoured at bulk submission and page
    /// request boundaries. In-flight fetches still run to completion.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Name of the domain this client addresses.
    pub fn name(&self) -> &str {
        &self.domain
    }

    /// The active bulk fetch configuration.
    pub fn config(&self) -> &BulkFetchConfig {
        &self.config
    }

    /// Fetch one record's attributes.
    pub async fn get_attributes(&self, identifier: &str) -> Result<AttributeList> {
        self.store.fetch_attributes(&self.handle(identifier)).await
    }

    /// First page of the filtered record listing, using the configured page
    /// size.
    pub async fn list_records(&self, filter: Option<&str>) -> Result<QueryPage> {
        self.list_records_page(filter, None, self.config.page_size).await
    }

    /// One explicit listing page.
    ///
    /// `cursor` comes from the previous page's `next_cursor` and is passed
    /// to the store verbatim.
    pub async fn list_records_page(
        &self,
        filter: Option<&str>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<QueryPage> {
        self.store.query_page(&self.domain, filter, cursor, page_size).await
    }

    /// Delete a record entirely.
    pub async fn delete_record(&self, identifier: &str) -> Result<()> {
        self.store.delete_attributes(&self.handle(identifier), None).await
    }

    /// Delete the named attributes of a record.
    ///
    /// An empty list carries delete-all semantics, same as
    /// [`Self::delete_record`].
    pub async fn delete_attributes(
        &self,
        identifier: &str,
        attributes: &[Attribute],
    ) -> Result<()> {
        self.store.delete_attributes(&self.handle(identifier), Some(attributes)).await
    }

    /// Bulk-fetch attributes for every identifier, aggregating the results.
    ///
    /// Returns once every fetch has completed. Records whose fetch failed
    /// are missing from the mapping; the call itself still succeeds.
    #[instrument(skip(self, identifiers), fields(domain = %self.domain, count = identifiers.len()))]
    pub async fn fetch_all(
        &self,
        identifiers: &[String],
    ) -> Result<HashMap<String, AttributeList>> {
        self.config.validate()?;
        let sink = Arc::new(ResultSink::aggregate());
        self.run_bulk(identifiers, Arc::clone(&sink)).await?;
        take_aggregated(sink)
    }

    /// Bulk-fetch with per-record delivery through `listener`.
    ///
    /// Returns once every fetch has completed; failed records never reach
    /// the listener.
    #[instrument(skip(self, identifiers, listener), fields(domain = %self.domain, count = identifiers.len()))]
    pub async fn fetch_all_streaming(
        &self,
        identifiers: &[String],
        listener: Arc<dyn RecordListener>,
    ) -> Result<()> {
        self.config.validate()?;
        self.run_bulk(identifiers, Arc::new(ResultSink::stream(listener))).await
    }

    /// Query-driven bulk fetch: pages through the filtered listing and
    /// fetches every listed record, streaming results through `listener`.
    ///
    /// Each page's identifiers are fully submitted before the next page is
    /// requested. Aborts with a pagination error when the listing cannot
    /// make progress within the configured retry budget.
    #[instrument(skip(self, listener), fields(domain = %self.domain))]
    pub async fn fetch_by_query(
        &self,
        filter: Option<&str>,
        listener: Arc<dyn RecordListener>,
    ) -> Result<()> {
        self.config.validate()?;
        let sink = Arc::new(ResultSink::stream(listener));
        let mut pool = FetchPool::new(&self.config, self.cancellation.clone());
        let mut pager = QueryPager::new(self.store.as_ref(), &self.domain, filter, &self.config);

        let mut outcome = Ok(());
        'pages: loop {
            match pager.next_page(&self.cancellation).await {
                Ok(Some(page)) => {
                    debug!(identifiers = page.identifiers.len(), "submitting listing page");
                    for identifier in page.identifiers {
                        let record = RecordHandle::new(self.domain.clone(), identifier);
                        if let Err(err) =
                            pool.submit(Arc::clone(&self.store), record, Arc::clone(&sink)).await
                        {
                            outcome = Err(err);
                            break 'pages;
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        // Whatever stopped submission, every spawned fetch runs to completion.
        let inline_runs = pool.inline_runs();
        pool.drain().await;
        if inline_runs > 0 {
            debug!(inline_runs, "saturation fallback ran fetches inline");
        }
        outcome
    }

    /// Submit one fetch task per identifier, then drain the pool.
    async fn run_bulk(&self, identifiers: &[String], sink: Arc<ResultSink>) -> Result<()> {
        let mut pool = FetchPool::new(&self.config, self.cancellation.clone());
        let mut outcome = Ok(());
        for identifier in identifiers {
            let record = self.handle(identifier);
            if let Err(err) =
                pool.submit(Arc::clone(&self.store), record, Arc::clone(&sink)).await
            {
                outcome = Err(err);
                break;
            }
        }
        let inline_runs = pool.inline_runs();
        pool.drain().await;
        if inline_runs > 0 {
            debug!(inline_runs, "saturation fallback ran fetches inline");
        }
        outcome
    }

    fn handle(&self, identifier: &str) -> RecordHandle {
        RecordHandle::new(self.domain.clone(), identifier)
    }
}
