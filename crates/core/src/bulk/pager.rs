//! Cursor-driven listing pager with bounded per-page retry
//!
//! Requests one page per call, feeding the cursor from the prior page back
//! verbatim. A failed page request is retried against the same cursor with
//! exponential backoff; exhausting the attempt budget aborts the whole bulk
//! operation with a pagination error rather than looping forever.

use std::time::Duration;

use sable_domain::{QueryPage, Result, SableError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::bulk::config::BulkFetchConfig;
use crate::ports::RecordStore;

/// Walks a filtered record listing page by page.
pub(crate) struct QueryPager<'a> {
    store: &'a dyn RecordStore,
    domain: &'a str,
    filter: Option<&'a str>,
    page_size: usize,
    max_attempts: usize,
    retry_backoff: Duration,
    cursor: Option<String>,
    exhausted: bool,
}

impl<'a> QueryPager<'a> {
    pub(crate) fn new(
        store: &'a dyn RecordStore,
        domain: &'a str,
        filter: Option<&'a str>,
        config: &BulkFetchConfig,
    ) -> Self {
        Self {
            store,
            domain,
            filter,
            page_size: config.page_size,
            max_attempts: config.max_page_attempts.max(1),
            retry_backoff: config.page_retry_backoff,
            cursor: None,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted.
    pub(crate) async fn next_page(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<QueryPage>> {
        if self.exhausted {
            return Ok(None);
        }

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(SableError::Cancelled);
            }

            match self
                .store
                .query_page(self.domain, self.filter, self.cursor.as_deref(), self.page_size)
                .await
            {
                Ok(page) => {
                    self.exhausted = page.is_last();
                    self.cursor.clone_from(&page.next_cursor);
                    return Ok(Some(page));
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        domain = %self.domain,
                        error = %err,
                        "listing page request failed"
                    );
                    if attempt == self.max_attempts {
                        return Err(SableError::Pagination(format!(
                            "page request failed after {} attempts: {err}",
                            self.max_attempts
                        )));
                    }
                    self.backoff(attempt, cancel).await?;
                }
            }
        }

        Err(SableError::Internal("pager exhausted attempts without producing a result".into()))
    }

    async fn backoff(&self, retry_number: usize, cancel: &CancellationToken) -> Result<()> {
        let delay = backoff_delay(self.retry_backoff, retry_number);
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            () = cancel.cancelled() => Err(SableError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn backoff_delay(base: Duration, retry_number: usize) -> Duration {
    let shift = retry_number.saturating_sub(1).min(8) as u32;
    let multiplier = 1u32 << shift;
    base.saturating_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sable_domain::{Attribute, AttributeList, RecordHandle};

    use super::*;

    /// Listing stub: two pages, optionally failing the first `fail_first`
    /// requests. Records every cursor it was handed.
    struct PagedStub {
        fail_first: usize,
        calls: AtomicUsize,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl PagedStub {
        fn new(fail_first: usize) -> Self {
            Self { fail_first, calls: AtomicUsize::new(0), cursors: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl RecordStore for PagedStub {
        async fn fetch_attributes(&self, _record: &RecordHandle) -> Result<AttributeList> {
            Ok(vec![Attribute::named("unused")])
        }

        async fn query_page(
            &self,
            _domain: &str,
            _filter: Option<&str>,
            cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<QueryPage> {
            self.cursors.lock().unwrap().push(cursor.map(ToOwned::to_owned));
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(SableError::Remote("listing unavailable".into()));
            }
            match cursor {
                None => Ok(QueryPage {
                    next_cursor: Some("cursor-1".into()),
                    identifiers: vec!["a".into(), "b".into()],
                }),
                Some("cursor-1") => {
                    Ok(QueryPage { next_cursor: None, identifiers: vec!["c".into()] })
                }
                Some(other) => Err(SableError::Remote(format!("unknown cursor {other}"))),
            }
        }

        async fn delete_attributes(
            &self,
            _record: &RecordHandle,
            _attributes: Option<&[Attribute]>,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn fast_config() -> BulkFetchConfig {
        BulkFetchConfig::builder()
            .max_page_attempts(3)
            .page_retry_backoff(Duration::from_millis(1))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn walks_pages_until_cursor_runs_out() {
        let store = PagedStub::new(0);
        let config = fast_config();
        let cancel = CancellationToken::new();
        let mut pager = QueryPager::new(&store, "inventory", None, &config);

        let first = pager.next_page(&cancel).await.unwrap().unwrap();
        assert_eq!(first.identifiers, vec!["a".to_string(), "b".to_string()]);

        let second = pager.next_page(&cancel).await.unwrap().unwrap();
        assert_eq!(second.identifiers, vec!["c".to_string()]);

        assert!(pager.next_page(&cancel).await.unwrap().is_none());
        // The second request carried the first page's cursor verbatim.
        let cursors = store.cursors.lock().unwrap().clone();
        assert_eq!(cursors, vec![None, Some("cursor-1".to_string())]);
    }

    #[tokio::test]
    async fn retries_same_cursor_then_succeeds() {
        let store = PagedStub::new(1);
        let config = fast_config();
        let cancel = CancellationToken::new();
        let mut pager = QueryPager::new(&store, "inventory", None, &config);

        let first = pager.next_page(&cancel).await.unwrap().unwrap();
        assert_eq!(first.identifiers.len(), 2);

        let cursors = store.cursors.lock().unwrap().clone();
        assert_eq!(cursors, vec![None, None]);
    }

    #[tokio::test]
    async fn aborts_after_bounded_attempts() {
        let store = PagedStub::new(usize::MAX);
        let config = fast_config();
        let cancel = CancellationToken::new();
        let mut pager = QueryPager::new(&store, "inventory", None, &config);

        let result = pager.next_page(&cancel).await;
        assert!(matches!(result, Err(SableError::Pagination(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_stops_paging() {
        let store = PagedStub::new(0);
        let config = fast_config();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut pager = QueryPager::new(&store, "inventory", None, &config);

        let result = pager.next_page(&cancel).await;
        assert!(matches!(result, Err(SableError::Cancelled)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }
}
