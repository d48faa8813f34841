//! Per-bulk-call fetch pool
//!
//! Executes one fetch task per record under the admission controller's
//! concurrency limit. A fresh pool is constructed for every bulk call and
//! drained to completion before the call returns; nothing carries over
//! between calls.

use std::sync::Arc;

use sable_domain::{RecordHandle, Result};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::bulk::admission::{Admission, AdmissionController};
use crate::bulk::config::BulkFetchConfig;
use crate::bulk::sink::ResultSink;
use crate::ports::RecordStore;

pub(crate) struct FetchPool {
    tasks: JoinSet<()>,
    admission: AdmissionController,
    cancel: CancellationToken,
}

impl FetchPool {
    pub(crate) fn new(config: &BulkFetchConfig, cancel: CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            admission: AdmissionController::new(config.max_concurrent, config.admission_wait),
            cancel,
        }
    }

    /// Submit one record fetch.
    ///
    /// Suspends until the admission controller grants a slot (spawning the
    /// task) or the admission wait elapses (running the fetch inline before
    /// returning). Errs only when the cancellation token fires.
    pub(crate) async fn submit(
        &mut self,
        store: Arc<dyn RecordStore>,
        record: RecordHandle,
        sink: Arc<ResultSink>,
    ) -> Result<()> {
        self.reap_finished();

        match self.admission.admit(&self.cancel).await? {
            Admission::Slot(permit) => {
                self.tasks.spawn(async move {
                    let _permit = permit;
                    fetch_one(store.as_ref(), &record, &sink).await;
                });
            }
            Admission::RunInline => fetch_one(store.as_ref(), &record, &sink).await,
        }
        Ok(())
    }

    /// Wait for every submitted task to finish.
    ///
    /// Never fails: panicked tasks are logged and skipped. In-flight fetches
    /// always run to completion, cancelled or not.
    pub(crate) async fn drain(mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            log_join_outcome(joined);
        }
    }

    /// Fetches that ran inline after an elapsed admission wait.
    pub(crate) fn inline_runs(&self) -> u64 {
        self.admission.inline_runs()
    }

    // Drop already-finished handles so the join set tracks in-flight work,
    // not the whole submission history.
    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            log_join_outcome(joined);
        }
    }
}

/// Fetch one record and hand the result to the sink.
///
/// A failed fetch is logged and the record is skipped; bulk operations
/// favour partial success over aborting the whole call.
async fn fetch_one(store: &dyn RecordStore, record: &RecordHandle, sink: &ResultSink) {
    match store.fetch_attributes(record).await {
        Ok(attributes) => sink.record(record.identifier.clone(), attributes),
        Err(err) => {
            warn!(
                domain = %record.domain,
                identifier = %record.identifier,
                error = %err,
                "attribute fetch failed; record skipped"
            );
        }
    }
}

fn log_join_outcome(joined: std::result::Result<(), JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "fetch task ended abnormally");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use sable_domain::{Attribute, AttributeList, QueryPage, SableError};

    use super::*;

    struct SlowStore {
        delay: Duration,
        fetches: AtomicUsize,
    }

    impl SlowStore {
        fn new(delay: Duration) -> Self {
            Self { delay, fetches: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl RecordStore for SlowStore {
        async fn fetch_attributes(&self, record: &RecordHandle) -> Result<AttributeList> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(vec![Attribute::new("id", record.identifier.clone())])
        }

        async fn query_page(
            &self,
            _domain: &str,
            _filter: Option<&str>,
            _cursor: Option<&str>,
            _page_size: usize,
        ) -> Result<QueryPage> {
            Err(SableError::Remote("not a listing store".into()))
        }

        async fn delete_attributes(
            &self,
            _record: &RecordHandle,
            _attributes: Option<&[Attribute]>,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn config(max_concurrent: usize, wait: Option<Duration>) -> BulkFetchConfig {
        let builder = BulkFetchConfig::builder().max_concurrent(max_concurrent);
        let builder = match wait {
            Some(wait) => builder.admission_wait(wait),
            None => builder.block_until_admitted(),
        };
        builder.build().unwrap()
    }

    #[tokio::test]
    async fn drains_every_submitted_task() {
        let store = Arc::new(SlowStore::new(Duration::from_millis(2)));
        let sink = Arc::new(ResultSink::aggregate());
        let mut pool = FetchPool::new(&config(4, None), CancellationToken::new());

        for i in 0..20 {
            let record = RecordHandle::new("inventory", format!("item-{i}"));
            pool.submit(
                Arc::clone(&store) as Arc<dyn RecordStore>,
                record,
                Arc::clone(&sink),
            )
            .await
            .unwrap();
        }
        pool.drain().await;

        assert_eq!(store.fetches.load(Ordering::SeqCst), 20);
        let map = crate::bulk::sink::take_aggregated(sink).unwrap();
        assert_eq!(map.len(), 20);
    }

    #[tokio::test]
    async fn saturation_runs_inline_instead_of_dropping() {
        let store = Arc::new(SlowStore::new(Duration::from_millis(10)));
        let sink = Arc::new(ResultSink::aggregate());
        let mut pool =
            FetchPool::new(&config(1, Some(Duration::from_millis(1))), CancellationToken::new());

        for i in 0..10 {
            let record = RecordHandle::new("inventory", format!("item-{i}"));
            pool.submit(
                Arc::clone(&store) as Arc<dyn RecordStore>,
                record,
                Arc::clone(&sink),
            )
            .await
            .unwrap();
        }

        let inline_runs = pool.inline_runs();
        pool.drain().await;

        assert!(inline_runs > 0, "expected the admission wait to elapse at least once");
        let map = crate::bulk::sink::take_aggregated(sink).unwrap();
        assert_eq!(map.len(), 10);
    }

    #[tokio::test]
    async fn cancelled_pool_rejects_new_submissions() {
        let store = Arc::new(SlowStore::new(Duration::from_millis(1)));
        let sink = Arc::new(ResultSink::aggregate());
        let cancel = CancellationToken::new();
        let mut pool = FetchPool::new(&config(2, None), cancel.clone());

        cancel.cancel();
        let record = RecordHandle::new("inventory", "item-0");
        let result = pool
            .submit(Arc::clone(&store) as Arc<dyn RecordStore>, record, Arc::clone(&sink))
            .await;

        assert!(matches!(result, Err(SableError::Cancelled)));
        pool.drain().await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
    }
}
