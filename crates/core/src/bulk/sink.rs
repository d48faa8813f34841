//! Result delivery for completed fetch tasks
//!
//! Two variants: aggregate into a concurrency-safe map handed back to the
//! caller once the pool drains, or stream each record to a caller-supplied
//! listener as it completes.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use sable_domain::{AttributeList, Result, SableError};

use crate::ports::RecordListener;

/// Destination for completed fetch results.
pub(crate) enum ResultSink {
    /// Collect results keyed by record identifier.
    Aggregate(AttributeAggregator),
    /// Deliver each record to the listener as it completes.
    Stream(Arc<dyn RecordListener>),
}

impl ResultSink {
    pub(crate) fn aggregate() -> Self {
        Self::Aggregate(AttributeAggregator::default())
    }

    pub(crate) fn stream(listener: Arc<dyn RecordListener>) -> Self {
        Self::Stream(listener)
    }

    /// Record one completed fetch.
    ///
    /// Called from whichever worker task finished the record; safe for
    /// concurrent use and makes no cross-record ordering promise.
    pub(crate) fn record(&self, identifier: String, attributes: AttributeList) {
        match self {
            Self::Aggregate(aggregator) => aggregator.insert(identifier, attributes),
            Self::Stream(listener) => listener.on_record(&identifier, attributes),
        }
    }
}

/// Concurrent map of record identifier to attribute list.
///
/// Each fetch task writes only its own record's entry, so contention is on
/// the map structure alone.
#[derive(Default)]
pub(crate) struct AttributeAggregator {
    entries: DashMap<String, AttributeList>,
}

impl AttributeAggregator {
    fn insert(&self, identifier: String, attributes: AttributeList) {
        self.entries.insert(identifier, attributes);
    }

    fn into_map(self) -> HashMap<String, AttributeList> {
        self.entries.into_iter().collect()
    }
}

/// Take the aggregated mapping back after the pool has drained.
///
/// By then every worker task has dropped its sink reference, so the `Arc`
/// unwraps to sole ownership.
pub(crate) fn take_aggregated(sink: Arc<ResultSink>) -> Result<HashMap<String, AttributeList>> {
    match Arc::try_unwrap(sink) {
        Ok(ResultSink::Aggregate(aggregator)) => Ok(aggregator.into_map()),
        Ok(ResultSink::Stream(_)) => {
            Err(SableError::Internal("streaming sink carries no aggregate result".into()))
        }
        Err(_) => Err(SableError::Internal("result sink still shared after drain".into())),
    }
}
