//! Bounded-concurrency bulk fetch subsystem
//!
//! Fans out one remote request per record under a configured concurrency
//! limit, aggregates or streams the results, and pages through cursor-based
//! listings so arbitrarily large result sets never have to be held in memory
//! at once. Saturation degrades to inline execution on the submitting task
//! instead of dropping work.

mod admission;
mod config;
mod pager;
mod pool;
mod sink;

pub use config::{BulkFetchConfig, BulkFetchConfigBuilder};
pub(crate) use pager::QueryPager;
pub(crate) use pool::FetchPool;
pub(crate) use sink::{take_aggregated, ResultSink};
