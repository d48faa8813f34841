//! Port interfaces for the remote record store
//!
//! These traits define the boundaries between client logic
//! and infrastructure implementations.

use async_trait::async_trait;
use sable_domain::{Attribute, AttributeList, QueryPage, RecordHandle, Result};

/// Remote key/attribute store accessed over a request/response protocol.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the full attribute list of one record.
    async fn fetch_attributes(&self, record: &RecordHandle) -> Result<AttributeList>;

    /// Fetch one page of a filtered record listing.
    ///
    /// `cursor` is the continuation token returned by the previous page,
    /// passed back verbatim; `None` starts the listing from the beginning.
    async fn query_page(
        &self,
        domain: &str,
        filter: Option<&str>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<QueryPage>;

    /// Delete attributes of a record.
    ///
    /// `None` or an empty slice deletes every attribute the record has.
    async fn delete_attributes(
        &self,
        record: &RecordHandle,
        attributes: Option<&[Attribute]>,
    ) -> Result<()>;
}

/// Callback contract for streaming bulk fetches.
///
/// Invoked once per completed record, from whichever worker task finished
/// that record. Implementations must tolerate concurrent invocation and must
/// not panic; there is no ordering guarantee between records.
pub trait RecordListener: Send + Sync {
    /// Deliver one record's attributes.
    fn on_record(&self, identifier: &str, attributes: AttributeList);
}

impl<F> RecordListener for F
where
    F: Fn(&str, AttributeList) + Send + Sync,
{
    fn on_record(&self, identifier: &str, attributes: AttributeList) {
        self(identifier, attributes);
    }
}
