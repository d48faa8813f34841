//! Common data types used throughout the workspace

use serde::{Deserialize, Serialize};

/// A single named attribute of a record. The value is optional: a record may
/// carry a bare attribute name with no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    /// Create an attribute with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()) }
    }

    /// Create a value-less attribute.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }
}

/// Ordered attribute sequence produced by a successful record fetch.
pub type AttributeList = Vec<Attribute>;

/// Addresses one record inside a domain.
///
/// Created on demand by the orchestrator for each record it touches; each
/// fetch task owns exactly one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHandle {
    /// Namespace the record lives in.
    pub domain: String,
    /// Record key within the domain.
    pub identifier: String,
}

impl RecordHandle {
    /// Build a handle for `identifier` inside `domain`.
    pub fn new(domain: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self { domain: domain.into(), identifier: identifier.into() }
    }
}

/// One page of a filtered record listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPage {
    /// Continuation token for the next page. `None` or empty means the
    /// listing is exhausted; a non-empty cursor must be passed back verbatim.
    pub next_cursor: Option<String>,
    /// Record identifiers in page order.
    pub identifiers: Vec<String>,
}

impl QueryPage {
    /// Whether this page marks the end of the listing.
    pub fn is_last(&self) -> bool {
        match &self.next_cursor {
            Some(cursor) => cursor.trim().is_empty(),
            None => true,
        }
    }
}
