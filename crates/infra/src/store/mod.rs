//! Remote record store adapters

mod client;

pub use client::{HttpRecordStore, HttpStoreConfig};
