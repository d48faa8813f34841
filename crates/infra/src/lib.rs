//! # Sable Infra
//!
//! Infrastructure layer - adapters behind the core ports.
//!
//! This crate contains:
//! - The HTTP-backed implementation of the `RecordStore` port
//!
//! ## Architecture
//! - Implements `sable-core` traits against concrete transports
//! - Core logic never depends on this crate; wiring happens at the edge

pub mod store;

pub use store::{HttpRecordStore, HttpStoreConfig};
