//! Elasticsearch adapter
//!
//! HTTP client for the flow-runs index.

pub mod client;

pub use client::HttpElasticsearchClient;
