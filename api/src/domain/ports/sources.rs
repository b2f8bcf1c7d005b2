//! Data source port traits
//!
//! Sources render their requests with the query builders; these ports only
//! execute them against the backing store.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;
use crate::query::SqlQuery;

/// Runs rendered SQL against one of the platform databases
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute `query` and return every row as a JSON object keyed by column name
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Value>, SourceError>;
}

/// Elasticsearch HTTP API
#[async_trait]
pub trait ElasticsearchClient: Send + Sync {
    /// `POST /{index}/_search`
    async fn search(&self, index: &str, body: &Value) -> Result<Value, SourceError>;

    /// `POST /{index}/_count`
    async fn count(&self, index: &str, body: &Value) -> Result<Value, SourceError>;
}
