//! Source query service
//!
//! Runs a source operation end to end: build the backend request, execute it
//! on the right backend, normalize the response.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::entities::ProjectId;
use crate::domain::ports::{ElasticsearchClient, SqlExecutor};
use crate::error::SourceError;
use crate::query::{filters_from_query, Filters};
use crate::sources::{
    results, Operation, QueryOptions, Source, SourceRequest, SqlDatabase, PROJECT_FILTER,
};

/// Executes source queries against the chats DB, flows DB and Elasticsearch
pub struct SourceService<SE, ES>
where
    SE: SqlExecutor,
    ES: ElasticsearchClient,
{
    chats: Arc<SE>,
    flows: Arc<SE>,
    elasticsearch: Arc<ES>,
    flowruns_index: String,
}

impl<SE, ES> SourceService<SE, ES>
where
    SE: SqlExecutor,
    ES: ElasticsearchClient,
{
    pub fn new(chats: Arc<SE>, flows: Arc<SE>, elasticsearch: Arc<ES>, flowruns_index: String) -> Self {
        Self {
            chats,
            flows,
            elasticsearch,
            flowruns_index,
        }
    }

    /// Run `operation` on `source` with a filter map that already carries the project
    pub async fn execute(
        &self,
        source: Source,
        filters: &Filters,
        operation: Operation,
        options: &QueryOptions,
    ) -> Result<Value, SourceError> {
        let request = source.build_request(filters, operation, options)?;

        match request {
            SourceRequest::Sql { database, query } => {
                let executor = match database {
                    SqlDatabase::Chats => &self.chats,
                    SqlDatabase::Flows => &self.flows,
                };
                let rows = executor.fetch_all(&query).await?;
                tracing::debug!(%source, %operation, rows = rows.len(), "Source query finished");
                results::from_sql_rows(operation, options, rows)
            }
            SourceRequest::ElasticSearch(body) => {
                let response = self.elasticsearch.search(&self.flowruns_index, &body).await?;
                results::from_elastic_search(operation, options, &response)
            }
            SourceRequest::ElasticCount(body) => {
                let response = self.elasticsearch.count(&self.flowruns_index, &body).await?;
                results::from_elastic_count(&response)
            }
        }
    }

    /// Run a query scoped to `project_id`; a caller-supplied project filter is replaced
    pub async fn execute_for_project(
        &self,
        project_id: &ProjectId,
        source: Source,
        mut filters: Filters,
        operation: Operation,
        options: &QueryOptions,
    ) -> Result<Value, SourceError> {
        filters.retain(|key, _| key.split("__").next() != Some(PROJECT_FILTER));
        filters.insert(PROJECT_FILTER.to_string(), json!(project_id.to_string()));

        self.execute(source, &filters, operation, options).await
    }

    /// Run a query straight from request parameters: reserved keys become
    /// options, the rest become filters.
    pub async fn query(
        &self,
        project_id: &ProjectId,
        source: Source,
        operation: Operation,
        mut params: HashMap<String, String>,
    ) -> Result<Value, SourceError> {
        let options = QueryOptions::extract(&mut params)?;
        let filters = filters_from_query(&params);
        self.execute_for_project(project_id, source, filters, operation, &options)
            .await
    }
}
