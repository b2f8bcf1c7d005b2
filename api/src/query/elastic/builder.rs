//! Elasticsearch query builder
//!
//! Clauses are grouped per `bool` block and folded into a single `bool`
//! query by `build_query()`. Aggregations over run results target the nested
//! `values` documents (`name`, `value`, `value_number`).

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::strategy::{BoolBlock, EsFilterStrategy};
use crate::error::QueryError;
use crate::query::filter::Operator;

#[derive(Debug, Clone, Default)]
pub struct ElasticQueryBuilder {
    blocks: BTreeMap<BoolBlock, Vec<Value>>,
    query: Option<Value>,
}

impl ElasticQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(
        &mut self,
        strategy: &dyn EsFilterStrategy,
        field: &str,
        operator: Operator,
        value: &Value,
    ) -> Result<(), QueryError> {
        let clause = strategy.apply(field, operator, value)?;

        let mut leaf = Map::new();
        leaf.insert(clause.field, clause.value);
        let mut wrapper = Map::new();
        wrapper.insert(clause.operation.to_string(), Value::Object(leaf));

        self.blocks
            .entry(clause.block)
            .or_default()
            .push(Value::Object(wrapper));
        Ok(())
    }

    /// Fold the queued clauses into the final `bool` query
    pub fn build_query(&mut self) {
        let query = if self.blocks.is_empty() {
            json!({ "match_all": {} })
        } else {
            let bool_query: Map<String, Value> = self
                .blocks
                .iter()
                .map(|(block, clauses)| (block.as_str().to_string(), Value::Array(clauses.clone())))
                .collect();
            json!({ "bool": bool_query })
        };
        self.query = Some(query);
    }

    fn query(&self, operation: &'static str) -> Result<&Value, QueryError> {
        self.query.as_ref().ok_or(QueryError::NotBuilt(operation))
    }

    /// Paged document listing, newest first
    pub fn list(&self, limit: u64, offset: u64, sort_field: &str) -> Result<Value, QueryError> {
        let query = self.query("list")?;
        Ok(json!({
            "from": offset,
            "size": limit,
            "track_total_hits": true,
            "sort": [{ sort_field: { "order": "desc" } }],
            "query": query,
        }))
    }

    /// Body for the `_count` endpoint
    pub fn count(&self) -> Result<Value, QueryError> {
        let query = self.query("count")?;
        Ok(json!({ "query": query }))
    }

    /// Terms aggregation over the values recorded for `op_field`
    pub fn recurrence(&self, op_field: &str, limit: u64) -> Result<Value, QueryError> {
        let query = self.query("recurrence")?;
        Ok(values_aggregation(
            query,
            op_field,
            json!({ "terms": { "field": "values.value", "size": limit } }),
        ))
    }

    pub fn sum(&self, op_field: &str) -> Result<Value, QueryError> {
        let query = self.query("sum")?;
        Ok(values_aggregation(
            query,
            op_field,
            json!({ "sum": { "field": "values.value_number" } }),
        ))
    }

    pub fn avg(&self, op_field: &str) -> Result<Value, QueryError> {
        let query = self.query("avg")?;
        Ok(values_aggregation(
            query,
            op_field,
            json!({ "avg": { "field": "values.value_number" } }),
        ))
    }
}

fn values_aggregation(query: &Value, op_field: &str, metric: Value) -> Value {
    json!({
        "size": 0,
        "query": query,
        "aggs": {
            "values": {
                "nested": { "path": "values" },
                "aggs": {
                    "agg_field": {
                        "filter": { "term": { "values.name": op_field } },
                        "aggs": { "agg_value": metric }
                    }
                }
            }
        }
    })
}
