//! Result normalization
//!
//! Every source answers with the same JSON shapes regardless of backend:
//! - `count`, `sum`, `avg`: `{"value": x}`
//! - `list`: `{"results": [...], "next": bool}`
//! - `timeseries_hour_group_count`: 24 zero-filled `{"label": "07h", "value": n}` buckets
//! - `recurrence`: `{"results": [{"label", "value" (percent), "full_value"}]}`

use serde_json::{json, Value};

use crate::error::SourceError;

use super::{Operation, QueryOptions};

/// Normalize rows returned by a SQL source
pub fn from_sql_rows(
    operation: Operation,
    options: &QueryOptions,
    mut rows: Vec<Value>,
) -> Result<Value, SourceError> {
    match operation {
        Operation::Count | Operation::Sum | Operation::Avg => {
            let value = rows
                .first()
                .and_then(|row| row.get("value"))
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| json!(0));
            Ok(json!({ "value": value }))
        }
        Operation::List => {
            let limit = options.limit as usize;
            let next = rows.len() > limit;
            rows.truncate(limit);
            Ok(json!({ "results": rows, "next": next }))
        }
        Operation::TimeseriesHourGroupCount => {
            let mut buckets = [0i64; 24];
            for row in &rows {
                let hour = row.get("label").and_then(Value::as_i64).ok_or_else(|| {
                    SourceError::Decode(format!("timeseries row without hour label: {}", row))
                })?;
                let count = row.get("value").and_then(Value::as_i64).unwrap_or(0);
                if let Some(bucket) = usize::try_from(hour).ok().and_then(|h| buckets.get_mut(h)) {
                    *bucket += count;
                }
            }
            let results: Vec<Value> = buckets
                .iter()
                .enumerate()
                .map(|(hour, count)| json!({ "label": format!("{:02}h", hour), "value": count }))
                .collect();
            Ok(json!({ "results": results }))
        }
        Operation::Recurrence => Err(SourceError::Decode(
            "recurrence is not available for SQL sources".to_string(),
        )),
    }
}

/// Normalize the `_count` endpoint response
pub fn from_elastic_count(response: &Value) -> Result<Value, SourceError> {
    let count = response
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| SourceError::Decode("count response without 'count'".to_string()))?;
    Ok(json!({ "value": count }))
}

/// Normalize a `_search` response
pub fn from_elastic_search(
    operation: Operation,
    options: &QueryOptions,
    response: &Value,
) -> Result<Value, SourceError> {
    match operation {
        Operation::List => {
            let hits = response["hits"]["hits"]
                .as_array()
                .ok_or_else(|| SourceError::Decode("search response without hits".to_string()))?;
            let total = response["hits"]["total"]["value"]
                .as_u64()
                .unwrap_or(hits.len() as u64);
            let results: Vec<Value> = hits
                .iter()
                .map(|hit| hit.get("_source").cloned().unwrap_or(Value::Null))
                .collect();
            let next = options.offset + (results.len() as u64) < total;
            Ok(json!({ "results": results, "next": next }))
        }
        Operation::Recurrence => {
            let buckets = aggregation(response)["buckets"]
                .as_array()
                .cloned()
                .unwrap_or_default();
            let total: u64 = buckets
                .iter()
                .filter_map(|b| b["doc_count"].as_u64())
                .sum();
            let results: Vec<Value> = buckets
                .iter()
                .map(|bucket| {
                    let count = bucket["doc_count"].as_u64().unwrap_or(0);
                    json!({
                        "label": bucket["key"],
                        "value": percentage(count, total),
                        "full_value": count,
                    })
                })
                .collect();
            Ok(json!({ "results": results }))
        }
        Operation::Sum | Operation::Avg => {
            let value = aggregation(response)["value"].as_f64().unwrap_or(0.0);
            Ok(json!({ "value": value }))
        }
        Operation::Count | Operation::TimeseriesHourGroupCount => Err(SourceError::Decode(
            format!("'{}' is not served by a search request", operation),
        )),
    }
}

fn aggregation(response: &Value) -> &Value {
    &response["aggregations"]["values"]["agg_field"]["agg_value"]
}

/// Share of `count` in `total`, in percent with two decimals
fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 10_000.0).round() / 100.0
}
