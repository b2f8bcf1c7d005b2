//! Elasticsearch filter strategy
//!
//! Maps one condition onto a `bool` query block (`must` / `must_not`) and a
//! leaf query type (`term`, `terms`, `range`, `wildcard`, `exists`).

use serde_json::{json, Value};

use crate::error::QueryError;
use crate::query::filter::{is_truthy, Operator};

/// Section of the `bool` query a clause lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BoolBlock {
    Must,
    MustNot,
}

impl BoolBlock {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolBlock::Must => "must",
            BoolBlock::MustNot => "must_not",
        }
    }
}

/// A translated condition: `{block: [{operation: {field: value}}]}`
#[derive(Debug, Clone, PartialEq)]
pub struct EsClause {
    pub field: String,
    pub value: Value,
    pub block: BoolBlock,
    pub operation: &'static str,
}

/// Translates a single condition into an Elasticsearch clause
pub trait EsFilterStrategy: Send + Sync {
    fn apply(&self, field: &str, operator: Operator, value: &Value)
        -> Result<EsClause, QueryError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ElasticFilterStrategy;

impl EsFilterStrategy for ElasticFilterStrategy {
    fn apply(
        &self,
        field: &str,
        operator: Operator,
        value: &Value,
    ) -> Result<EsClause, QueryError> {
        let clause = |block, operation, value| EsClause {
            field: field.to_string(),
            value,
            block,
            operation,
        };

        match operator {
            Operator::Eq => Ok(clause(BoolBlock::Must, "term", value.clone())),
            Operator::In => {
                let values = match value {
                    Value::Array(items) => items.clone(),
                    other => vec![other.clone()],
                };
                Ok(clause(BoolBlock::Must, "terms", Value::Array(values)))
            }
            Operator::Gte => Ok(clause(BoolBlock::Must, "range", json!({ "gte": value }))),
            Operator::Lte => Ok(clause(BoolBlock::Must, "range", json!({ "lte": value }))),
            Operator::Icontains => {
                let needle = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Ok(clause(
                    BoolBlock::Must,
                    "wildcard",
                    json!({ "value": format!("*{}*", needle), "case_insensitive": true }),
                ))
            }
            // `exists` takes the field name as its value
            Operator::Isnull => {
                let block = if is_truthy(value) {
                    BoolBlock::MustNot
                } else {
                    BoolBlock::Must
                };
                Ok(EsClause {
                    field: "field".to_string(),
                    value: Value::String(field.to_string()),
                    block,
                    operation: "exists",
                })
            }
            Operator::Or => Err(QueryError::UnsupportedOperation(format!(
                "{} (elasticsearch)",
                operator
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(operator: Operator, value: Value) -> Result<EsClause, QueryError> {
        ElasticFilterStrategy.apply("flow_uuid", operator, &value)
    }

    #[test]
    fn eq_is_term() {
        let clause = apply(Operator::Eq, json!("f1")).unwrap();
        assert_eq!(clause.block, BoolBlock::Must);
        assert_eq!(clause.operation, "term");
        assert_eq!(clause.value, json!("f1"));
    }

    #[test]
    fn in_is_terms_list() {
        let clause = apply(Operator::In, json!("f1")).unwrap();
        assert_eq!(clause.operation, "terms");
        assert_eq!(clause.value, json!(["f1"]));
    }

    #[test]
    fn ranges() {
        let clause = apply(Operator::Gte, json!("2024-01-01")).unwrap();
        assert_eq!(clause.operation, "range");
        assert_eq!(clause.value, json!({"gte": "2024-01-01"}));

        let clause = apply(Operator::Lte, json!("2024-02-01")).unwrap();
        assert_eq!(clause.value, json!({"lte": "2024-02-01"}));
    }

    #[test]
    fn isnull_uses_exists() {
        let clause = apply(Operator::Isnull, json!(true)).unwrap();
        assert_eq!(clause.block, BoolBlock::MustNot);
        assert_eq!(clause.operation, "exists");
        assert_eq!(clause.field, "field");
        assert_eq!(clause.value, json!("flow_uuid"));

        let clause = apply(Operator::Isnull, json!(false)).unwrap();
        assert_eq!(clause.block, BoolBlock::Must);
    }

    #[test]
    fn icontains_is_case_insensitive_wildcard() {
        let clause = apply(Operator::Icontains, json!("abc")).unwrap();
        assert_eq!(clause.operation, "wildcard");
        assert_eq!(
            clause.value,
            json!({"value": "*abc*", "case_insensitive": true})
        );
    }

    #[test]
    fn or_is_unsupported() {
        let err = apply(Operator::Or, json!({"a": 1})).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedOperation(_)));
    }
}
