//! SQL filter strategies
//!
//! A strategy turns one condition into a WHERE fragment plus its bound
//! parameters. Fragments use `?` as the only placeholder marker; the builder
//! renumbers them to Postgres `$n` placeholders when a statement is rendered.

use serde_json::Value;

use crate::error::QueryError;
use crate::query::filter::{is_identifier, is_truthy, Operator};

/// A WHERE fragment and the values bound to its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub clause: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    fn new(clause: String, params: Vec<Value>) -> Self {
        Self { clause, params }
    }

    /// Cast every placeholder to the column's type
    pub fn cast_params(self, column_type: ColumnType) -> Self {
        match column_type.cast() {
            Some(cast) => Self {
                clause: self.clause.replace('?', &format!("?::{}", cast)),
                params: self.params,
            },
            None => self,
        }
    }
}

/// Postgres type of a filtered column
///
/// Parameters are bound as sent (strings as text), so uuid and timestamp
/// columns get an explicit cast in the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    Plain,
    Uuid,
    Timestamp,
}

impl ColumnType {
    fn cast(self) -> Option<&'static str> {
        match self {
            ColumnType::Plain => None,
            ColumnType::Uuid => Some("uuid"),
            ColumnType::Timestamp => Some("timestamptz"),
        }
    }
}

/// Translates a single condition into SQL
pub trait SqlFilterStrategy: Send + Sync {
    fn apply(
        &self,
        field: &str,
        operator: Operator,
        value: &Value,
        table_alias: &str,
    ) -> Result<SqlFragment, QueryError>;
}

/// Strategy for the Postgres-backed sources
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresFilterStrategy;

impl SqlFilterStrategy for PostgresFilterStrategy {
    fn apply(
        &self,
        field: &str,
        operator: Operator,
        value: &Value,
        table_alias: &str,
    ) -> Result<SqlFragment, QueryError> {
        let column = format!("{}.{}", table_alias, field);

        match operator {
            Operator::Eq => Ok(SqlFragment::new(
                format!("{} = ?", column),
                vec![value.clone()],
            )),
            Operator::Gte => Ok(SqlFragment::new(
                format!("{} >= ?", column),
                vec![value.clone()],
            )),
            Operator::Lte => Ok(SqlFragment::new(
                format!("{} <= ?", column),
                vec![value.clone()],
            )),
            Operator::In => {
                let values = match value {
                    Value::Array(items) => items.clone(),
                    other => vec![other.clone()],
                };
                if values.is_empty() {
                    return Err(QueryError::InvalidFilter {
                        field: field.to_string(),
                        reason: "'in' requires at least one value".to_string(),
                    });
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                Ok(SqlFragment::new(
                    format!("{} IN ({})", column, placeholders),
                    values,
                ))
            }
            Operator::Icontains => {
                let needle = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Ok(SqlFragment::new(
                    format!("{} ILIKE ?", column),
                    vec![Value::String(format!("%{}%", needle))],
                ))
            }
            Operator::Isnull => {
                let clause = if is_truthy(value) {
                    format!("{} IS NULL", column)
                } else {
                    format!("{} IS NOT NULL", column)
                };
                Ok(SqlFragment::new(clause, Vec::new()))
            }
            Operator::Or => {
                let branches = value.as_object().filter(|o| !o.is_empty()).ok_or_else(|| {
                    QueryError::InvalidFilter {
                        field: field.to_string(),
                        reason: "'or' requires an object of {field: value}".to_string(),
                    }
                })?;

                let mut clauses = Vec::with_capacity(branches.len());
                let mut params = Vec::with_capacity(branches.len());
                for (sub_field, sub_value) in branches {
                    if !is_identifier(sub_field) {
                        return Err(QueryError::InvalidFilter {
                            field: sub_field.clone(),
                            reason: "invalid field name in 'or' filter".to_string(),
                        });
                    }
                    clauses.push(format!("{}.{} = ?", table_alias, sub_field));
                    params.push(sub_value.clone());
                }

                Ok(SqlFragment::new(
                    format!("({})", clauses.join(" OR ")),
                    params,
                ))
            }
        }
    }
}
