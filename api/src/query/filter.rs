//! Filter expression parsing
//!
//! Filters arrive as a flat map of `field` or `field__operator` keys. The
//! operator suffix is optional: without it, a list value means `in` and
//! anything else means `eq`.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::QueryError;

/// Declarative filter map as received from widgets and query strings
pub type Filters = Map<String, Value>;

/// Comparison operators understood by the filter strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    In,
    Gte,
    Lte,
    Icontains,
    Isnull,
    Or,
}

impl Operator {
    /// Parse an operator suffix (`after` and `before` are date aliases)
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        match s {
            "eq" => Ok(Self::Eq),
            "in" => Ok(Self::In),
            "gte" | "after" => Ok(Self::Gte),
            "lte" | "before" => Ok(Self::Lte),
            "icontains" => Ok(Self::Icontains),
            "isnull" => Ok(Self::Isnull),
            "or" => Ok(Self::Or),
            other => Err(QueryError::UnsupportedOperation(other.to_string())),
        }
    }

    /// Operator used when the key has no suffix
    pub fn implicit_for(value: &Value) -> Self {
        if value.is_array() {
            Self::In
        } else {
            Self::Eq
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::Eq => "eq",
            Operator::In => "in",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Icontains => "icontains",
            Operator::Isnull => "isnull",
            Operator::Or => "or",
        };
        write!(f, "{}", s)
    }
}

/// One parsed `field__operator: value` pair
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    /// Logical filter name, resolved through a source's filter set
    pub name: String,
    pub operator: Operator,
    pub value: Value,
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid identifier regex"))
}

/// Check that a name is safe to render into SQL text
pub fn is_identifier(name: &str) -> bool {
    identifier_re().is_match(name)
}

impl FilterExpr {
    /// Parse a single filter key and its value
    pub fn parse(key: &str, value: Value) -> Result<Self, QueryError> {
        let (name, operator) = match key.rsplit_once("__") {
            Some((name, op)) => (name, Operator::parse(op)?),
            None => (key, Operator::implicit_for(&value)),
        };

        if !is_identifier(name) {
            return Err(QueryError::InvalidFilter {
                field: key.to_string(),
                reason: "filter names may only contain lowercase letters, digits and '_'"
                    .to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            operator,
            value,
        })
    }
}

/// Parse every entry of a filter map, in key order
pub fn parse_filters(filters: &Filters) -> Result<Vec<FilterExpr>, QueryError> {
    filters
        .iter()
        .map(|(key, value)| FilterExpr::parse(key, value.clone()))
        .collect()
}

/// Convert raw query-string parameters into a filter map.
///
/// `__in` values are comma separated, `true`/`false` become booleans and
/// everything else stays a string.
pub fn filters_from_query(params: &HashMap<String, String>) -> Filters {
    let mut filters = Filters::new();
    for (key, raw) in params {
        let value = if key.ends_with("__in") {
            Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            )
        } else {
            match raw.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(raw.clone()),
            }
        };
        filters.insert(key.clone(), value);
    }
    filters
}

/// Truthiness in the loose sense used by `isnull` (`"false"`, `0` and `null` are falsy)
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !matches!(s.to_lowercase().as_str(), "" | "false" | "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
