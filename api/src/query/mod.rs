//! Query translation
//!
//! Turns declarative filter maps (`field__operator: value`) into backend
//! queries:
//! - `filter`: key parsing and operator inference
//! - `filter_set`: logical filter names to physical columns and joins
//! - `sql`: Postgres strategy and builder
//! - `elastic`: Elasticsearch strategy and builder

pub mod elastic;
pub mod filter;
pub mod filter_set;
pub mod sql;

pub use elastic::{ElasticFilterStrategy, ElasticQueryBuilder};
pub use filter::{filters_from_query, parse_filters, Filters};
pub use filter_set::{FilterField, FilterSet};
pub use sql::{PostgresFilterStrategy, SqlQuery, SqlQueryBuilder};
