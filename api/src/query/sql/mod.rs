//! SQL translation for the Postgres-backed sources

pub mod builder;
pub mod strategy;

pub use builder::{SqlQuery, SqlQueryBuilder};
pub use strategy::{ColumnType, PostgresFilterStrategy, SqlFilterStrategy};
