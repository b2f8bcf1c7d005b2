//! Elasticsearch translation for the flow-run source

pub mod builder;
pub mod strategy;

pub use builder::ElasticQueryBuilder;
pub use strategy::{ElasticFilterStrategy, EsFilterStrategy};
