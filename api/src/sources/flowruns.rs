//! Flow runs source (Elasticsearch)
//!
//! Each document is one run of a flow for a contact. Answers collected by
//! the run live in the nested `values` documents, which back the
//! recurrence and numeric aggregations.

use crate::error::QueryError;
use crate::query::filter::FilterExpr;
use crate::query::{ElasticFilterStrategy, ElasticQueryBuilder, FilterField, FilterSet};

use super::{Operation, QueryOptions, SourceRequest};

pub static FLOW_RUN_FILTERS: FilterSet = FilterSet {
    source: "flowruns",
    fields: &[
        ("project", FilterField::document("project_uuid")),
        ("flow", FilterField::document("flow_uuid")),
        ("contact", FilterField::document("contact_uuid")),
        ("created_on", FilterField::document("created_on")),
        ("ended_at", FilterField::document("modified_on")),
        ("exited_at", FilterField::document("exited_on")),
        ("exit_type", FilterField::document("exit_type")),
    ],
};

pub fn build_request(
    filters: &[FilterExpr],
    operation: Operation,
    options: &QueryOptions,
) -> Result<SourceRequest, QueryError> {
    let mut builder = ElasticQueryBuilder::new();
    FLOW_RUN_FILTERS.apply_elastic(&mut builder, &ElasticFilterStrategy, filters)?;
    builder.build_query();

    match operation {
        Operation::Count => builder.count().map(SourceRequest::ElasticCount),
        Operation::List => builder
            .list(options.limit, options.offset, "created_on")
            .map(SourceRequest::ElasticSearch),
        Operation::Recurrence => {
            let op_field = options.require_op_field(operation)?;
            builder
                .recurrence(op_field, options.limit)
                .map(SourceRequest::ElasticSearch)
        }
        Operation::Sum => {
            let op_field = options.require_op_field(operation)?;
            builder.sum(op_field).map(SourceRequest::ElasticSearch)
        }
        Operation::Avg => {
            let op_field = options.require_op_field(operation)?;
            builder.avg(op_field).map(SourceRequest::ElasticSearch)
        }
        Operation::TimeseriesHourGroupCount => Err(QueryError::UnsupportedOperation(format!(
            "{} on flowruns",
            operation
        ))),
    }
}
