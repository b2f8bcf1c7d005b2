//! Queues source (chats database)

use crate::error::QueryError;
use crate::query::filter::FilterExpr;
use crate::query::{FilterField, FilterSet, PostgresFilterStrategy, SqlQuery, SqlQueryBuilder};

use super::{Operation, QueryOptions};

const SECTOR_JOIN: (&str, &str) = (
    "sec",
    "INNER JOIN public.sectors_sector sec ON sec.uuid = q.sector_id",
);

pub static QUEUE_FILTERS: FilterSet = FilterSet {
    source: "queues",
    fields: &[
        (
            "project",
            FilterField::joined("sec", "project_id", &[SECTOR_JOIN]).uuid(),
        ),
        ("sector", FilterField::column("q", "sector_id").uuid()),
        ("queue", FilterField::column("q", "uuid").uuid()),
        ("name", FilterField::column("q", "name")),
        ("is_deleted", FilterField::column("q", "is_deleted")),
    ],
};

pub fn build_query(
    filters: &[FilterExpr],
    operation: Operation,
    options: &QueryOptions,
) -> Result<SqlQuery, QueryError> {
    let mut builder = SqlQueryBuilder::new("public.queues_queue", "q", "uuid");
    QUEUE_FILTERS.apply_sql(&mut builder, &PostgresFilterStrategy, filters)?;
    builder.build_query();

    match operation {
        Operation::Count => builder.count(),
        Operation::List => builder.list(
            &["q.uuid", "q.name", "q.sector_id AS sector"],
            "q.name",
            options.limit + 1,
            options.offset,
        ),
        _ => Err(QueryError::UnsupportedOperation(format!(
            "{} on queues",
            operation
        ))),
    }
}
