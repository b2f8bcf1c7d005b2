//! Flows source (flows database)

use crate::error::QueryError;
use crate::query::filter::FilterExpr;
use crate::query::{FilterField, FilterSet, PostgresFilterStrategy, SqlQuery, SqlQueryBuilder};

use super::{Operation, QueryOptions};

const ORG_JOIN: (&str, &str) = ("o", "INNER JOIN public.orgs_org o ON o.id = f.org_id");

pub static FLOW_FILTERS: FilterSet = FilterSet {
    source: "flows",
    fields: &[
        ("project", FilterField::joined("o", "proj_uuid", &[ORG_JOIN]).uuid()),
        ("flow", FilterField::column("f", "uuid").uuid()),
        ("name", FilterField::column("f", "name")),
        ("is_active", FilterField::column("f", "is_active")),
        ("is_archived", FilterField::column("f", "is_archived")),
    ],
};

pub fn build_query(
    filters: &[FilterExpr],
    operation: Operation,
    options: &QueryOptions,
) -> Result<SqlQuery, QueryError> {
    let mut builder = SqlQueryBuilder::new("public.flows_flow", "f", "uuid");
    FLOW_FILTERS.apply_sql(&mut builder, &PostgresFilterStrategy, filters)?;
    builder.build_query();

    match operation {
        Operation::Count => builder.count(),
        Operation::List => builder.list(
            &["f.uuid", "f.name"],
            "f.name",
            options.limit + 1,
            options.offset,
        ),
        _ => Err(QueryError::UnsupportedOperation(format!(
            "{} on flows",
            operation
        ))),
    }
}
