//! Tags source (chats database)

use crate::error::QueryError;
use crate::query::filter::FilterExpr;
use crate::query::{FilterField, FilterSet, PostgresFilterStrategy, SqlQuery, SqlQueryBuilder};

use super::{Operation, QueryOptions};

const SECTOR_JOIN: (&str, &str) = (
    "sec",
    "INNER JOIN public.sectors_sector sec ON sec.uuid = tg.sector_id",
);

pub static TAG_FILTERS: FilterSet = FilterSet {
    source: "tags",
    fields: &[
        (
            "project",
            FilterField::joined("sec", "project_id", &[SECTOR_JOIN]).uuid(),
        ),
        ("sector", FilterField::column("tg", "sector_id").uuid()),
        ("name", FilterField::column("tg", "name")),
    ],
};

pub fn build_query(
    filters: &[FilterExpr],
    operation: Operation,
    options: &QueryOptions,
) -> Result<SqlQuery, QueryError> {
    let mut builder = SqlQueryBuilder::new("public.sectors_sectortag", "tg", "uuid");
    TAG_FILTERS.apply_sql(&mut builder, &PostgresFilterStrategy, filters)?;
    builder.build_query();

    match operation {
        Operation::Count => builder.count(),
        Operation::List => builder.list(
            &["tg.uuid", "tg.name", "tg.sector_id AS sector"],
            "tg.name",
            options.limit + 1,
            options.offset,
        ),
        _ => Err(QueryError::UnsupportedOperation(format!(
            "{} on tags",
            operation
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{parse_filters, Filters};
    use serde_json::json;

    #[test]
    fn count_by_sector() {
        let map: Filters =
            serde_json::from_value(json!({"project": "p1", "sector": ["s1", "s2"]})).unwrap();
        let query = build_query(
            &parse_filters(&map).unwrap(),
            Operation::Count,
            &QueryOptions::default(),
        )
        .unwrap();

        assert!(query
            .sql
            .starts_with("SELECT COUNT(DISTINCT tg.uuid) AS value FROM public.sectors_sectortag tg"));
        assert!(query.sql.contains("tg.sector_id IN ($"));
        assert_eq!(query.params.len(), 3);
    }
}
