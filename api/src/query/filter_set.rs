//! Filter sets
//!
//! Each source declares which logical filter names it understands and how
//! they map to physical columns. Filters that need another table carry the
//! joins to add, keyed by alias so shared joins are only emitted once.

use crate::error::QueryError;
use crate::query::elastic::{ElasticQueryBuilder, EsFilterStrategy};
use crate::query::filter::FilterExpr;
use crate::query::sql::{ColumnType, SqlFilterStrategy, SqlQueryBuilder};

/// Physical location of a logical filter
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub source_field: &'static str,
    pub table_alias: &'static str,
    /// `(alias, JOIN clause)` pairs required by this filter, in order
    pub joins: &'static [(&'static str, &'static str)],
    pub column_type: ColumnType,
}

impl FilterField {
    pub const fn column(table_alias: &'static str, source_field: &'static str) -> Self {
        Self {
            source_field,
            table_alias,
            joins: &[],
            column_type: ColumnType::Plain,
        }
    }

    pub const fn joined(
        table_alias: &'static str,
        source_field: &'static str,
        joins: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            source_field,
            table_alias,
            joins,
            column_type: ColumnType::Plain,
        }
    }

    pub const fn uuid(self) -> Self {
        Self {
            column_type: ColumnType::Uuid,
            ..self
        }
    }

    pub const fn timestamp(self) -> Self {
        Self {
            column_type: ColumnType::Timestamp,
            ..self
        }
    }

    /// Document field for sources without tables
    pub const fn document(source_field: &'static str) -> Self {
        Self::column("", source_field)
    }
}

/// Static mapping of logical filter names for one source
#[derive(Debug)]
pub struct FilterSet {
    pub source: &'static str,
    pub fields: &'static [(&'static str, FilterField)],
}

impl FilterSet {
    pub fn get(&self, name: &str) -> Option<&FilterField> {
        self.fields
            .iter()
            .find(|(field_name, _)| *field_name == name)
            .map(|(_, field)| field)
    }

    /// Resolve and add each filter to a SQL builder; undeclared names are skipped
    pub fn apply_sql(
        &self,
        builder: &mut SqlQueryBuilder,
        strategy: &dyn SqlFilterStrategy,
        filters: &[FilterExpr],
    ) -> Result<(), QueryError> {
        for filter in filters {
            let Some(field) = self.get(&filter.name) else {
                tracing::debug!(source = self.source, filter = %filter.name, "Ignoring undeclared filter");
                continue;
            };

            for (alias, clause) in field.joins {
                builder.add_join(alias, clause);
            }
            builder.add_filter(
                strategy,
                field.source_field,
                filter.operator,
                &filter.value,
                field.table_alias,
                field.column_type,
            )?;
        }
        Ok(())
    }

    /// Resolve and add each filter to an Elasticsearch builder
    pub fn apply_elastic(
        &self,
        builder: &mut ElasticQueryBuilder,
        strategy: &dyn EsFilterStrategy,
        filters: &[FilterExpr],
    ) -> Result<(), QueryError> {
        for filter in filters {
            let Some(field) = self.get(&filter.name) else {
                tracing::debug!(source = self.source, filter = %filter.name, "Ignoring undeclared filter");
                continue;
            };
            builder.add_filter(strategy, field.source_field, filter.operator, &filter.value)?;
        }
        Ok(())
    }
}
