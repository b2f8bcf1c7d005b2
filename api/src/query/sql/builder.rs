//! SQL query builder
//!
//! Accumulates joins and WHERE fragments for one source table, then renders
//! the final statement for a given operation. Operations can only be rendered
//! after `build_query()`.

use serde_json::Value;

use super::strategy::{ColumnType, SqlFilterStrategy};
use crate::error::QueryError;
use crate::query::filter::Operator;

/// A rendered statement with Postgres-style `$n` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Final WHERE clause produced by `build_query()`
#[derive(Debug, Clone)]
struct BuiltClause {
    where_sql: String,
    params: Vec<Value>,
}

/// Builder for queries over a single base table
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    table: String,
    alias: String,
    key: String,
    joins: Vec<(String, String)>,
    fragments: Vec<String>,
    params: Vec<Value>,
    built: Option<BuiltClause>,
}

impl SqlQueryBuilder {
    /// Create a builder for `table AS alias`, where `key` identifies a row
    pub fn new(table: impl Into<String>, alias: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            key: key.into(),
            joins: Vec::new(),
            fragments: Vec::new(),
            params: Vec::new(),
            built: None,
        }
    }

    /// Register a join; joins are keyed by alias so repeated filters share one
    pub fn add_join(&mut self, alias: &str, clause: &str) {
        if !self.joins.iter().any(|(a, _)| a == alias) {
            self.joins.push((alias.to_string(), clause.to_string()));
        }
    }

    /// Translate a condition with `strategy` and queue its fragment
    pub fn add_filter(
        &mut self,
        strategy: &dyn SqlFilterStrategy,
        field: &str,
        operator: Operator,
        value: &Value,
        table_alias: &str,
        column_type: ColumnType,
    ) -> Result<(), QueryError> {
        let mut fragment = strategy.apply(field, operator, value, table_alias)?;
        // `or` branches name their own columns
        if operator != Operator::Or {
            fragment = fragment.cast_params(column_type);
        }
        self.fragments.push(fragment.clause);
        self.params.extend(fragment.params);
        Ok(())
    }

    /// Join the queued fragments and freeze the WHERE clause
    pub fn build_query(&mut self) {
        let where_sql = self.fragments.join(" AND ");

        self.built = Some(BuiltClause {
            where_sql,
            params: self.params.clone(),
        });
    }

    fn clause(&self, operation: &'static str) -> Result<&BuiltClause, QueryError> {
        self.built.as_ref().ok_or(QueryError::NotBuilt(operation))
    }

    fn from_sql(&self) -> String {
        let mut sql = format!("FROM {} {}", self.table, self.alias);
        for (_, join) in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql
    }

    /// Render `SELECT <select> FROM ... WHERE ... [GROUP BY] [ORDER BY] [LIMIT/OFFSET]`.
    ///
    /// `select_params` bind the `?` markers of the SELECT list and precede the
    /// WHERE params.
    pub fn select(
        &self,
        operation: &'static str,
        select: &str,
        select_params: Vec<Value>,
        group_by: Option<&str>,
        order_by: Option<&str>,
        page: Option<(u64, u64)>,
    ) -> Result<SqlQuery, QueryError> {
        let clause = self.clause(operation)?;

        let mut sql = format!("SELECT {} {}", select, self.from_sql());
        if !clause.where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause.where_sql);
        }
        if let Some(group_by) = group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some(order_by) = order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some((limit, offset)) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        }

        let mut params = select_params;
        params.extend(clause.params.iter().cloned());

        Ok(SqlQuery {
            sql: renumber(&sql),
            params,
        })
    }

    /// Distinct row listing
    pub fn list(
        &self,
        columns: &[&str],
        order_by: &str,
        limit: u64,
        offset: u64,
    ) -> Result<SqlQuery, QueryError> {
        self.select(
            "list",
            &format!("DISTINCT {}", columns.join(", ")),
            Vec::new(),
            None,
            Some(order_by),
            Some((limit, offset)),
        )
    }

    pub fn count(&self) -> Result<SqlQuery, QueryError> {
        self.select(
            "count",
            &format!("COUNT(DISTINCT {}.{}) AS value", self.alias, self.key),
            Vec::new(),
            None,
            None,
            None,
        )
    }

    pub fn sum(&self, expr: &str) -> Result<SqlQuery, QueryError> {
        self.per_row_aggregate("sum", "SUM", expr)
    }

    pub fn avg(&self, expr: &str) -> Result<SqlQuery, QueryError> {
        self.per_row_aggregate("avg", "AVG", expr)
    }

    /// Aggregate `expr` once per base row; one-to-many joins would repeat it
    fn per_row_aggregate(
        &self,
        operation: &'static str,
        function: &str,
        expr: &str,
    ) -> Result<SqlQuery, QueryError> {
        let per_row = self.select(
            operation,
            &format!("DISTINCT ON ({}.{}) {} AS metric", self.alias, self.key, expr),
            Vec::new(),
            None,
            None,
            None,
        )?;

        Ok(SqlQuery {
            sql: format!(
                "SELECT {}(per_row.metric)::float8 AS value FROM ({}) per_row",
                function, per_row.sql
            ),
            params: per_row.params,
        })
    }

    /// Count distinct rows per hour of `field`, shifted into `timezone`
    pub fn timeseries_hour_group_count(
        &self,
        field: &str,
        timezone: &str,
    ) -> Result<SqlQuery, QueryError> {
        self.select(
            "timeseries_hour_group_count",
            &format!(
                "EXTRACT(HOUR FROM {}.{} AT TIME ZONE ?)::int AS label, COUNT(DISTINCT {}.{}) AS value",
                self.alias, field, self.alias, self.key
            ),
            vec![Value::String(timezone.to_string())],
            Some("label"),
            Some("label"),
            None,
        )
    }
}

/// Replace each `?` with the next `$n`
fn renumber(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut index = 0;
    for ch in sql.chars() {
        if ch == '?' {
            index += 1;
            out.push('$');
            out.push_str(&index.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::sql::PostgresFilterStrategy;
    use serde_json::json;

    fn rooms_builder() -> SqlQueryBuilder {
        SqlQueryBuilder::new("public.rooms_room", "r", "uuid")
    }

    #[test]
    fn rendering_before_build_fails() {
        let builder = rooms_builder();
        assert_eq!(builder.count().unwrap_err(), QueryError::NotBuilt("count"));
        assert!(builder.list(&["r.uuid"], "r.uuid", 10, 0).is_err());
    }

    #[test]
    fn count_without_filters() {
        let mut builder = rooms_builder();
        builder.build_query();

        let query = builder.count().unwrap();
        assert_eq!(
            query.sql,
            "SELECT COUNT(DISTINCT r.uuid) AS value FROM public.rooms_room r"
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn fragments_are_and_joined_and_renumbered() {
        let mut builder = rooms_builder();
        builder
            .add_filter(
                &PostgresFilterStrategy,
                "user_id",
                Operator::In,
                &json!(["a", "b"]),
                "r",
                ColumnType::Plain,
            )
            .unwrap();
        builder
            .add_filter(
                &PostgresFilterStrategy,
                "is_active",
                Operator::Eq,
                &json!(true),
                "r",
                ColumnType::Plain,
            )
            .unwrap();
        builder.build_query();

        let query = builder.count().unwrap();
        assert!(query
            .sql
            .ends_with("WHERE r.user_id IN ($1, $2) AND r.is_active = $3"));
        assert_eq!(query.params, vec![json!("a"), json!("b"), json!(true)]);
    }

    #[test]
    fn joins_are_deduplicated_by_alias() {
        let mut builder = rooms_builder();
        let join = "INNER JOIN public.queues_queue q ON q.uuid = r.queue_id";
        builder.add_join("q", join);
        builder.add_join("q", join);
        builder.build_query();

        let query = builder.count().unwrap();
        assert_eq!(query.sql.matches("INNER JOIN").count(), 1);
    }

    #[test]
    fn list_pages_results() {
        let mut builder = rooms_builder();
        builder.build_query();

        let query = builder
            .list(&["r.uuid", "r.created_on"], "r.created_on DESC", 20, 40)
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT DISTINCT r.uuid, r.created_on FROM public.rooms_room r \
             ORDER BY r.created_on DESC LIMIT 20 OFFSET 40"
        );
    }

    #[test]
    fn aggregates_wrap_expression() {
        let mut builder = rooms_builder();
        builder.build_query();

        assert!(builder
            .avg("mt.waiting_time")
            .unwrap()
            .sql
            .starts_with("SELECT AVG(per_row.metric)::float8 AS value"));
        assert!(builder
            .sum("mt.waiting_time")
            .unwrap()
            .sql
            .starts_with("SELECT SUM(per_row.metric)::float8 AS value"));
    }

    #[test]
    fn aggregates_count_each_row_once() {
        let mut builder = rooms_builder();
        builder.add_join("tg", "INNER JOIN public.rooms_room_tags tg ON tg.room_id = r.uuid");
        builder
            .add_filter(
                &PostgresFilterStrategy,
                "sectortag_id",
                Operator::In,
                &json!(["t1", "t2"]),
                "tg",
                ColumnType::Plain,
            )
            .unwrap();
        builder.build_query();

        let query = builder.sum("r.score").unwrap();
        assert_eq!(
            query.sql,
            "SELECT SUM(per_row.metric)::float8 AS value FROM (\
             SELECT DISTINCT ON (r.uuid) r.score AS metric FROM public.rooms_room r \
             INNER JOIN public.rooms_room_tags tg ON tg.room_id = r.uuid \
             WHERE tg.sectortag_id IN ($1, $2)) per_row"
        );
        assert_eq!(query.params, vec![json!("t1"), json!("t2")]);
    }

    #[test]
    fn typed_filters_cast_each_placeholder() {
        let mut builder = rooms_builder();
        builder
            .add_filter(
                &PostgresFilterStrategy,
                "queue_id",
                Operator::In,
                &json!(["q1", "q2"]),
                "r",
                ColumnType::Uuid,
            )
            .unwrap();
        builder
            .add_filter(
                &PostgresFilterStrategy,
                "queue_id",
                Operator::Or,
                &json!({"urn": "whatsapp:55", "contact_id": "c1"}),
                "r",
                ColumnType::Uuid,
            )
            .unwrap();
        builder.build_query();

        let query = builder.count().unwrap();
        assert!(query.sql.contains("r.queue_id IN ($1::uuid, $2::uuid)"));
        assert!(query.sql.contains("r.contact_id = $"));
        assert!(query.sql.contains("r.urn = $"));
        assert!(!query.sql.contains("$3::") && !query.sql.contains("$4::"));
    }

    #[test]
    fn timeseries_binds_timezone_first() {
        let mut builder = rooms_builder();
        builder
            .add_filter(
                &PostgresFilterStrategy,
                "queue_id",
                Operator::Eq,
                &json!("q1"),
                "r",
                ColumnType::Plain,
            )
            .unwrap();
        builder.build_query();

        let query = builder
            .timeseries_hour_group_count("created_on", "America/Sao_Paulo")
            .unwrap();
        assert!(query
            .sql
            .starts_with("SELECT EXTRACT(HOUR FROM r.created_on AT TIME ZONE $1)::int AS label"));
        assert!(query.sql.contains("WHERE r.queue_id = $2"));
        assert!(query.sql.ends_with("GROUP BY label ORDER BY label"));
        assert_eq!(query.params, vec![json!("America/Sao_Paulo"), json!("q1")]);
    }
}
