//! Raw SQL executor for the chats and flows databases
//!
//! Source queries carry JSON parameters. Strings are always bound as text;
//! statements cast placeholders compared against uuid or timestamp columns.

use async_trait::async_trait;
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, JsonValue, Statement};
use serde_json::Value;

use crate::domain::ports::SqlExecutor;
use crate::error::SourceError;
use crate::query::SqlQuery;

/// Executes source queries through a SeaORM connection
pub struct PostgresSqlExecutor {
    db: DatabaseConnection,
}

impl PostgresSqlExecutor {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SqlExecutor for PostgresSqlExecutor {
    async fn fetch_all(&self, query: &SqlQuery) -> Result<Vec<Value>, SourceError> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            query.sql.as_str(),
            query.params.iter().map(bind_value),
        );

        tracing::debug!(sql = %query.sql, params = query.params.len(), "Running source query");

        JsonValue::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(|e| SourceError::Database(e.to_string()))
    }
}

/// Convert a JSON filter value into a typed bind parameter
fn bind_value(value: &Value) -> sea_orm::Value {
    match value {
        Value::Null => sea_orm::Value::String(None),
        Value::Bool(b) => (*b).into(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        Value::String(s) => s.as_str().into(),
        other => other.clone().into(),
    }
}
