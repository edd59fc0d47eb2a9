//! The database boundary. Compiled SQL never reaches the database except through here.

use crate::error::AppError;
use crate::sql::PgBindValue;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute `statements` in order inside a single transaction. Nothing is kept on failure.
    async fn apply(&self, statements: &[String]) -> Result<(), AppError>;

    /// Run one query with positional parameters and return each row as a JSON object.
    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Map<String, Value>>, AppError>;

    /// Readiness probe.
    async fn ping(&self) -> bool {
        true
    }
}

#[async_trait]
impl SqlExecutor for PgPool {
    async fn apply(&self, statements: &[String]) -> Result<(), AppError> {
        let mut tx = self.begin().await.map_err(AppError::Apply)?;
        for (i, stmt) in statements.iter().enumerate() {
            tracing::debug!(index = i, sql = %stmt, "apply");
            sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(stmt)).await.map_err(|e| {
                tracing::warn!(index = i, error = %e, "statement failed, rolling back");
                AppError::Apply(e)
            })?;
        }
        tx.commit().await.map_err(AppError::Apply)?;
        Ok(())
    }

    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Map<String, Value>>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(self).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_optional(self).await.is_ok()
    }
}

pub fn row_to_json(row: &sqlx::postgres::PgRow) -> Map<String, Value> {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    // array_agg over SERIAL ids
    if let Ok(Some(ids)) = row.try_get::<Option<Vec<i32>>, _>(name) {
        return Value::Array(ids.into_iter().map(|n| Value::Number(n.into())).collect());
    }
    if let Ok(Some(ids)) = row.try_get::<Option<Vec<i64>>, _>(name) {
        return Value::Array(ids.into_iter().map(|n| Value::Number(n.into())).collect());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
