//! Collection and single-resource reads: compose, execute, format.

use crate::config::{Catalog, ResourceConfig};
use crate::error::AppError;
use crate::response::{resource_object, ResourceObject};
use crate::service::SqlExecutor;
use crate::sql::compose_read;
use serde_json::Value;

pub struct ResourceReader;

impl ResourceReader {
    /// Every row of `resource`, ordered by id, with relationships attached.
    pub async fn list<E>(
        executor: &E,
        catalog: &Catalog,
        resource: &ResourceConfig,
        version: u32,
    ) -> Result<Vec<ResourceObject>, AppError>
    where
        E: SqlExecutor + ?Sized,
    {
        let q = compose_read(resource, catalog, None)?;
        let rows = executor.fetch_rows(&q.sql, &q.params).await?;
        tracing::debug!(resource = %resource.name, rows = rows.len(), "list");
        Ok(rows
            .iter()
            .map(|row| resource_object(row, resource, version, catalog))
            .collect())
    }

    /// One row by id, or `None` when it does not exist.
    pub async fn read<E>(
        executor: &E,
        catalog: &Catalog,
        resource: &ResourceConfig,
        id: &Value,
        version: u32,
    ) -> Result<Option<ResourceObject>, AppError>
    where
        E: SqlExecutor + ?Sized,
    {
        let q = compose_read(resource, catalog, Some(id))?;
        let rows = executor.fetch_rows(&q.sql, &q.params).await?;
        Ok(rows
            .first()
            .map(|row| resource_object(row, resource, version, catalog)))
    }
}
