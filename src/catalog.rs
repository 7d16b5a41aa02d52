//! Resource catalogs: where protected resources are read from. Filtering happens in the catalog's query.

use crate::authz::{ResourceKind, ResourceRow};
use crate::error::AppError;
use crate::qualifier::{ResourceTable, TenantFilter, DATABASES};
use crate::sql::{select_resource_by_id, select_resources, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;

/// Upper bound on rows returned by one listing.
pub const LIST_LIMIT: u32 = 1000;

#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// Rows of `table` passing `filter`. `None` means unfiltered.
    async fn list(&self, table: &ResourceTable, filter: Option<&TenantFilter>) -> Result<Vec<ResourceRow>, AppError>;

    /// One row by id, with its owning database attached when the table has one.
    async fn get(&self, table: &ResourceTable, id: &str) -> Result<Option<ResourceRow>, AppError>;
}

/// Catalog over the analytics metadata tables in Postgres.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        PgCatalog { pool }
    }

    async fn fetch_many(&self, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, (Value,)>(&q.sql);
        for p in &q.params {
            query = query.bind(p);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }

    async fn fetch_one(&self, table: &ResourceTable, id: &str) -> Result<Option<ResourceRow>, AppError> {
        let q = select_resource_by_id(table, id);
        let row = self.fetch_many(&q).await?.into_iter().next();
        Ok(row.map(|v| row_from_json(table, v)))
    }
}

#[async_trait]
impl ResourceCatalog for PgCatalog {
    async fn list(&self, table: &ResourceTable, filter: Option<&TenantFilter>) -> Result<Vec<ResourceRow>, AppError> {
        let q = select_resources(table, filter, Some(LIST_LIMIT));
        let rows = self.fetch_many(&q).await?;
        Ok(rows.into_iter().map(|v| row_from_json(table, v)).collect())
    }

    async fn get(&self, table: &ResourceTable, id: &str) -> Result<Option<ResourceRow>, AppError> {
        let Some(row) = self.fetch_one(table, id).await? else {
            return Ok(None);
        };
        let owner_id = table
            .owner
            .and_then(|link| row.data.get(link.foreign_key).and_then(json_id));
        match owner_id {
            Some(owner_id) => match self.fetch_one(&DATABASES, &owner_id).await? {
                Some(owner) => Ok(Some(row.with_owner(owner))),
                None => Ok(Some(row)),
            },
            None => Ok(Some(row)),
        }
    }
}

fn json_id(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Build a row from the JSON object Postgres returned.
pub fn row_from_json(table: &ResourceTable, data: Value) -> ResourceRow {
    let id = data.get(table.id_column).and_then(json_id).unwrap_or_default();
    let tenant_id = table
        .tenant_column
        .and_then(|c| data.get(c))
        .and_then(Value::as_str)
        .map(str::to_string);
    ResourceRow {
        kind: table.kind,
        id,
        tenant_id,
        labeled: table.tenant_column.is_some(),
        owner: None,
        data,
    }
}

/// In-process catalog for tests and demos. The filter is applied while reading, as a query would.
#[derive(Default)]
pub struct MemoryCatalog {
    rows: RwLock<HashMap<ResourceKind, Vec<ResourceRow>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, row: ResourceRow) -> Result<(), AppError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        rows.entry(row.kind).or_default().push(row);
        Ok(())
    }

    fn poisoned() -> AppError {
        AppError::Internal("catalog lock poisoned".into())
    }
}

#[async_trait]
impl ResourceCatalog for MemoryCatalog {
    async fn list(&self, table: &ResourceTable, filter: Option<&TenantFilter>) -> Result<Vec<ResourceRow>, AppError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows
            .get(&table.kind)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter(|r| {
                filter.map_or(true, |f| {
                    f.matches(
                        r.tenant_id.as_deref(),
                        r.owner.as_ref().and_then(|o| o.tenant_id.as_deref()),
                    )
                })
            })
            .take(LIST_LIMIT as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, table: &ResourceTable, id: &str) -> Result<Option<ResourceRow>, AppError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows
            .get(&table.kind)
            .and_then(|v| v.iter().find(|r| r.id == id))
            .cloned())
    }
}
