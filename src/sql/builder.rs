//! Builds parameterized SELECTs over protected-resource tables.

use crate::qualifier::{ResourceTable, TenantFilter};

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// SQL text plus positional text parameters.
#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<String>,
}

impl QueryBuf {
    pub fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub fn push_param(&mut self, v: impl Into<String>) -> u32 {
        self.params.push(v.into());
        self.params.len() as u32
    }
}

const MAIN_ALIAS: &str = "main";

/// SELECT every row of `table` passing `filter`, ordered by id. Without a filter the listing is unrestricted.
pub fn select_resources(table: &ResourceTable, filter: Option<&TenantFilter>, limit: Option<u32>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = filter
        .map(|f| format!(" WHERE {}", f.push_sql(&mut q, MAIN_ALIAS)))
        .unwrap_or_default();
    let limit_clause = limit.map(|l| format!(" LIMIT {}", l)).unwrap_or_default();
    q.sql = format!(
        "SELECT row_to_json({alias}) FROM {table} {alias}{where_clause} ORDER BY {alias}.{id}{limit_clause}",
        alias = MAIN_ALIAS,
        table = quoted(table.table),
        id = quoted(table.id_column),
        where_clause = where_clause,
        limit_clause = limit_clause,
    );
    q
}

/// SELECT one row of `table` by id (id compared as text so any key type works).
pub fn select_resource_by_id(table: &ResourceTable, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "SELECT row_to_json({alias}) FROM {table} {alias} WHERE {alias}.{id}::text = ${n}",
        alias = MAIN_ALIAS,
        table = quoted(table.table),
        id = quoted(table.id_column),
        n = n,
    );
    q
}
