//! Tenant schema namespacing for storage connections.

use crate::config::TenancyConfig;
use crate::error::AppError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use url::form_urlencoded::byte_serialize;
use url::Url;

/// Backends whose connections understand a schema search path.
fn supports_search_path(scheme: &str) -> bool {
    scheme.starts_with("postgres")
}

/// Schema identifier for a search path. Plain lower-case names stay bare; anything else is quoted.
fn search_path_ident(schema: &str) -> String {
    if schema
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        schema.to_string()
    } else {
        format!("\"{}\"", schema.replace('"', "\"\""))
    }
}

/// `<schema>,<fallback>` with each part made safe for the search path.
pub fn search_path(schema: &str, fallback: &str) -> String {
    format!("{},{}", search_path_ident(schema), search_path_ident(fallback))
}

/// Connection string for `tenant`: Postgres URLs get `-c search_path=<schema>,<fallback>` appended
/// to their `options` parameter. Other backends are returned unchanged.
pub fn tenant_database_uri(
    base_uri: &str,
    tenant: &str,
    schema_override: Option<&str>,
    fallback: &str,
) -> Result<String, AppError> {
    let mut url = Url::parse(base_uri)
        .map_err(|e| AppError::BadRequest(format!("invalid database uri: {}", e)))?;
    if !supports_search_path(url.scheme()) {
        return Ok(base_uri.to_string());
    }
    let schema = schema_override.filter(|s| !s.is_empty()).unwrap_or(tenant);
    let search_path_option = format!("-c search_path={}", search_path(schema, fallback));

    let encoded_option = encode_component(&search_path_option);

    // Segments other than `options` are copied byte-for-byte.
    let mut found = false;
    let mut segments: Vec<String> = Vec::new();
    for segment in url.query().unwrap_or("").split('&').filter(|s| !s.is_empty()) {
        match segment.split_once('=') {
            Some(("options", existing)) if !found => {
                found = true;
                if existing.is_empty() {
                    segments.push(format!("options={}", encoded_option));
                } else {
                    segments.push(format!("options={}%20{}", existing, encoded_option));
                }
            }
            _ => segments.push(segment.to_string()),
        }
    }
    if !found {
        segments.push(format!("options={}", encoded_option));
    }
    let query = segments.join("&");
    url.set_query(Some(&query));
    Ok(url.to_string())
}

/// Percent-encode for a connection URI; libpq does not decode `+` as a space.
fn encode_component(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect::<String>().replace('+', "%20")
}

/// Same effect as [`tenant_database_uri`] for an already-parsed sqlx configuration.
pub fn tenant_connect_options(base: PgConnectOptions, schema: &str, fallback: &str) -> PgConnectOptions {
    base.options([("search_path", search_path(schema, fallback))])
}

/// Lazily-connecting pool pinned to one tenant's schema.
pub fn connect_tenant_pool(
    base_uri: &str,
    tenant: &str,
    schema_override: Option<&str>,
    fallback: &str,
    max_connections: u32,
) -> Result<PgPool, AppError> {
    let schema = schema_override.filter(|s| !s.is_empty()).unwrap_or(tenant);
    let base = PgConnectOptions::from_str(base_uri)
        .map_err(|e| AppError::BadRequest(format!("invalid database uri: {}", e)))?;
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_lazy_with(tenant_connect_options(base, schema, fallback));
    tracing::info!(tenant = %tenant, schema = %schema, "created tenant pool");
    Ok(pool)
}

impl TenancyConfig {
    /// [`tenant_database_uri`] with the configured fallback schema.
    pub fn tenant_database_uri(
        &self,
        base_uri: &str,
        tenant: &str,
        schema_override: Option<&str>,
    ) -> Result<String, AppError> {
        tenant_database_uri(base_uri, tenant, schema_override, &self.search_path_fallback_schema)
    }

    /// [`connect_tenant_pool`] with the configured fallback schema.
    pub fn connect_tenant_pool(
        &self,
        base_uri: &str,
        tenant: &str,
        schema_override: Option<&str>,
        max_connections: u32,
    ) -> Result<PgPool, AppError> {
        connect_tenant_pool(
            base_uri,
            tenant,
            schema_override,
            &self.search_path_fallback_schema,
            max_connections,
        )
    }
}
