//! Demo server: tenant registry on Postgres, resources read from the analytics metadata tables.
//!
//! Identity is taken from `X-User` / `X-Role` / `X-User-Tenant` headers, standing in for a real
//! authentication layer.

use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::Arc;
use tenant_scope::{
    app_router, apply_tenant_migration, AllowAll, AppState, MemoryCacheBackend, PgCatalog,
    PgTenantStore, Principal, TenancyConfig,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn demo_identity(mut req: Request, next: Next) -> Response {
    let user = header_value(&req, "X-User");
    let role = header_value(&req, "X-Role");
    let user_tenant = header_value(&req, "X-User-Tenant");
    if let Some(user) = user {
        let mut principal = match role.as_deref() {
            Some("admin") => Principal::admin(user),
            _ => Principal::standard(user),
        };
        if let Some(tenant) = user_tenant {
            principal = principal.with_tenant(tenant);
        }
        req.extensions_mut().insert(Arc::new(principal));
    }
    next.run(req).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tenant_scope=info".parse()?))
        .init();

    let config = TenancyConfig::from_env()?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/superset".into());
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    apply_tenant_migration(&pool).await?;

    let state = AppState::new(
        config,
        Arc::new(AllowAll),
        Arc::new(PgCatalog::new(pool.clone())),
        Arc::new(PgTenantStore::new(pool)),
        Arc::new(MemoryCacheBackend::default()),
    );
    let app = app_router(state).layer(axum::middleware::from_fn(demo_identity));

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
