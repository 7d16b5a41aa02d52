//! Tenant DDL: label columns on the protected-resource tables and the tenant registry table.
//! Every statement is idempotent; tables that do not exist yet are skipped.

use crate::error::AppError;
use crate::qualifier::{PROTECTED_TABLES, TENANT_COLUMN};
use crate::sql::quoted;
use crate::store::REGISTRY_TABLE;
use sqlx::PgPool;

fn index_name(table: &str) -> String {
    format!("ix_{}_{}", table, TENANT_COLUMN)
}

fn registry_ddl() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id SERIAL PRIMARY KEY,
            tenant_id VARCHAR(255) NOT NULL UNIQUE,
            tenant_name VARCHAR(255) NOT NULL,
            description TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            database_schema VARCHAR(255),
            configuration JSONB,
            created_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            changed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            created_by_fk BIGINT,
            changed_by_fk BIGINT
        )
        "#,
        quoted(REGISTRY_TABLE)
    )
}

async fn table_exists(pool: &PgPool, table: &str) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Statements adding the tenant label and its index to `table`.
fn label_statements(table: &str) -> [String; 2] {
    [
        format!(
            "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} VARCHAR(255)",
            quoted(table),
            quoted(TENANT_COLUMN)
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quoted(&index_name(table)),
            quoted(table),
            quoted(TENANT_COLUMN)
        ),
    ]
}

/// Adds nullable `tenant_id` labels to every existing protected table and creates the registry.
/// Existing rows stay unlabeled (unscoped).
pub async fn apply_tenant_migration(pool: &PgPool) -> Result<(), AppError> {
    for table in PROTECTED_TABLES.iter().map(|t| t.table) {
        if !table_exists(pool, table).await? {
            tracing::debug!(table = %table, "table missing; skipping tenant column");
            continue;
        }
        for stmt in label_statements(table) {
            sqlx::query(&stmt).execute(pool).await?;
        }
        tracing::info!(table = %table, "tenant column ready");
    }

    sqlx::query(&registry_ddl()).execute(pool).await?;
    for column in ["tenant_id", "is_active"] {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quoted(&format!("ix_{}_{}", REGISTRY_TABLE, column)),
            quoted(REGISTRY_TABLE),
            quoted(column)
        ))
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Drops the registry, then the label indexes and columns. Missing objects are ignored.
pub async fn revert_tenant_migration(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", quoted(REGISTRY_TABLE)))
        .execute(pool)
        .await?;
    for table in PROTECTED_TABLES.iter().map(|t| t.table) {
        sqlx::query(&format!("DROP INDEX IF EXISTS {}", quoted(&index_name(table))))
            .execute(pool)
            .await?;
        if table_exists(pool, table).await? {
            sqlx::query(&format!(
                "ALTER TABLE {} DROP COLUMN IF EXISTS {}",
                quoted(table),
                quoted(TENANT_COLUMN)
            ))
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}
