use crate::postgres::PostgresClient;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// A versioned schema change compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: &'static str,
    pub sql: &'static str,
}

const CREATE_MIGRATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// Applies pending migrations in order, each in its own transaction.
pub async fn run_migrations(client: &PostgresClient, migrations: &[Migration]) -> Result<usize> {
    let mut conn = client
        .get_connection()
        .await
        .context("failed to get connection for migrations")?;

    conn.batch_execute(CREATE_MIGRATIONS_TABLE)
        .await
        .context("failed to create schema_migrations")?;

    let mut applied = 0;
    for migration in migrations {
        let tx = conn.transaction().await?;

        let exists = tx
            .query_opt(
                "SELECT version FROM schema_migrations WHERE version = $1",
                &[&migration.version],
            )
            .await?
            .is_some();

        if exists {
            debug!(version = migration.version, "migration already applied");
            tx.rollback().await?;
            continue;
        }

        tx.batch_execute(migration.sql)
            .await
            .with_context(|| format!("migration {} failed", migration.version))?;
        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES ($1)",
            &[&migration.version],
        )
        .await?;
        tx.commit().await?;

        info!(version = migration.version, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
