use crate::domain::{DomainError, DomainResult, RequestValues};
use crate::postgres::PostgresConfig;
use anyhow::Result;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::ops::Deref;
use tokio_postgres::NoTls;
use tracing::{debug, instrument};

/// Session variable read by the row level security policies.
pub const CURRENT_TENANT_SETTING: &str = "app.current_tenant";

/// PostgreSQL client wrapper with connection pooling
#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    /// Creates the pool. No connection is opened until one is requested.
    pub fn new(config: &PostgresConfig) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.host = Some(config.host.clone());
        cfg.port = Some(config.port);
        cfg.dbname = Some(config.database.clone());
        cfg.user = Some(config.username.clone());
        cfg.password = Some(config.password.clone());
        // Clean runs DISCARD ALL on recycle so a tenant setting never leaks
        // into the next checkout.
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Clean,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        pool.resize(config.max_pool_size);

        Ok(Self { pool })
    }

    /// Pings the database to verify connectivity
    pub async fn ping(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client.execute("SELECT 1", &[]).await?;
        debug!("postgreSQL connection successful");
        Ok(())
    }

    /// Gets an unscoped connection from the pool
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }

    /// Gets a pooled connection scoped to the caller's tenant.
    ///
    /// Every statement on the returned connection only sees the tenant's rows.
    /// The connection goes back to the pool when the guard is dropped.
    #[instrument(skip(self, values), fields(tenant_id = %values.tenant_id, trace_id = %values.trace_id))]
    pub async fn get_tenant_connection(&self, values: &RequestValues) -> DomainResult<TenantConnection> {
        if values.tenant_id.is_empty() {
            return Err(DomainError::NoTenant);
        }

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DomainError::ConnectionFailed(e.into()))?;

        client
            .execute(
                "SELECT set_config($1, $2, false)",
                &[&CURRENT_TENANT_SETTING, &values.tenant_id],
            )
            .await
            .map_err(|e| DomainError::ConnectionFailed(e.into()))?;

        debug!("tenant connection acquired");
        Ok(TenantConnection {
            client,
            tenant_id: values.tenant_id.clone(),
        })
    }

    pub fn close(&self) {
        self.pool.close();
    }
}

/// Pooled connection bound to one tenant
pub struct TenantConnection {
    client: deadpool_postgres::Client,
    tenant_id: String,
}

impl TenantConnection {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

impl Deref for TenantConnection {
    type Target = deadpool_postgres::Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> PostgresClient {
        PostgresClient::new(&PostgresConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            max_pool_size: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_tenant_is_rejected_before_connecting() {
        let client = unreachable_client();

        let result = client.get_tenant_connection(&RequestValues::default()).await;

        assert!(matches!(result, Err(DomainError::NoTenant)));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connection_failure() {
        let client = unreachable_client();
        let values = RequestValues::default().with_tenant("tenant-1");

        let result = client.get_tenant_connection(&values).await;

        assert!(matches!(result, Err(DomainError::ConnectionFailed(_))));
    }
}
