use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account status of a freshly created tenant owner.
pub const STATUS_FORCE_CHANGE_PASSWORD: &str = "FORCE_CHANGE_PASSWORD";

/// Deployment status reported once a siloed pool exists.
pub const DEPLOYMENT_STATUS_PROVISIONED: &str = "provisioned";

/// Tenant entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub plan: String,
    pub enabled: bool,
    pub status: String,
    pub user_pool_id: String,
    pub created_at: DateTime<Utc>,
}

/// Link between an identity and the tenant it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub user_id: String,
    pub tenant_id: String,
}

/// Deployment configuration of a siloed tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiloConfig {
    /// Routing path of the tenant
    pub tenant_name: String,
    pub user_pool_id: String,
    pub app_client_id: String,
    pub deployment_status: String,
}

/// Repository trait for tenant records
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Insert a tenant unless one with the same id exists.
    /// Returns `DomainError::AlreadyExists` otherwise.
    async fn insert_tenant(&self, tenant: TenantRecord) -> DomainResult<()>;

    /// Get a tenant by id
    async fn get_tenant(&self, tenant_id: &str) -> DomainResult<Option<TenantRecord>>;
}

/// Repository trait for user to tenant connections
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Insert or replace a connection
    async fn insert_connection(&self, connection: Connection) -> DomainResult<()>;
}

/// Repository trait for silo configuration
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SiloConfigRepository: Send + Sync {
    /// Insert or replace the configuration for a tenant name
    async fn upsert_config(&self, config: SiloConfig) -> DomainResult<()>;

    async fn get_config(&self, tenant_name: &str) -> DomainResult<Option<SiloConfig>>;
}
