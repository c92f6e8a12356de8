use common::domain::{DomainError, DomainResult, SiloConfig, SiloConfigRepository, TenantSiloedData};
use std::sync::Arc;
use tracing::{info, instrument};

/// Keeps the deployment configuration of siloed tenants.
pub struct SiloConfigService {
    silo_config_repository: Arc<dyn SiloConfigRepository>,
}

impl SiloConfigService {
    pub fn new(silo_config_repository: Arc<dyn SiloConfigRepository>) -> Self {
        Self {
            silo_config_repository,
        }
    }

    #[instrument(skip(self, data), fields(tenant_name = %data.tenant_name))]
    pub async fn store_config_from_event(&self, data: TenantSiloedData) -> DomainResult<()> {
        if data.tenant_name.is_empty() {
            return Err(DomainError::validation("tenantName", "required"));
        }

        self.silo_config_repository
            .upsert_config(SiloConfig {
                tenant_name: data.tenant_name,
                user_pool_id: data.user_pool_id,
                app_client_id: data.app_client_id,
                deployment_status: data.deployment_status,
            })
            .await?;

        info!("silo config stored");
        Ok(())
    }
}
