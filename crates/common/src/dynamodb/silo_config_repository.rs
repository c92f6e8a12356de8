use super::item::{get_string, s, Item};
use crate::domain::{DomainError, DomainResult, SiloConfig, SiloConfigRepository};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use tracing::{debug, instrument};

pub(crate) fn silo_config_to_item(config: &SiloConfig) -> Item {
    Item::from([
        ("tenantName".to_string(), s(&config.tenant_name)),
        ("userPoolId".to_string(), s(&config.user_pool_id)),
        ("appClientId".to_string(), s(&config.app_client_id)),
        ("deploymentStatus".to_string(), s(&config.deployment_status)),
    ])
}

pub(crate) fn silo_config_from_item(item: &Item) -> anyhow::Result<SiloConfig> {
    Ok(SiloConfig {
        tenant_name: get_string(item, "tenantName")?,
        user_pool_id: get_string(item, "userPoolId")?,
        app_client_id: get_string(item, "appClientId")?,
        deployment_status: get_string(item, "deploymentStatus")?,
    })
}

/// Silo configuration table keyed by `tenantName`
#[derive(Clone)]
pub struct DynamoSiloConfigRepository {
    client: Client,
    table: String,
}

impl DynamoSiloConfigRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl SiloConfigRepository for DynamoSiloConfigRepository {
    #[instrument(skip(self, config), fields(tenant_name = %config.tenant_name))]
    async fn upsert_config(&self, config: SiloConfig) -> DomainResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(silo_config_to_item(&config)))
            .send()
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        debug!("silo config stored");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_config(&self, tenant_name: &str) -> DomainResult<Option<SiloConfig>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("tenantName", s(tenant_name))
            .send()
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        output
            .item()
            .map(silo_config_from_item)
            .transpose()
            .map_err(DomainError::Repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silo_config_item_mapping() {
        let config = SiloConfig {
            tenant_name: "acme".to_string(),
            user_pool_id: "pool-1".to_string(),
            app_client_id: "client-1".to_string(),
            deployment_status: "provisioned".to_string(),
        };

        assert_eq!(silo_config_from_item(&silo_config_to_item(&config)).unwrap(), config);
    }
}
