use super::item::{get_string, s, Item};
use crate::domain::{AuthInfo, AuthInfoRepository, DomainError, DomainResult, UserPoolType};
use anyhow::anyhow;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use tracing::{debug, instrument};

pub(crate) fn auth_info_to_item(info: &AuthInfo) -> Item {
    Item::from([
        ("tenantPath".to_string(), s(&info.tenant_path)),
        ("userPoolId".to_string(), s(&info.user_pool_id)),
        ("userPoolType".to_string(), s(info.user_pool_type.as_str())),
        ("userPoolClientId".to_string(), s(&info.user_pool_client_id)),
    ])
}

pub(crate) fn auth_info_from_item(item: &Item) -> anyhow::Result<AuthInfo> {
    let user_pool_type = get_string(item, "userPoolType")?
        .parse::<UserPoolType>()
        .map_err(|e| anyhow!(e))?;

    Ok(AuthInfo {
        tenant_path: get_string(item, "tenantPath")?,
        user_pool_id: get_string(item, "userPoolId")?,
        user_pool_type,
        user_pool_client_id: get_string(item, "userPoolClientId")?,
    })
}

/// Auth info table keyed by `tenantPath`
#[derive(Clone)]
pub struct DynamoAuthInfoRepository {
    client: Client,
    table: String,
}

impl DynamoAuthInfoRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl AuthInfoRepository for DynamoAuthInfoRepository {
    #[instrument(skip(self, info), fields(tenant_path = %info.tenant_path))]
    async fn insert(&self, info: AuthInfo) -> DomainResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(auth_info_to_item(&info)))
            .condition_expression("attribute_not_exists(tenantPath)")
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!("auth info stored");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Err(DomainError::AlreadyExists(format!(
                    "auth info for path {}",
                    info.tenant_path
                )))
            }
            Err(err) => Err(DomainError::Repository(err.into())),
        }
    }

    #[instrument(skip(self))]
    async fn select(&self, tenant_path: &str) -> DomainResult<Option<AuthInfo>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("tenantPath", s(tenant_path))
            .send()
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        output
            .item()
            .map(auth_info_from_item)
            .transpose()
            .map_err(DomainError::Repository)
    }
}
