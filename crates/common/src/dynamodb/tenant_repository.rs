use super::item::{get_bool_or, get_string, get_string_or_default, s, Item};
use crate::domain::{DomainError, DomainResult, TenantRecord, TenantRepository};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

pub(crate) fn tenant_to_item(tenant: &TenantRecord) -> Item {
    Item::from([
        ("tenantId".to_string(), s(&tenant.id)),
        ("email".to_string(), s(&tenant.email)),
        ("firstName".to_string(), s(&tenant.first_name)),
        ("lastName".to_string(), s(&tenant.last_name)),
        ("companyName".to_string(), s(&tenant.company_name)),
        ("plan".to_string(), s(&tenant.plan)),
        ("enabled".to_string(), AttributeValue::Bool(tenant.enabled)),
        ("status".to_string(), s(&tenant.status)),
        ("userPoolId".to_string(), s(&tenant.user_pool_id)),
        ("created".to_string(), s(tenant.created_at.to_rfc3339())),
    ])
}

pub(crate) fn tenant_from_item(item: &Item) -> anyhow::Result<TenantRecord> {
    let created_at = DateTime::parse_from_rfc3339(&get_string(item, "created")?)?.with_timezone(&Utc);

    Ok(TenantRecord {
        id: get_string(item, "tenantId")?,
        email: get_string(item, "email")?,
        first_name: get_string_or_default(item, "firstName"),
        last_name: get_string_or_default(item, "lastName"),
        company_name: get_string(item, "companyName")?,
        plan: get_string(item, "plan")?,
        enabled: get_bool_or(item, "enabled", true),
        status: get_string_or_default(item, "status"),
        user_pool_id: get_string_or_default(item, "userPoolId"),
        created_at,
    })
}

/// Tenant table keyed by `tenantId`
#[derive(Clone)]
pub struct DynamoTenantRepository {
    client: Client,
    table: String,
}

impl DynamoTenantRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl TenantRepository for DynamoTenantRepository {
    #[instrument(skip(self, tenant), fields(tenant_id = %tenant.id))]
    async fn insert_tenant(&self, tenant: TenantRecord) -> DomainResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(tenant_to_item(&tenant)))
            .condition_expression("attribute_not_exists(tenantId)")
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!("tenant stored");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Err(DomainError::AlreadyExists(format!("tenant {}", tenant.id)))
            }
            Err(err) => Err(DomainError::Repository(err.into())),
        }
    }

    #[instrument(skip(self))]
    async fn get_tenant(&self, tenant_id: &str) -> DomainResult<Option<TenantRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("tenantId", s(tenant_id))
            .send()
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        output
            .item()
            .map(tenant_from_item)
            .transpose()
            .map_err(DomainError::Repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::STATUS_FORCE_CHANGE_PASSWORD;

    #[test]
    fn test_tenant_item_mapping() {
        let tenant = TenantRecord {
            id: "t-1".to_string(),
            email: "owner@acme.io".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            company_name: "Acme".to_string(),
            plan: "premium".to_string(),
            enabled: true,
            status: STATUS_FORCE_CHANGE_PASSWORD.to_string(),
            user_pool_id: "pool-1".to_string(),
            created_at: DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let item = tenant_to_item(&tenant);
        assert_eq!(item.get("enabled").unwrap().as_bool().unwrap(), &true);
        assert_eq!(tenant_from_item(&item).unwrap(), tenant);
    }

    #[test]
    fn test_missing_created_is_an_error() {
        let mut item = Item::new();
        item.insert("tenantId".to_string(), s("t-1"));
        assert!(tenant_from_item(&item).is_err());
    }
}
