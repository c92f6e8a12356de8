use crate::{NewTenant, UserPoolResolver};
use async_trait::async_trait;
use common::domain::{
    event_types, subjects, DomainError, DomainResult, Envelope, EnvelopePublisher, Metadata, Plan,
    RequestValues, TenantRegisteredData,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Entry point of a tenant registration.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TenantRegistrar: Send + Sync {
    async fn create_registration(&self, values: RequestValues, tenant: NewTenant) -> DomainResult<()>;
}

/// Routing path derived from a company name: lowercase, alphanumerics only.
pub fn format_path(company: &str) -> String {
    company
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

pub struct RegistrationService {
    user_pools: Arc<dyn UserPoolResolver>,
    publisher: Arc<dyn EnvelopePublisher>,
}

impl RegistrationService {
    pub fn new(user_pools: Arc<dyn UserPoolResolver>, publisher: Arc<dyn EnvelopePublisher>) -> Self {
        Self {
            user_pools,
            publisher,
        }
    }

    async fn publish_registered(
        &self,
        values: &RequestValues,
        tenant: &NewTenant,
        path: String,
        user_pool_id: String,
    ) -> DomainResult<()> {
        let metadata = Metadata {
            trace_id: values.trace_id.clone(),
            user_id: values.user_id.clone(),
            tenant_id: tenant.id.clone(),
        };
        let data = TenantRegisteredData {
            id: tenant.id.clone(),
            email: tenant.email.clone(),
            first_name: tenant.first_name.clone(),
            last_name: tenant.last_name.clone(),
            full_name: tenant.full_name(),
            company: tenant.company_name.clone(),
            plan: tenant.plan.clone(),
            path,
            user_pool_id,
        };

        let envelope = Envelope::new(event_types::TENANT_REGISTERED, metadata, &data)?;
        self.publisher
            .publish(subjects::TENANT_REGISTERED, &envelope)
            .await
    }
}

#[async_trait]
impl TenantRegistrar for RegistrationService {
    #[instrument(skip(self, values, tenant), fields(tenant_id = %tenant.id, trace_id = %values.trace_id))]
    async fn create_registration(&self, values: RequestValues, tenant: NewTenant) -> DomainResult<()> {
        let formatted = format_path(&tenant.company_name);
        let plan = tenant.plan()?;
        if plan == Plan::Premium && formatted.is_empty() {
            return Err(DomainError::validation(
                "companyName",
                "must contain at least one letter or digit",
            ));
        }
        let (_, path) = plan.resolve_isolation(&formatted);
        debug!(tenant_path = %path, "registering tenant");

        let user_pool_id = self
            .user_pools
            .get_plan_based_user_pool(&values, &tenant, &path)
            .await?;

        if let Err(e) = self
            .publish_registered(&values, &tenant, path, user_pool_id.clone())
            .await
        {
            error!(error = %e, "failed to publish tenant registered event");
        }

        info!(user_pool_id = %user_pool_id, "tenant registered");
        Ok(())
    }
}
