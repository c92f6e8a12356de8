use chrono::Utc;
use common::domain::{
    attributes, event_types, subjects, Connection, ConnectionRepository, DomainError, DomainResult,
    Envelope, EnvelopePublisher, FieldError, IdentityProvider, IdentityUser, NewIdentityUser, RequestValues,
    TenantIdentityCreatedData, TenantRecord, TenantRegisteredData, TenantRepository,
    STATUS_FORCE_CHANGE_PASSWORD,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Creates the account owner and tenant records of a registered tenant.
pub struct TenantService {
    identity_provider: Arc<dyn IdentityProvider>,
    tenant_repository: Arc<dyn TenantRepository>,
    connection_repository: Arc<dyn ConnectionRepository>,
    publisher: Arc<dyn EnvelopePublisher>,
    shared_pool_id: String,
}

impl TenantService {
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        tenant_repository: Arc<dyn TenantRepository>,
        connection_repository: Arc<dyn ConnectionRepository>,
        publisher: Arc<dyn EnvelopePublisher>,
        shared_pool_id: impl Into<String>,
    ) -> Self {
        Self {
            identity_provider,
            tenant_repository,
            connection_repository,
            publisher,
            shared_pool_id: shared_pool_id.into(),
        }
    }

    #[instrument(skip(self, values, data), fields(tenant_id = %data.id, trace_id = %values.trace_id))]
    pub async fn create_tenant_from_event(
        &self,
        values: &RequestValues,
        data: TenantRegisteredData,
    ) -> DomainResult<()> {
        if data.id.is_empty() || data.email.is_empty() {
            return Err(DomainError::Validation(
                [("id", &data.id), ("email", &data.email)]
                    .iter()
                    .filter(|(_, value)| value.is_empty())
                    .map(|(field, _)| FieldError::new(*field, "required"))
                    .collect(),
            ));
        }

        let user_pool_id = if data.user_pool_id.is_empty() {
            self.shared_pool_id.clone()
        } else {
            data.user_pool_id.clone()
        };

        let owner = self.create_account_owner(&user_pool_id, &data).await?;
        debug!(user_id = %owner.user_id, "account owner ready");

        let created_at = Utc::now();
        let record = TenantRecord {
            id: data.id.clone(),
            email: data.email.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            company_name: data.company.clone(),
            plan: data.plan.clone(),
            enabled: true,
            status: STATUS_FORCE_CHANGE_PASSWORD.to_string(),
            user_pool_id: user_pool_id.clone(),
            created_at,
        };

        match self.tenant_repository.insert_tenant(record).await {
            Ok(()) => {}
            Err(DomainError::AlreadyExists(_)) => debug!("tenant record already stored"),
            Err(e) => return Err(e),
        }

        self.connection_repository
            .insert_connection(Connection {
                user_id: owner.user_id.clone(),
                tenant_id: data.id.clone(),
            })
            .await?;

        let metadata = values.clone().with_tenant(data.id.clone()).metadata();
        let created = TenantIdentityCreatedData {
            tenant_id: data.id.clone(),
            user_id: owner.user_id,
            company: data.company,
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            plan: data.plan,
            created_at,
        };

        let published = match Envelope::new(event_types::TENANT_IDENTITY_CREATED, metadata, &created) {
            Ok(envelope) => {
                self.publisher
                    .publish(subjects::TENANT_IDENTITY_CREATED, &envelope)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = published {
            error!(error = %e, "failed to publish tenant identity created event");
        }

        info!(tenant_id = %data.id, "tenant created");
        Ok(())
    }

    /// Redelivered registrations find the owner created the first time.
    async fn create_account_owner(
        &self,
        user_pool_id: &str,
        data: &TenantRegisteredData,
    ) -> DomainResult<IdentityUser> {
        let full_name = if data.full_name.is_empty() {
            format!("{} {}", data.first_name, data.last_name)
        } else {
            data.full_name.clone()
        };

        let user = NewIdentityUser {
            user_pool_id: user_pool_id.to_string(),
            email: data.email.clone(),
            attributes: vec![
                (attributes::TENANT_ID.to_string(), data.id.clone()),
                (attributes::ACCOUNT_OWNER.to_string(), "1".to_string()),
                (attributes::COMPANY_NAME.to_string(), data.company.clone()),
                (attributes::FULL_NAME.to_string(), full_name),
                (attributes::EMAIL.to_string(), data.email.clone()),
                (attributes::EMAIL_VERIFIED.to_string(), "true".to_string()),
            ],
        };

        match self.identity_provider.admin_create_user(user).await {
            Ok(owner) => Ok(owner),
            Err(DomainError::AlreadyExists(_)) => self
                .identity_provider
                .find_user(user_pool_id, &data.email)
                .await?
                .ok_or_else(|| DomainError::NotFound(format!("user {}", data.email))),
            Err(e) => Err(e),
        }
    }
}
