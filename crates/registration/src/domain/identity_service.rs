use crate::NewTenant;
use async_trait::async_trait;
use common::domain::{
    attributes, event_types, subjects, AuthFlow, AuthInfo, AuthInfoRepository, DomainError,
    DomainResult, Envelope, EnvelopePublisher, IdentityProvider, Metadata, RequestValues,
    TenantSiloedData, UserPoolClientSpec, UserPoolSpec, UserPoolType,
    DEPLOYMENT_STATUS_PROVISIONED,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const REFRESH_TOKEN_VALIDITY_DAYS: i32 = 30;

/// Resolves the identity pool a new tenant's users live in.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserPoolResolver: Send + Sync {
    /// Returns the pool id for the tenant, creating the pool on first use.
    async fn get_plan_based_user_pool(
        &self,
        values: &RequestValues,
        tenant: &NewTenant,
        path: &str,
    ) -> DomainResult<String>;
}

/// Provisions identity pools according to the tenant's plan.
pub struct IdentityService {
    identity_provider: Arc<dyn IdentityProvider>,
    auth_info_repository: Arc<dyn AuthInfoRepository>,
    publisher: Arc<dyn EnvelopePublisher>,
    production: bool,
}

impl IdentityService {
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        auth_info_repository: Arc<dyn AuthInfoRepository>,
        publisher: Arc<dyn EnvelopePublisher>,
        production: bool,
    ) -> Self {
        Self {
            identity_provider,
            auth_info_repository,
            publisher,
            production,
        }
    }

    fn tenant_url(&self, path: &str) -> String {
        if self.production {
            format!("https://devpie.io/{}", path)
        } else {
            format!("http://localhost:3000/{}", path)
        }
    }

    fn user_pool_spec(&self, tenant: &NewTenant, pool_type: UserPoolType, path: &str) -> UserPoolSpec {
        let url = self.tenant_url(path);
        let invite_message = format!(
            "<b>Welcome to {company}!</b><br><br>\
             Your application is available at <a href=\"{url}\">{url}</a>.<br><br>\
             It may take a few minutes before your tenant is ready. If the link answers 404, \
             please try again shortly.<br><br>\
             Your username is: <b>{{username}}</b><br>\
             Your temporary password is: <b>{{####}}</b><br>",
            company = tenant.company_name,
            url = url,
        );

        UserPoolSpec {
            pool_name: format!("{}-{}", pool_type, tenant.id),
            invite_subject: format!("Temporary password for {}", tenant.company_name),
            invite_message,
            custom_attributes: [attributes::TENANT_ID, attributes::COMPANY_NAME, attributes::FULL_NAME]
                .iter()
                .map(|name| name.trim_start_matches("custom:").to_string())
                .collect(),
        }
    }

    fn user_pool_client_spec(user_pool_id: &str, path: &str) -> UserPoolClientSpec {
        UserPoolClientSpec {
            user_pool_id: user_pool_id.to_string(),
            client_name: format!("{}-client", path),
            auth_flows: vec![
                AuthFlow::AdminUserPassword,
                AuthFlow::UserSrp,
                AuthFlow::RefreshToken,
            ],
            generate_secret: false,
            prevent_user_existence_errors: true,
            refresh_token_validity_days: REFRESH_TOKEN_VALIDITY_DAYS,
            identity_providers: vec!["COGNITO".to_string()],
        }
    }

    /// Another registration stored the path first. Drop our pool and use theirs.
    async fn resolve_conflict(&self, path: &str, orphan_pool_id: &str) -> DomainResult<String> {
        warn!(tenant_path = %path, user_pool_id = %orphan_pool_id, "lost provisioning race, discarding pool");

        if let Err(e) = self.identity_provider.delete_user_pool(orphan_pool_id).await {
            error!(user_pool_id = %orphan_pool_id, error = %e, "failed to delete orphaned user pool");
        }

        let winner = self
            .auth_info_repository
            .select(path)
            .await?
            .ok_or_else(|| {
                DomainError::Repository(anyhow::anyhow!(
                    "auth info for {} missing after conditional insert conflict",
                    path
                ))
            })?;

        Ok(winner.user_pool_id)
    }

    async fn publish_siloed(
        &self,
        values: &RequestValues,
        tenant: &NewTenant,
        path: &str,
        user_pool_id: &str,
        app_client_id: &str,
    ) {
        let metadata = Metadata {
            trace_id: values.trace_id.clone(),
            user_id: values.user_id.clone(),
            tenant_id: tenant.id.clone(),
        };
        let data = TenantSiloedData {
            tenant_id: tenant.id.clone(),
            tenant_name: path.to_string(),
            user_pool_id: user_pool_id.to_string(),
            app_client_id: app_client_id.to_string(),
            deployment_status: DEPLOYMENT_STATUS_PROVISIONED.to_string(),
        };

        let result = match Envelope::new(event_types::TENANT_SILOED, metadata, &data) {
            Ok(envelope) => self.publisher.publish(subjects::TENANT_SILOED, &envelope).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            error!(tenant_id = %tenant.id, error = %e, "failed to publish tenant siloed event");
        }
    }
}

#[async_trait]
impl UserPoolResolver for IdentityService {
    #[instrument(skip(self, values, tenant), fields(tenant_id = %tenant.id, plan = %tenant.plan, trace_id = %values.trace_id))]
    async fn get_plan_based_user_pool(
        &self,
        values: &RequestValues,
        tenant: &NewTenant,
        path: &str,
    ) -> DomainResult<String> {
        let (pool_type, path) = tenant.plan()?.resolve_isolation(path);
        debug!(pool_type = %pool_type, tenant_path = %path, "resolving user pool");

        if let Some(existing) = self.auth_info_repository.select(&path).await? {
            debug!(user_pool_id = %existing.user_pool_id, "user pool already provisioned");
            return Ok(existing.user_pool_id);
        }

        let user_pool_id = self
            .identity_provider
            .create_user_pool(self.user_pool_spec(tenant, pool_type, &path))
            .await?;

        let client_id = self
            .identity_provider
            .create_user_pool_client(Self::user_pool_client_spec(&user_pool_id, &path))
            .await?;

        let info = AuthInfo {
            tenant_path: path.clone(),
            user_pool_id: user_pool_id.clone(),
            user_pool_type: pool_type,
            user_pool_client_id: client_id.clone(),
        };

        match self.auth_info_repository.insert(info).await {
            Ok(()) => {}
            Err(DomainError::AlreadyExists(_)) => {
                return self.resolve_conflict(&path, &user_pool_id).await;
            }
            Err(e) => return Err(e),
        }

        self.publish_siloed(values, tenant, &path, &user_pool_id, &client_id)
            .await;

        info!(user_pool_id = %user_pool_id, tenant_path = %path, "user pool provisioned");
        Ok(user_pool_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{MockAuthInfoRepository, MockEnvelopePublisher, MockIdentityProvider};
    use std::sync::Mutex;

    fn tenant(plan: &str) -> NewTenant {
        NewTenant {
            id: "t-1".to_string(),
            email: "owner@acme.io".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            company_name: "Acme".to_string(),
            plan: plan.to_string(),
        }
    }

    fn values() -> RequestValues {
        RequestValues {
            user_id: "admin-1".to_string(),
            trace_id: "trace-1".to_string(),
            ..Default::default()
        }
    }

    fn stored(path: &str, pool: &str) -> AuthInfo {
        AuthInfo {
            tenant_path: path.to_string(),
            user_pool_id: pool.to_string(),
            user_pool_type: UserPoolType::Siloed,
            user_pool_client_id: "client-x".to_string(),
        }
    }

    fn service(
        identity: MockIdentityProvider,
        repo: MockAuthInfoRepository,
        publisher: MockEnvelopePublisher,
    ) -> IdentityService {
        IdentityService::new(Arc::new(identity), Arc::new(repo), Arc::new(publisher), false)
    }

    fn expect_pool_created(identity: &mut MockIdentityProvider, pool_id: &'static str) {
        identity
            .expect_create_user_pool()
            .times(1)
            .return_once(move |_| Ok(pool_id.to_string()));
        identity
            .expect_create_user_pool_client()
            .withf(move |spec: &UserPoolClientSpec| spec.user_pool_id == pool_id)
            .times(1)
            .return_once(|_| Ok("client-1".to_string()));
    }

    #[tokio::test]
    async fn test_premium_tenant_gets_siloed_pool_at_its_path() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_user_pool()
            .withf(|spec: &UserPoolSpec| {
                spec.pool_name == "siloed-t-1"
                    && spec.invite_subject == "Temporary password for Acme"
                    && spec.invite_message.contains("http://localhost:3000/acme")
                    && spec.invite_message.contains("{username}")
                    && spec.invite_message.contains("{####}")
                    && spec.custom_attributes == vec!["tenant-id", "company-name", "full-name"]
            })
            .times(1)
            .return_once(|_| Ok("pool-1".to_string()));
        identity
            .expect_create_user_pool_client()
            .withf(|spec: &UserPoolClientSpec| {
                spec.user_pool_id == "pool-1"
                    && spec.client_name == "acme-client"
                    && !spec.generate_secret
                    && spec.prevent_user_existence_errors
                    && spec.refresh_token_validity_days == 30
                    && spec.identity_providers == vec!["COGNITO"]
                    && spec.auth_flows.len() == 3
            })
            .times(1)
            .return_once(|_| Ok("client-1".to_string()));

        let mut repo = MockAuthInfoRepository::new();
        repo.expect_select()
            .withf(|path: &str| path == "acme")
            .times(1)
            .return_once(|_| Ok(None));
        repo.expect_insert()
            .withf(|info: &AuthInfo| {
                info.tenant_path == "acme"
                    && info.user_pool_id == "pool-1"
                    && info.user_pool_type == UserPoolType::Siloed
                    && info.user_pool_client_id == "client-1"
            })
            .times(1)
            .return_once(|_| Ok(()));

        let mut publisher = MockEnvelopePublisher::new();
        publisher
            .expect_publish()
            .withf(|subject: &str, envelope: &Envelope| {
                let data: TenantSiloedData = envelope.data_as().unwrap();
                subject == subjects::TENANT_SILOED
                    && envelope.kind == event_types::TENANT_SILOED
                    && envelope.metadata.trace_id == "trace-1"
                    && envelope.metadata.user_id == "admin-1"
                    && envelope.metadata.tenant_id == "t-1"
                    && data.tenant_name == "acme"
                    && data.user_pool_id == "pool-1"
                    && data.app_client_id == "client-1"
                    && data.deployment_status == "provisioned"
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let pool = service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &tenant("premium"), "/acme/")
            .await
            .unwrap();

        assert_eq!(pool, "pool-1");
    }

    #[tokio::test]
    async fn test_basic_tenant_uses_pooled_default_path() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_user_pool()
            .withf(|spec: &UserPoolSpec| spec.pool_name == "pooled-t-1")
            .times(1)
            .return_once(|_| Ok("shared-pool".to_string()));
        identity
            .expect_create_user_pool_client()
            .withf(|spec: &UserPoolClientSpec| spec.client_name == "app-client")
            .times(1)
            .return_once(|_| Ok("client-1".to_string()));

        let mut repo = MockAuthInfoRepository::new();
        repo.expect_select()
            .withf(|path: &str| path == "app")
            .times(1)
            .return_once(|_| Ok(None));
        repo.expect_insert()
            .withf(|info: &AuthInfo| {
                info.tenant_path == "app" && info.user_pool_type == UserPoolType::Pooled
            })
            .times(1)
            .return_once(|_| Ok(()));

        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().times(1).return_once(|_, _| Ok(()));

        let pool = service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &tenant("basic"), "acme")
            .await
            .unwrap();

        assert_eq!(pool, "shared-pool");
    }

    #[tokio::test]
    async fn test_existing_auth_info_short_circuits() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_create_user_pool().times(0);
        identity.expect_create_user_pool_client().times(0);

        let mut repo = MockAuthInfoRepository::new();
        repo.expect_select()
            .times(1)
            .return_once(|_| Ok(Some(stored("app", "shared-pool"))));
        repo.expect_insert().times(0);

        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().times(0);

        let pool = service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &tenant("basic"), "acme")
            .await
            .unwrap();

        assert_eq!(pool, "shared-pool");
    }

    #[tokio::test]
    async fn test_pool_failure_stops_before_client_and_insert() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_user_pool()
            .times(1)
            .return_once(|_| Err(DomainError::IdentityProvider("LimitExceeded".to_string())));
        identity.expect_create_user_pool_client().times(0);

        let mut repo = MockAuthInfoRepository::new();
        repo.expect_select().times(1).return_once(|_| Ok(None));
        repo.expect_insert().times(0);

        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().times(0);

        let result = service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &tenant("premium"), "acme")
            .await;

        assert!(matches!(result, Err(DomainError::IdentityProvider(_))));
    }

    #[tokio::test]
    async fn test_client_failure_stores_nothing() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_user_pool()
            .times(1)
            .return_once(|_| Ok("pool-1".to_string()));
        identity
            .expect_create_user_pool_client()
            .times(1)
            .return_once(|_| Err(DomainError::IdentityProvider("InvalidParameter".to_string())));

        let mut repo = MockAuthInfoRepository::new();
        repo.expect_select().times(1).return_once(|_| Ok(None));
        repo.expect_insert().times(0);

        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().times(0);

        let result = service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &tenant("premium"), "acme")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_lost_race_returns_winner_and_discards_pool() {
        let mut identity = MockIdentityProvider::new();
        expect_pool_created(&mut identity, "pool-late");
        identity
            .expect_delete_user_pool()
            .withf(|pool: &str| pool == "pool-late")
            .times(1)
            .return_once(|_| Ok(()));

        let mut repo = MockAuthInfoRepository::new();
        let mut calls = 0;
        repo.expect_select().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(None)
            } else {
                Ok(Some(stored("acme", "pool-first")))
            }
        });
        repo.expect_insert()
            .times(1)
            .return_once(|_| Err(DomainError::AlreadyExists("auth info for path acme".to_string())));

        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().times(0);

        let pool = service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &tenant("premium"), "acme")
            .await
            .unwrap();

        assert_eq!(pool, "pool-first");
    }

    #[tokio::test]
    async fn test_publish_failure_is_not_fatal() {
        let mut identity = MockIdentityProvider::new();
        expect_pool_created(&mut identity, "pool-1");

        let mut repo = MockAuthInfoRepository::new();
        repo.expect_select().times(1).return_once(|_| Ok(None));
        repo.expect_insert().times(1).return_once(|_| Ok(()));

        let mut publisher = MockEnvelopePublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .return_once(|_, _| Err(DomainError::Repository(anyhow::anyhow!("no responders"))));

        let pool = service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &tenant("premium"), "acme")
            .await
            .unwrap();

        assert_eq!(pool, "pool-1");
    }

    #[tokio::test]
    async fn test_running_twice_for_same_path_provisions_once() {
        let stored: Arc<Mutex<Option<AuthInfo>>> = Arc::new(Mutex::new(None));

        let mut repo = MockAuthInfoRepository::new();
        let reads = Arc::clone(&stored);
        repo.expect_select()
            .withf(|path: &str| path == "acme")
            .times(2)
            .returning(move |_| Ok(reads.lock().unwrap().clone()));
        let writes = Arc::clone(&stored);
        repo.expect_insert().times(1).returning(move |info| {
            *writes.lock().unwrap() = Some(info);
            Ok(())
        });

        let mut identity = MockIdentityProvider::new();
        expect_pool_created(&mut identity, "pool-1");

        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().times(1).return_once(|_, _| Ok(()));

        let identity_service = service(identity, repo, publisher);
        let first = identity_service
            .get_plan_based_user_pool(&values(), &tenant("premium"), "acme")
            .await
            .unwrap();
        let second = identity_service
            .get_plan_based_user_pool(&values(), &tenant("premium"), "acme")
            .await
            .unwrap();

        assert_eq!(first, "pool-1");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_siloed_event_names_tenant_by_path() {
        let mut identity = MockIdentityProvider::new();
        expect_pool_created(&mut identity, "pool-1");

        let mut repo = MockAuthInfoRepository::new();
        repo.expect_select().times(1).return_once(|_| Ok(None));
        repo.expect_insert().times(1).return_once(|_| Ok(()));

        let mut publisher = MockEnvelopePublisher::new();
        publisher
            .expect_publish()
            .withf(|_, envelope: &Envelope| {
                let data: TenantSiloedData = envelope.data_as().unwrap();
                data.tenant_name == "globex"
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut globex = tenant("premium");
        globex.company_name = "Globex Corporation".to_string();

        service(identity, repo, publisher)
            .get_plan_based_user_pool(&values(), &globex, "globex")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_production_invite_links_to_public_host() {
        let identity_service = IdentityService::new(
            Arc::new(MockIdentityProvider::new()),
            Arc::new(MockAuthInfoRepository::new()),
            Arc::new(MockEnvelopePublisher::new()),
            true,
        );

        let spec = identity_service.user_pool_spec(&tenant("premium"), UserPoolType::Siloed, "acme");
        assert!(spec.invite_message.contains("https://devpie.io/acme"));
    }
}
