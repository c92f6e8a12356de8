use crate::{
    auth_info_routes, AuthInfoService, AuthInfoState, SiloConfigService, TenantRegisteredHandler,
    TenantService, TenantSiloedHandler,
};
use axum::Router;
use common::domain::{
    AuthInfoRepository, ConnectionRepository, EnvelopePublisher, IdentityProvider,
    SiloConfigRepository, TenantRepository,
};
use common::nats::{EnvelopeHandler, ListenBinding};
use std::sync::Arc;
use tracing::debug;

/// Storage and identity dependencies of the tenant module.
pub struct TenantDeps {
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub auth_info_repository: Arc<dyn AuthInfoRepository>,
    pub tenant_repository: Arc<dyn TenantRepository>,
    pub connection_repository: Arc<dyn ConnectionRepository>,
    pub silo_config_repository: Arc<dyn SiloConfigRepository>,
    pub publisher: Arc<dyn EnvelopePublisher>,
}

/// Tenant module: the auth-info endpoint and the tenant projections fed by
/// registration events.
pub struct Tenant {
    auth_info_service: Arc<AuthInfoService>,
    tenant_service: Arc<TenantService>,
    silo_config_service: Arc<SiloConfigService>,
}

impl Tenant {
    pub fn new(deps: TenantDeps, region: impl Into<String>, shared_pool_id: impl Into<String>) -> Self {
        debug!("initializing tenant module");

        Self {
            auth_info_service: Arc::new(AuthInfoService::new(deps.auth_info_repository, region)),
            tenant_service: Arc::new(TenantService::new(
                deps.identity_provider,
                deps.tenant_repository,
                deps.connection_repository,
                deps.publisher,
                shared_pool_id,
            )),
            silo_config_service: Arc::new(SiloConfigService::new(deps.silo_config_repository)),
        }
    }

    pub fn router(&self) -> Router {
        auth_info_routes(AuthInfoState {
            service: Arc::clone(&self.auth_info_service),
        })
    }

    /// Subscriptions to start for this module.
    pub fn listeners(&self) -> Vec<(ListenBinding, Arc<dyn EnvelopeHandler>)> {
        vec![
            (
                TenantRegisteredHandler::binding(),
                Arc::new(TenantRegisteredHandler::new(Arc::clone(&self.tenant_service))),
            ),
            (
                TenantSiloedHandler::binding(),
                Arc::new(TenantSiloedHandler::new(Arc::clone(&self.silo_config_service))),
            ),
        ]
    }
}
