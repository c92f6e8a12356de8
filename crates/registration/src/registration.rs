use crate::{registration_routes, IdentityService, RegistrationService, RegistrationState};
use axum::Router;
use common::domain::{AuthInfoRepository, EnvelopePublisher, IdentityProvider};
use common::http::AuthState;
use saas_runner::ShutdownSignal;
use std::sync::Arc;
use tracing::debug;

/// Registration module: the saga services behind their HTTP routes.
pub struct Registration {
    state: RegistrationState,
    auth: AuthState,
}

impl Registration {
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        auth_info_repository: Arc<dyn AuthInfoRepository>,
        publisher: Arc<dyn EnvelopePublisher>,
        auth: AuthState,
        shutdown: ShutdownSignal,
        production: bool,
    ) -> Self {
        debug!("initializing registration module");

        let identity_service = Arc::new(IdentityService::new(
            identity_provider,
            auth_info_repository,
            Arc::clone(&publisher),
            production,
        ));
        let registration_service = Arc::new(RegistrationService::new(identity_service, publisher));

        Self {
            state: RegistrationState {
                registrar: registration_service,
                shutdown,
            },
            auth,
        }
    }

    pub fn router(&self) -> Router {
        registration_routes(self.state.clone(), self.auth.clone())
    }
}
