use crate::SiloConfigService;
use async_trait::async_trait;
use common::domain::{event_types, subjects, DomainResult, Envelope, RequestValues, TenantSiloedData};
use common::nats::{EnvelopeHandler, ListenBinding};
use std::sync::Arc;

pub const SILO_QUEUE_GROUP: &str = "tenant_silo_consumer";

/// Records the pool of a siloed tenant.
pub struct TenantSiloedHandler {
    service: Arc<SiloConfigService>,
}

impl TenantSiloedHandler {
    pub fn new(service: Arc<SiloConfigService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(event_types::TENANT_SILOED, subjects::TENANT_SILOED, SILO_QUEUE_GROUP)
    }
}

#[async_trait]
impl EnvelopeHandler for TenantSiloedHandler {
    async fn handle(&self, _values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: TenantSiloedData = envelope.data_as()?;
        self.service.store_config_from_event(data).await
    }
}
