use crate::TenantService;
use async_trait::async_trait;
use common::domain::{event_types, subjects, DomainResult, Envelope, RequestValues, TenantRegisteredData};
use common::nats::{EnvelopeHandler, ListenBinding};
use std::sync::Arc;
use tracing::debug;

pub const TENANT_QUEUE_GROUP: &str = "tenant_consumer";

/// Creates the tenant and its account owner once registration is published.
pub struct TenantRegisteredHandler {
    service: Arc<TenantService>,
}

impl TenantRegisteredHandler {
    pub fn new(service: Arc<TenantService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(
            event_types::TENANT_REGISTERED,
            subjects::TENANT_REGISTERED,
            TENANT_QUEUE_GROUP,
        )
    }
}

#[async_trait]
impl EnvelopeHandler for TenantRegisteredHandler {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: TenantRegisteredData = envelope.data_as()?;
        debug!(tenant_id = %data.id, plan = %data.plan, "handling tenant registered");

        self.service.create_tenant_from_event(&values, data).await
    }
}
