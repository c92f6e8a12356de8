use crate::domain::{DomainError, DomainResult, Envelope, EnvelopePublisher};
use crate::nats::{publish_stack, JetStreamPublisher, NatsTracingConfig, PublishRequest, PublishStack};
use async_trait::async_trait;
use std::sync::Arc;
use tower::ServiceExt;
use tracing::debug;

/// Publishes JSON envelopes through the logging and tracing publish stack.
#[derive(Clone)]
pub struct NatsEnvelopePublisher {
    service: PublishStack,
}

impl NatsEnvelopePublisher {
    pub fn new(publisher: Arc<dyn JetStreamPublisher>, tracing_config: NatsTracingConfig) -> Self {
        Self {
            service: publish_stack(publisher, tracing_config),
        }
    }
}

#[async_trait]
impl EnvelopePublisher for NatsEnvelopePublisher {
    async fn publish(&self, subject: &str, envelope: &Envelope) -> DomainResult<()> {
        let payload = envelope.encode()?;
        let response = self
            .service
            .clone()
            .oneshot(PublishRequest::new(subject, payload))
            .await
            .map_err(DomainError::Repository)?;

        debug!(
            subject = %response.subject,
            sequence = response.sequence,
            event_type = %envelope.kind,
            "envelope published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{event_types, Metadata, TenantSiloedData};
    use crate::nats::MockJetStreamPublisher;

    #[tokio::test]
    async fn test_publishes_encoded_envelope() {
        let mut publisher = MockJetStreamPublisher::new();
        publisher
            .expect_publish_with_headers()
            .withf(|subject, _headers, payload| {
                let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
                subject == "TENANTS.siloed"
                    && value["type"] == "TenantSiloed"
                    && value["data"]["userPoolId"] == "pool-1"
            })
            .times(1)
            .return_once(|_, _, _| Ok(7));

        let envelope = Envelope::new(
            event_types::TENANT_SILOED,
            Metadata::default(),
            &TenantSiloedData {
                tenant_id: "t-1".to_string(),
                tenant_name: "acme".to_string(),
                user_pool_id: "pool-1".to_string(),
                app_client_id: "client-1".to_string(),
                deployment_status: "provisioned".to_string(),
            },
        )
        .unwrap();

        let result = NatsEnvelopePublisher::new(Arc::new(publisher), NatsTracingConfig::new("test"))
            .publish("TENANTS.siloed", &envelope)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_failure_is_repository_error() {
        let mut publisher = MockJetStreamPublisher::new();
        publisher
            .expect_publish_with_headers()
            .times(1)
            .return_once(|_, _, _| Err(anyhow::anyhow!("timed out")));

        let envelope = Envelope {
            kind: "TenantRegistered".to_string(),
            metadata: Metadata::default(),
            data: serde_json::Value::Null,
        };

        let result = NatsEnvelopePublisher::new(Arc::new(publisher), NatsTracingConfig::new("test"))
            .publish("TENANTS.registered", &envelope)
            .await;

        assert!(matches!(result, Err(DomainError::Repository(_))));
    }
}
