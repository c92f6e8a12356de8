use crate::domain::{DomainError, DomainResult, Envelope, RequestValues};
use crate::nats::{
    ConsumeRequest, ConsumeResponse, ConsumerConfig, JetStreamConsumer, NatsConsumeLoggingLayer,
    NatsConsumeLoggingService, NatsConsumeTracingLayer, NatsConsumeTracingService, TowerConsumer,
};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use saas_runner::ShutdownSignal;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceBuilder};
use tracing::{debug, error, warn};

/// Business logic invoked for every message of the expected type
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()>;
}

/// What a listener subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenBinding {
    /// Envelope type accepted by the handler
    pub expected_type: String,
    pub subject: String,
    /// Members of a queue group compete for messages; each message reaches one of them.
    pub queue_group: String,
}

impl ListenBinding {
    pub fn new(
        expected_type: impl Into<String>,
        subject: impl Into<String>,
        queue_group: impl Into<String>,
    ) -> Self {
        Self {
            expected_type: expected_type.into(),
            subject: subject.into(),
            queue_group: queue_group.into(),
        }
    }

    /// The stream owning the subject, i.e. the part before the first `.`.
    pub fn stream_name(&self) -> &str {
        self.subject
            .split_once('.')
            .map(|(stream, _)| stream)
            .unwrap_or(&self.subject)
    }

    /// Durable consumer name shared by every member of the queue group:
    /// `{queue_group}_{stream}_{event}`, lowercased.
    ///
    /// A durable consumer has a single filter subject, so a group listening
    /// to several subjects gets one consumer per subject. The stream is part
    /// of the name because one group may listen to the same event name on
    /// several streams.
    pub fn durable_name(&self) -> String {
        let stream = self.stream_name().to_ascii_lowercase();
        match self.subject.split_once('.') {
            Some((_, event)) => format!(
                "{}_{}_{}",
                self.queue_group,
                stream,
                event.replace(['.', '*', '>'], "_")
            ),
            None => format!("{}_{}", self.queue_group, stream),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenOptions {
    pub ack_wait: Duration,
    pub batch_size: usize,
    pub max_wait: Duration,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            ack_wait: Duration::from_secs(5),
            batch_size: 1,
            max_wait: Duration::from_secs(5),
        }
    }
}

/// Decodes, type checks and dispatches one envelope, then classifies the
/// handler's result into an acknowledgment decision.
#[derive(Clone)]
pub struct EnvelopeService {
    expected_type: String,
    handler: Arc<dyn EnvelopeHandler>,
    shutdown: ShutdownSignal,
}

impl EnvelopeService {
    pub fn new(
        expected_type: impl Into<String>,
        handler: Arc<dyn EnvelopeHandler>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            expected_type: expected_type.into(),
            handler,
            shutdown,
        }
    }
}

impl Service<ConsumeRequest> for EnvelopeService {
    type Response = ConsumeResponse;
    type Error = anyhow::Error;
    type Future = BoxFuture<'static, Result<ConsumeResponse, anyhow::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ConsumeRequest) -> Self::Future {
        let expected_type = self.expected_type.clone();
        let handler = Arc::clone(&self.handler);
        let shutdown = self.shutdown.clone();

        Box::pin(async move {
            let envelope = match Envelope::decode(&req.payload) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(subject = %req.subject, error = %e, "failed to decode envelope");
                    return Ok(ConsumeResponse::no_ack(format!("decode: {}", e)));
                }
            };

            if envelope.kind != expected_type {
                warn!(
                    subject = %req.subject,
                    expected = %expected_type,
                    received = %envelope.kind,
                    "unexpected envelope type"
                );
                return Ok(ConsumeResponse::no_ack(format!(
                    "expected {} got {}",
                    expected_type, envelope.kind
                )));
            }

            let values = RequestValues::from_metadata(&envelope.metadata);
            debug!(
                subject = %req.subject,
                event_type = %envelope.kind,
                trace_id = %values.trace_id,
                tenant_id = %values.tenant_id,
                "handling envelope"
            );

            match handler.handle(values, envelope).await {
                Ok(()) => Ok(ConsumeResponse::Ack),
                Err(err) => Ok(classify_failure(&req.subject, err, &shutdown)),
            }
        })
    }
}

fn classify_failure(subject: &str, err: DomainError, shutdown: &ShutdownSignal) -> ConsumeResponse {
    match err {
        DomainError::Shutdown(reason) => {
            shutdown.trigger(reason.clone());
            ConsumeResponse::no_ack(reason)
        }
        DomainError::Repository(e) => {
            // Unexpected failures take the process down instead of looping on redelivery.
            panic!("unexpected error handling message on {}: {:#}", subject, e);
        }
        other => {
            error!(subject = %subject, error = %other, "message handler failed");
            ConsumeResponse::no_ack(other.to_string())
        }
    }
}

pub type EnvelopeServiceStack =
    NatsConsumeTracingService<NatsConsumeLoggingService<EnvelopeService>>;

/// A running subscription; see [`listen`].
pub struct EnvelopeConsumer {
    binding: ListenBinding,
    consumer: TowerConsumer<EnvelopeServiceStack>,
}

impl EnvelopeConsumer {
    pub fn binding(&self) -> &ListenBinding {
        &self.binding
    }

    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        self.consumer.run(ctx).await
    }
}

/// Subscribe a handler to a subject within a queue group.
///
/// The queue group names a durable consumer on the stream owning the
/// subject, so every process listening with the same group shares the
/// deliveries. Handled messages are acknowledged; failed ones are left for
/// redelivery after `ack_wait`.
pub async fn listen(
    consumer_client: Arc<dyn JetStreamConsumer>,
    binding: ListenBinding,
    handler: Arc<dyn EnvelopeHandler>,
    shutdown: ShutdownSignal,
    options: ListenOptions,
) -> Result<EnvelopeConsumer> {
    let config = ConsumerConfig {
        stream_name: binding.stream_name().to_string(),
        consumer_name: binding.durable_name(),
        filter_subject: binding.subject.clone(),
        ack_wait: options.ack_wait,
        batch_size: options.batch_size,
        max_wait: options.max_wait,
    };

    let service = ServiceBuilder::new()
        .layer(NatsConsumeTracingLayer::new(binding.queue_group.clone()))
        .layer(NatsConsumeLoggingLayer::new())
        .service(EnvelopeService::new(
            binding.expected_type.clone(),
            handler,
            shutdown,
        ));

    let consumer = TowerConsumer::new(consumer_client, config, service).await?;

    Ok(EnvelopeConsumer { binding, consumer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{event_types, FieldError, Metadata};
    use crate::nats::{MockJetStreamConsumer, MockPullConsumer};
    use async_nats::jetstream;
    use bytes::Bytes;
    use tower::ServiceExt;

    fn request(kind: &str) -> ConsumeRequest {
        let envelope = Envelope {
            kind: kind.to_string(),
            metadata: Metadata {
                trace_id: "trace-1".to_string(),
                user_id: "user-1".to_string(),
                tenant_id: "tenant-1".to_string(),
            },
            data: serde_json::json!({"projectId": "p-1"}),
        };
        ConsumeRequest::new(
            "PROJECTS.deleted".to_string(),
            Bytes::from(envelope.encode().unwrap()),
            None,
        )
    }

    fn service(handler: MockEnvelopeHandler, shutdown: ShutdownSignal) -> EnvelopeService {
        EnvelopeService::new(event_types::PROJECT_DELETED, Arc::new(handler), shutdown)
    }

    #[test]
    fn test_stream_name_is_subject_prefix() {
        let binding = ListenBinding::new("TenantRegistered", "TENANTS.registered", "tenant_consumer");
        assert_eq!(binding.stream_name(), "TENANTS");

        let binding = ListenBinding::new("X", "TENANTS", "q");
        assert_eq!(binding.stream_name(), "TENANTS");
    }

    #[test]
    fn test_durable_name_per_group_and_subject() {
        let created = ListenBinding::new("ProjectCreated", "PROJECTS.created", "project_consumer");
        let deleted = ListenBinding::new("ProjectDeleted", "PROJECTS.deleted", "project_consumer");
        assert_eq!(created.durable_name(), "project_consumer_projects_created");
        assert_eq!(deleted.durable_name(), "project_consumer_projects_deleted");

        let bare = ListenBinding::new("X", "TENANTS", "q");
        assert_eq!(bare.durable_name(), "q_tenants");
    }

    #[test]
    fn test_same_event_on_two_streams_gets_two_durables() {
        let project = ListenBinding::new("ProjectCreated", "PROJECTS.created", "project_consumer");
        let membership =
            ListenBinding::new("MembershipCreated", "MEMBERSHIPS.created", "project_consumer");

        assert_eq!(membership.durable_name(), "project_consumer_memberships_created");
        assert_ne!(project.durable_name(), membership.durable_name());
    }

    #[tokio::test]
    async fn test_handled_message_is_acked_with_request_values() {
        let mut handler = MockEnvelopeHandler::new();
        handler
            .expect_handle()
            .withf(|values: &RequestValues, envelope: &Envelope| {
                values.trace_id == "trace-1"
                    && values.user_id == "user-1"
                    && values.tenant_id == "tenant-1"
                    && envelope.data["projectId"] == "p-1"
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let response = service(handler, ShutdownSignal::new())
            .oneshot(request(event_types::PROJECT_DELETED))
            .await
            .unwrap();

        assert_eq!(response, ConsumeResponse::Ack);
    }

    #[tokio::test]
    async fn test_type_mismatch_skips_handler() {
        let mut handler = MockEnvelopeHandler::new();
        handler.expect_handle().times(0);

        let response = service(handler, ShutdownSignal::new())
            .oneshot(request(event_types::PROJECT_CREATED))
            .await
            .unwrap();

        assert!(!response.is_ack());
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_not_acked() {
        let mut handler = MockEnvelopeHandler::new();
        handler.expect_handle().times(0);

        let response = service(handler, ShutdownSignal::new())
            .oneshot(ConsumeRequest::new(
                "PROJECTS.deleted".to_string(),
                Bytes::from_static(b"{not json"),
                None,
            ))
            .await
            .unwrap();

        assert!(!response.is_ack());
    }

    #[tokio::test]
    async fn test_expected_failure_is_left_for_redelivery() {
        let mut handler = MockEnvelopeHandler::new();
        handler.expect_handle().times(1).return_once(|_, _| {
            Err(DomainError::Validation(vec![FieldError::new("projectId", "required")]))
        });
        let shutdown = ShutdownSignal::new();

        let response = service(handler, shutdown.clone())
            .oneshot(request(event_types::PROJECT_DELETED))
            .await
            .unwrap();

        assert!(!response.is_ack());
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_integrity_failure_requests_shutdown() {
        let mut handler = MockEnvelopeHandler::new();
        handler
            .expect_handle()
            .times(1)
            .return_once(|_, _| Err(DomainError::missing_request_values()));
        let shutdown = ShutdownSignal::new();

        let response = service(handler, shutdown.clone())
            .oneshot(request(event_types::PROJECT_DELETED))
            .await
            .unwrap();

        assert!(!response.is_ack());
        assert!(shutdown.is_triggered());
        assert_eq!(
            shutdown.reason().as_deref(),
            Some("request values missing from context")
        );
    }

    #[tokio::test]
    #[should_panic(expected = "unexpected error handling message")]
    async fn test_unexpected_failure_panics() {
        let mut handler = MockEnvelopeHandler::new();
        handler
            .expect_handle()
            .times(1)
            .return_once(|_, _| Err(DomainError::Repository(anyhow::anyhow!("disk on fire"))));

        let _ = service(handler, ShutdownSignal::new())
            .oneshot(request(event_types::PROJECT_DELETED))
            .await;
    }

    #[tokio::test]
    async fn test_listen_binds_queue_group_to_subject_stream() {
        let mut client = MockJetStreamConsumer::new();
        client
            .expect_create_consumer()
            .withf(|config: &jetstream::consumer::pull::Config, stream_name: &str| {
                stream_name == "PROJECTS"
                    && config.durable_name.as_deref() == Some("project_consumer_projects_deleted")
                    && config.filter_subject == "PROJECTS.deleted"
                    && config.ack_wait == Duration::from_secs(5)
            })
            .times(1)
            .returning(|_, _| Ok(Box::new(MockPullConsumer::new())));

        let consumer = listen(
            Arc::new(client),
            ListenBinding::new(event_types::PROJECT_DELETED, "PROJECTS.deleted", "project_consumer"),
            Arc::new(MockEnvelopeHandler::new()),
            ShutdownSignal::new(),
            ListenOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(consumer.binding().queue_group, "project_consumer");
    }
}
