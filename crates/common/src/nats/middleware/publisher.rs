use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use super::types::{PublishRequest, PublishResponse};
use super::{
    NatsPublishLoggingLayer, NatsPublishLoggingService, NatsPublishTracingLayer,
    NatsPublishTracingService, NatsTracingConfig,
};
use crate::nats::JetStreamPublisher;
use anyhow::Result;
use tower::{Service, ServiceBuilder};

/// Inner service that performs the actual NATS publish
#[derive(Clone)]
pub struct NatsPublishService {
    publisher: Arc<dyn JetStreamPublisher>,
}

impl NatsPublishService {
    pub fn new(publisher: Arc<dyn JetStreamPublisher>) -> Self {
        Self { publisher }
    }
}

impl Service<PublishRequest> for NatsPublishService {
    type Response = PublishResponse;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: PublishRequest) -> Self::Future {
        let publisher = Arc::clone(&self.publisher);
        let subject = req.subject.clone();

        Box::pin(async move {
            let sequence = publisher
                .publish_with_headers(subject.clone(), req.headers, req.payload)
                .await?;
            Ok(PublishResponse { subject, sequence })
        })
    }
}

/// Tracing (outermost) -> Logging -> Publish
pub type PublishStack = NatsPublishTracingService<NatsPublishLoggingService<NatsPublishService>>;

pub fn publish_stack(
    publisher: Arc<dyn JetStreamPublisher>,
    tracing_config: NatsTracingConfig,
) -> PublishStack {
    ServiceBuilder::new()
        .layer(NatsPublishTracingLayer::new(tracing_config))
        .layer(NatsPublishLoggingLayer::new())
        .service(NatsPublishService::new(publisher))
}
