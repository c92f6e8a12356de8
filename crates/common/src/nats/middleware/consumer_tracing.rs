use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::nats::trace_context::extract_trace_context;
use crate::nats::{ConsumeRequest, ConsumeResponse};
use tower::{Layer, Service};
use tracing::{field, info_span, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Tower layer opening one span per consumed message, parented to the
/// publisher's trace when the message carries one
#[derive(Clone, Default)]
pub struct NatsConsumeTracingLayer {
    consumer_name: String,
}

impl NatsConsumeTracingLayer {
    pub fn new(consumer_name: impl Into<String>) -> Self {
        Self {
            consumer_name: consumer_name.into(),
        }
    }
}

impl<S> Layer<S> for NatsConsumeTracingLayer {
    type Service = NatsConsumeTracingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        NatsConsumeTracingService {
            inner: service,
            consumer_name: self.consumer_name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct NatsConsumeTracingService<S> {
    inner: S,
    consumer_name: String,
}

impl<S> Service<ConsumeRequest> for NatsConsumeTracingService<S>
where
    S: Service<ConsumeRequest, Response = ConsumeResponse> + Clone + Send + 'static,
    S::Error: std::fmt::Display + Send,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: ConsumeRequest) -> Self::Future {
        let span = info_span!(
            target: "nats",
            "nats_consume",
            otel.name = "nats_consume",
            messaging.system = "nats",
            messaging.operation = "receive",
            messaging.destination.name = %req.subject,
            messaging.consumer.name = %self.consumer_name,
            messaging.message.body.size = req.payload.len(),
            otel.status_code = field::Empty,
        );

        if let Some(headers) = &req.headers {
            span.set_parent(extract_trace_context(headers));
        }

        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                let result = inner.call(req).await;

                match &result {
                    Ok(ConsumeResponse::Ack) => {
                        Span::current().record("otel.status_code", "OK");
                    }
                    Ok(ConsumeResponse::NoAck(_)) => {
                        Span::current().record("otel.status_code", "ERROR");
                    }
                    Err(e) => {
                        Span::current().record("otel.status_code", "ERROR");
                        tracing::error!(error = %e, "nats consume failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
