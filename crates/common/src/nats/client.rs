use crate::nats::traits::{InboundMessage, JetStreamConsumer, JetStreamPublisher, PullConsumer};
use anyhow::{Context, Result};
use async_nats::jetstream::{self, stream::Config as StreamConfig};
use async_nats::HeaderMap;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Stream definition for a business area: captures `<name>` and `<name>.*`,
/// persisted to file, never evicted by age.
pub fn stream_config(stream_name: &str) -> StreamConfig {
    StreamConfig {
        name: stream_name.to_string(),
        subjects: vec![stream_name.to_string(), format!("{}.*", stream_name)],
        storage: jetstream::stream::StorageType::File,
        max_age: Duration::ZERO,
        ..Default::default()
    }
}

pub struct NatsClient {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl NatsClient {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        info!(url = %url, timeout_ms = timeout.as_millis(), "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        let jetstream = jetstream::new(client.clone());

        info!("Successfully connected to NATS");
        Ok(Self { client, jetstream })
    }

    /// Create a stream unless it already exists.
    pub async fn create_stream(&self, stream_name: &str) -> Result<()> {
        self.create_publisher_client()
            .get_or_create_stream(stream_config(stream_name))
            .await?;
        info!(stream = %stream_name, "Stream ready");
        Ok(())
    }

    /// Create a JetStreamConsumer trait object from this client
    pub fn create_consumer_client(&self) -> Arc<dyn JetStreamConsumer> {
        Arc::new(NatsJetStreamConsumer::new(self.jetstream.clone()))
    }

    /// Create a JetStreamPublisher trait object from this client
    pub fn create_publisher_client(&self) -> Arc<dyn JetStreamPublisher> {
        Arc::new(NatsJetStreamPublisher::new(self.jetstream.clone()))
    }

    /// Flush pending publishes before the connection is dropped.
    pub async fn close(self) -> Result<()> {
        info!("Closing NATS connection");
        self.client
            .flush()
            .await
            .context("Failed to flush NATS connection")
    }
}

/// Concrete implementation of JetStreamConsumer using async-nats
pub struct NatsJetStreamConsumer {
    context: jetstream::Context,
}

impl NatsJetStreamConsumer {
    pub fn new(context: jetstream::Context) -> Self {
        Self { context }
    }
}

#[async_trait]
impl JetStreamConsumer for NatsJetStreamConsumer {
    async fn create_consumer(
        &self,
        config: jetstream::consumer::pull::Config,
        stream_name: &str,
    ) -> Result<Box<dyn PullConsumer>> {
        let consumer = self
            .context
            .create_consumer_on_stream(config, stream_name)
            .await
            .context("Failed to create consumer")?;

        Ok(Box::new(NatsPullConsumer { consumer }))
    }
}

/// Concrete implementation of PullConsumer using async-nats
pub struct NatsPullConsumer {
    consumer: jetstream::consumer::PullConsumer,
}

#[async_trait]
impl PullConsumer for NatsPullConsumer {
    async fn fetch_messages(
        &self,
        max_messages: usize,
        expires: Duration,
    ) -> Result<Vec<Box<dyn InboundMessage>>> {
        use futures::StreamExt;

        let mut messages = self
            .consumer
            .fetch()
            .max_messages(max_messages)
            .expires(expires)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        let mut result: Vec<Box<dyn InboundMessage>> = Vec::new();
        while let Some(msg) = messages.next().await {
            match msg {
                Ok(message) => result.push(Box::new(NatsInboundMessage(message))),
                Err(e) => {
                    error!(error = %e, "Error receiving message");
                }
            }
        }
        Ok(result)
    }
}

/// JetStream message behind the InboundMessage capability
pub struct NatsInboundMessage(jetstream::Message);

#[async_trait]
impl InboundMessage for NatsInboundMessage {
    fn subject(&self) -> String {
        self.0.subject.to_string()
    }

    fn payload(&self) -> Bytes {
        self.0.payload.clone()
    }

    fn headers(&self) -> Option<HeaderMap> {
        self.0.headers.clone()
    }

    async fn ack(&self) -> Result<()> {
        self.0
            .ack()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to acknowledge message: {}", e))
    }
}

/// Concrete implementation of JetStreamPublisher using async-nats
pub struct NatsJetStreamPublisher {
    context: jetstream::Context,
}

impl NatsJetStreamPublisher {
    pub fn new(context: jetstream::Context) -> Self {
        Self { context }
    }
}

#[async_trait]
impl JetStreamPublisher for NatsJetStreamPublisher {
    async fn get_or_create_stream(&self, config: StreamConfig) -> Result<()> {
        let name = config.name.clone();
        self.context
            .get_or_create_stream(config)
            .await
            .with_context(|| format!("Failed to create stream {}", name))?;
        Ok(())
    }

    #[instrument(skip(self, headers, payload), fields(subject = %subject, payload_size = payload.len()))]
    async fn publish_with_headers(
        &self,
        subject: String,
        headers: HeaderMap,
        payload: Bytes,
    ) -> Result<u64> {
        let ack = self
            .context
            .publish_with_headers(subject, headers, payload)
            .await
            .context("Failed to publish message to JetStream")?;

        let ack = ack
            .await
            .context("Failed to receive JetStream acknowledgment")?;
        Ok(ack.sequence)
    }
}
