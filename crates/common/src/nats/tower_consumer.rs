use crate::nats::{ConsumeRequest, ConsumeResponse, InboundMessage, JetStreamConsumer, PullConsumer};
use anyhow::{Context, Result};
use async_nats::jetstream;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};
use tracing::{debug, error, info};

/// Settings of a durable pull consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub stream_name: String,
    /// Durable name; every process using the same name shares the deliveries.
    pub consumer_name: String,
    pub filter_subject: String,
    /// Redelivery delay for messages left unacknowledged
    pub ack_wait: Duration,
    /// Messages in flight per fetch
    pub batch_size: usize,
    pub max_wait: Duration,
}

impl ConsumerConfig {
    fn pull_config(&self) -> jetstream::consumer::pull::Config {
        jetstream::consumer::pull::Config {
            name: Some(self.consumer_name.clone()),
            durable_name: Some(self.consumer_name.clone()),
            filter_subject: self.filter_subject.clone(),
            ack_policy: jetstream::consumer::AckPolicy::Explicit,
            deliver_policy: jetstream::consumer::DeliverPolicy::All,
            ack_wait: self.ack_wait,
            ..Default::default()
        }
    }
}

/// A NATS consumer that processes messages through a Tower service stack.
///
/// Messages are handled one at a time. The service decides per message
/// whether it is acknowledged; anything else is left for redelivery.
pub struct TowerConsumer<S> {
    consumer: Box<dyn PullConsumer>,
    config: ConsumerConfig,
    service: S,
}

impl<S> TowerConsumer<S>
where
    S: Service<ConsumeRequest, Response = ConsumeResponse, Error = anyhow::Error>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    pub async fn new(
        jetstream: Arc<dyn JetStreamConsumer>,
        config: ConsumerConfig,
        service: S,
    ) -> Result<Self> {
        debug!(
            stream = %config.stream_name,
            consumer = %config.consumer_name,
            filter_subject = %config.filter_subject,
            ack_wait_ms = config.ack_wait.as_millis(),
            "creating tower nats consumer"
        );

        let consumer = jetstream
            .create_consumer(config.pull_config(), &config.stream_name)
            .await
            .context("failed to create consumer")?;

        Ok(Self {
            consumer,
            config,
            service,
        })
    }

    /// Run the consumer loop until cancellation
    pub async fn run(mut self, ctx: CancellationToken) -> Result<()> {
        debug!(
            stream = %self.config.stream_name,
            consumer = %self.config.consumer_name,
            "starting tower nats consumer"
        );

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(
                        stream = %self.config.stream_name,
                        consumer = %self.config.consumer_name,
                        "received shutdown signal, stopping consumer"
                    );
                    break;
                }
                result = self.fetch_and_process_batch() => {
                    if let Err(e) = result {
                        error!(
                            stream = %self.config.stream_name,
                            consumer = %self.config.consumer_name,
                            error = %e,
                            "error processing batch"
                        );
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn fetch_and_process_batch(&mut self) -> Result<()> {
        let messages = self
            .consumer
            .fetch_messages(self.config.batch_size, self.config.max_wait)
            .await?;

        if messages.is_empty() {
            return Ok(());
        }

        debug!(message_count = messages.len(), "received message batch");

        for msg in messages {
            self.process_message(msg.as_ref()).await;
        }

        Ok(())
    }

    async fn process_message(&mut self, msg: &dyn InboundMessage) {
        let subject = msg.subject();
        let request = ConsumeRequest::new(subject.clone(), msg.payload(), msg.headers());

        let response = match self.service.clone().oneshot(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(subject = %subject, error = %e, "service error processing message");
                ConsumeResponse::no_ack(e.to_string())
            }
        };

        match response {
            ConsumeResponse::Ack => {
                if let Err(e) = msg.ack().await {
                    error!(subject = %subject, error = %e, "failed to acknowledge message");
                }
            }
            ConsumeResponse::NoAck(reason) => {
                debug!(
                    subject = %subject,
                    reason = reason.as_deref().unwrap_or(""),
                    "leaving message unacknowledged"
                );
            }
        }
    }
}
