use crate::domain::envelope::Envelope;
use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Publishes envelopes on the message bus
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EnvelopePublisher: Send + Sync {
    /// Publish and wait for the bus to persist the message
    async fn publish(&self, subject: &str, envelope: &Envelope) -> DomainResult<()>;
}
