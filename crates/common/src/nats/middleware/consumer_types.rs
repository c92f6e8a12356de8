use async_nats::HeaderMap;
use bytes::Bytes;

/// Request type for consuming a single NATS message through Tower.
///
/// This owns all the message data, allowing it to be passed through
/// Tower middleware layers without lifetime concerns.
#[derive(Debug, Clone)]
pub struct ConsumeRequest {
    pub subject: String,
    pub payload: Bytes,
    /// Carries the publisher's trace context
    pub headers: Option<HeaderMap>,
}

impl ConsumeRequest {
    pub fn new(subject: String, payload: Bytes, headers: Option<HeaderMap>) -> Self {
        Self {
            subject,
            payload,
            headers,
        }
    }
}

/// Outcome of handling a message.
///
/// Failed messages are never negatively acknowledged; they stay pending and
/// the server redelivers them once the ack wait elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeResponse {
    Ack,
    NoAck(Option<String>),
}

impl ConsumeResponse {
    pub fn ack() -> Self {
        Self::Ack
    }

    pub fn no_ack(reason: impl Into<String>) -> Self {
        Self::NoAck(Some(reason.into()))
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack)
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::NoAck(_) => "no_ack",
        }
    }
}
