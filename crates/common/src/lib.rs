pub mod auth;
pub mod aws;
pub mod cognito;
pub mod domain;
pub mod dynamodb;
pub mod garde;
pub mod http;
pub mod nats;
pub mod postgres;
pub mod telemetry;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use auth::MockTokenVerifier;
#[cfg(any(test, feature = "testing"))]
pub use domain::{
    MockAuthInfoRepository, MockConnectionRepository, MockEnvelopePublisher, MockIdentityProvider,
    MockSiloConfigRepository, MockTenantRepository,
};
#[cfg(any(test, feature = "testing"))]
pub use nats::{MockEnvelopeHandler, MockInboundMessage, MockJetStreamConsumer, MockJetStreamPublisher, MockPullConsumer};
