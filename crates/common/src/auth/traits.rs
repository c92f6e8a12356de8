use super::VerifiedClaims;
use crate::domain::AuthError;
use async_trait::async_trait;

/// Verifies bearer tokens issued by the identity provider
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Check signature, expiry and issuer, then return the claims
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError>;
}
