use serde::{Deserialize, Serialize};

/// Claims of a verified identity or access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedClaims {
    pub sub: String,
    #[serde(rename = "custom:tenant-id", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,
}

impl VerifiedClaims {
    /// Client-credential access tokens use the app client id as subject.
    pub fn is_machine_client(&self) -> bool {
        self.client_id.as_deref() == Some(self.sub.as_str())
    }

    /// Tenant claim, treating an empty value as absent.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant_id.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_from_id_token() {
        let claims: VerifiedClaims = serde_json::from_value(serde_json::json!({
            "sub": "user-1",
            "custom:tenant-id": "tenant-1",
            "token_use": "id",
            "email": "owner@acme.io"
        }))
        .unwrap();

        assert_eq!(claims.tenant(), Some("tenant-1"));
        assert!(!claims.is_machine_client());
    }

    #[test]
    fn test_claims_from_client_credentials_token() {
        let claims: VerifiedClaims = serde_json::from_value(serde_json::json!({
            "sub": "client-1",
            "client_id": "client-1",
            "token_use": "access",
            "custom:tenant-id": ""
        }))
        .unwrap();

        assert!(claims.is_machine_client());
        assert_eq!(claims.tenant(), None);
    }
}
