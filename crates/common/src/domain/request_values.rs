use crate::domain::envelope::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Tenant a routing key points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRoute {
    pub tenant_id: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Routing key to tenant lookup, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantConnectionMap(HashMap<String, TenantRoute>);

impl TenantConnectionMap {
    pub fn new(routes: HashMap<String, TenantRoute>) -> Self {
        Self(routes)
    }

    /// Parses `{"<routing key>": {"tenantId": ...}, ...}`. Blank input yields an
    /// empty map.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let map = serde_json::from_str(raw)?;
        Ok(map)
    }

    pub fn get(&self, routing_key: &str) -> Option<&TenantRoute> {
        self.0.get(routing_key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-request (or per-message) identity and correlation context.
#[derive(Debug, Clone, Default)]
pub struct RequestValues {
    pub token: String,
    pub user_id: String,
    pub tenant_id: String,
    pub trace_id: String,
    pub tenant_connection_map: Arc<TenantConnectionMap>,
    pub is_machine_client: bool,
}

impl RequestValues {
    /// Context for a message consumer, rebuilt from envelope metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            user_id: metadata.user_id.clone(),
            tenant_id: metadata.tenant_id.clone(),
            trace_id: metadata.trace_id.clone(),
            ..Default::default()
        }
    }

    /// Metadata for an outgoing envelope on behalf of this caller.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            trace_id: self.trace_id.clone(),
            user_id: self.user_id.clone(),
            tenant_id: self.tenant_id.clone(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_map_from_json() {
        let map = TenantConnectionMap::from_json(
            r#"{"acme": {"tenantId": "t-1", "plan": "premium"}, "globex": {"tenantId": "t-2"}}"#,
        )
        .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("acme").unwrap().tenant_id, "t-1");
        assert_eq!(map.get("acme").unwrap().plan.as_deref(), Some("premium"));
        assert!(map.get("initech").is_none());
    }

    #[test]
    fn test_connection_map_blank_is_empty() {
        assert!(TenantConnectionMap::from_json("  ").unwrap().is_empty());
        assert!(TenantConnectionMap::from_json("not json").is_err());
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = Metadata {
            trace_id: "trace".to_string(),
            user_id: "user".to_string(),
            tenant_id: "tenant".to_string(),
        };
        let values = RequestValues::from_metadata(&metadata);
        assert_eq!(values.metadata(), metadata);
        assert!(!values.is_machine_client);
    }
}
