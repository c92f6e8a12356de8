use crate::domain::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Durable streams, one per business area.
pub mod streams {
    pub const TENANTS: &str = "TENANTS";
    pub const PROJECTS: &str = "PROJECTS";
    pub const MEMBERSHIPS: &str = "MEMBERSHIPS";
}

/// Subjects follow `<stream>.<subtype>`.
pub mod subjects {
    pub const TENANT_REGISTERED: &str = "TENANTS.registered";
    pub const TENANT_SILOED: &str = "TENANTS.siloed";
    pub const TENANT_IDENTITY_CREATED: &str = "TENANTS.identityCreated";
    pub const PROJECT_CREATED: &str = "PROJECTS.created";
    pub const PROJECT_UPDATED: &str = "PROJECTS.updated";
    pub const PROJECT_DELETED: &str = "PROJECTS.deleted";
    pub const MEMBERSHIP_CREATED: &str = "MEMBERSHIPS.created";
    pub const MEMBERSHIP_UPDATED: &str = "MEMBERSHIPS.updated";
    pub const MEMBERSHIP_DELETED: &str = "MEMBERSHIPS.deleted";
}

/// Envelope `type` discriminators.
pub mod event_types {
    pub const TENANT_REGISTERED: &str = "TenantRegistered";
    pub const TENANT_SILOED: &str = "TenantSiloed";
    pub const TENANT_IDENTITY_CREATED: &str = "TenantIdentityCreated";
    pub const PROJECT_CREATED: &str = "ProjectCreated";
    pub const PROJECT_UPDATED: &str = "ProjectUpdated";
    pub const PROJECT_DELETED: &str = "ProjectDeleted";
    pub const MEMBERSHIP_CREATED: &str = "MembershipCreated";
    pub const MEMBERSHIP_UPDATED: &str = "MembershipUpdated";
    pub const MEMBERSHIP_DELETED: &str = "MembershipDeleted";
}

/// Correlation and authorization context carried with every message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub trace_id: String,
    pub user_id: String,
    pub tenant_id: String,
}

/// The unit of transport on the bus: `{type, metadata, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    pub fn new<T: Serialize>(
        kind: impl Into<String>,
        metadata: Metadata,
        data: &T,
    ) -> DomainResult<Self> {
        let data = serde_json::to_value(data)
            .map_err(|e| DomainError::Repository(anyhow::anyhow!("failed to encode event data: {}", e)))?;
        Ok(Self {
            kind: kind.into(),
            metadata,
            data,
        })
    }

    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn encode(&self) -> DomainResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| DomainError::Repository(anyhow::anyhow!("failed to encode envelope: {}", e)))
    }

    /// Decodes `data` into the payload type of this event. Unknown fields are
    /// ignored; a shape mismatch is a validation failure of the message.
    pub fn data_as<T: DeserializeOwned>(&self) -> DomainResult<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| DomainError::validation("data", format!("{} payload: {}", self.kind, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRegisteredData {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub company: String,
    pub plan: String,
    pub path: String,
    pub user_pool_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSiloedData {
    pub tenant_id: String,
    /// The tenant's routing path (e.g. `acmecorp`), not its company name.
    /// Silo configuration is keyed on it, like auth info.
    pub tenant_name: String,
    pub user_pool_id: String,
    pub app_client_id: String,
    pub deployment_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantIdentityCreatedData {
    pub tenant_id: String,
    pub user_id: String,
    pub company: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreatedData {
    pub tenant_id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub team_id: String,
    pub user_id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub column_order: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdatedData {
    pub project_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub column_order: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDeletedData {
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCreatedData {
    pub tenant_id: String,
    pub membership_id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipUpdatedData {
    pub membership_id: String,
    pub role: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipDeletedData {
    pub membership_id: String,
}
