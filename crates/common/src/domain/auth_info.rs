use crate::domain::result::DomainResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path used by every tenant sharing the pooled identity pool.
pub const DEFAULT_TENANT_PATH: &str = "app";

/// Isolation model of a tenant's identity pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserPoolType {
    Pooled,
    Siloed,
}

impl UserPoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserPoolType::Pooled => "pooled",
            UserPoolType::Siloed => "siloed",
        }
    }
}

impl fmt::Display for UserPoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserPoolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pooled" => Ok(UserPoolType::Pooled),
            "siloed" => Ok(UserPoolType::Siloed),
            other => Err(format!("unknown user pool type: {}", other)),
        }
    }
}

/// Subscription plan chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "basic",
            Plan::Premium => "premium",
        }
    }

    /// Premium tenants get a dedicated pool at their own path, everyone else
    /// shares the pooled one at [`DEFAULT_TENANT_PATH`].
    pub fn resolve_isolation(&self, path: &str) -> (UserPoolType, String) {
        match self {
            Plan::Premium => (UserPoolType::Siloed, normalize_path(path)),
            Plan::Basic => (UserPoolType::Pooled, DEFAULT_TENANT_PATH.to_string()),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Plan::Basic),
            "premium" => Ok(Plan::Premium),
            other => Err(format!("unknown plan: {}", other)),
        }
    }
}

/// Strips surrounding slashes; an empty path falls back to the default path.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_TENANT_PATH.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Maps a tenant routing path to its identity pool coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    pub tenant_path: String,
    pub user_pool_id: String,
    pub user_pool_type: UserPoolType,
    pub user_pool_client_id: String,
}

/// Auth info as returned to the login page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfoAndRegion {
    pub project_region: String,
    pub cognito_region: String,
    pub user_pool_id: String,
    pub user_pool_client_id: String,
}

/// Storage for auth info records, keyed by tenant path
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthInfoRepository: Send + Sync {
    /// Insert only when no record exists for the path yet.
    /// Returns `DomainError::AlreadyExists` when another writer got there first.
    async fn insert(&self, info: AuthInfo) -> DomainResult<()>;

    /// Get the record for a path
    async fn select(&self, tenant_path: &str) -> DomainResult<Option<AuthInfo>>;
}
