use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::domain::{DomainResult, RequestValues};
use serde::{Deserialize, Serialize};

/// Team membership replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub membership_id: String,
    pub tenant_id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMembershipRepoInput {
    pub membership_id: String,
    pub role: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for membership replicas, with the same scoping and
/// ordering rules as [`crate::ProjectRepository`].
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn upsert_membership(
        &self,
        values: &RequestValues,
        membership: Membership,
    ) -> DomainResult<bool>;

    /// Returns `DomainError::NotFound` if the membership is not stored yet.
    async fn update_membership(
        &self,
        values: &RequestValues,
        input: UpdateMembershipRepoInput,
    ) -> DomainResult<bool>;

    async fn delete_membership(
        &self,
        values: &RequestValues,
        membership_id: &str,
    ) -> DomainResult<bool>;
}
