use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::domain::{DomainResult, RequestValues};
use serde::{Deserialize, Serialize};

/// Project replica owned by a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    pub tenant_id: String,
    pub name: String,
    pub prefix: String,
    pub description: String,
    pub team_id: String,
    pub user_id: String,
    pub active: bool,
    pub public: bool,
    pub column_order: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields changed by a project update; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProjectRepoInput {
    pub project_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub public: Option<bool>,
    pub team_id: Option<String>,
    pub column_order: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

/// Repository trait for project replicas.
///
/// Every call runs on a connection scoped to `values.tenant_id`.
/// Writes return whether a row changed; older `updated_at` values are ignored.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a project or replace an older version of it
    async fn upsert_project(&self, values: &RequestValues, project: Project) -> DomainResult<bool>;

    /// Apply a partial update.
    /// Returns `DomainError::NotFound` if the project is not stored yet.
    async fn update_project(
        &self,
        values: &RequestValues,
        input: UpdateProjectRepoInput,
    ) -> DomainResult<bool>;

    async fn delete_project(&self, values: &RequestValues, project_id: &str) -> DomainResult<bool>;

    async fn get_project(
        &self,
        values: &RequestValues,
        project_id: &str,
    ) -> DomainResult<Option<Project>>;

    async fn list_projects(&self, values: &RequestValues) -> DomainResult<Vec<Project>>;
}
