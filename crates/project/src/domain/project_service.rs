use crate::{event_scope, Project, ProjectRepository, UpdateProjectRepoInput};
use common::domain::{
    DomainError, DomainResult, ProjectCreatedData, ProjectDeletedData, ProjectUpdatedData,
    RequestValues,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Applies project events to the tenant's replica and serves reads from it.
pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, values, data), fields(project_id = %data.project_id, trace_id = %values.trace_id))]
    pub async fn create_project_from_event(
        &self,
        values: &RequestValues,
        data: ProjectCreatedData,
    ) -> DomainResult<()> {
        if data.project_id.is_empty() {
            return Err(DomainError::validation("projectId", "required"));
        }
        let scoped = event_scope(values, &data.tenant_id)?;

        let project = Project {
            project_id: data.project_id,
            tenant_id: scoped.tenant_id.clone(),
            name: data.name,
            prefix: data.prefix,
            description: data.description,
            team_id: data.team_id,
            user_id: data.user_id,
            active: data.active,
            public: data.public,
            column_order: data.column_order,
            created_at: data.created_at,
            updated_at: data.updated_at,
        };

        if self.repository.upsert_project(&scoped, project).await? {
            info!("project stored");
        } else {
            debug!("project already up to date");
        }
        Ok(())
    }

    #[instrument(skip(self, values, data), fields(project_id = %data.project_id, trace_id = %values.trace_id))]
    pub async fn update_project_from_event(
        &self,
        values: &RequestValues,
        data: ProjectUpdatedData,
    ) -> DomainResult<()> {
        let input = UpdateProjectRepoInput {
            project_id: data.project_id,
            name: data.name,
            description: data.description,
            active: data.active,
            public: data.public,
            team_id: data.team_id,
            column_order: data.column_order,
            updated_at: data.updated_at,
        };

        if self.repository.update_project(values, input).await? {
            info!("project updated");
        } else {
            debug!("stale project update ignored");
        }
        Ok(())
    }

    #[instrument(skip(self, values, data), fields(project_id = %data.project_id, trace_id = %values.trace_id))]
    pub async fn delete_project_from_event(
        &self,
        values: &RequestValues,
        data: ProjectDeletedData,
    ) -> DomainResult<()> {
        if self.repository.delete_project(values, &data.project_id).await? {
            info!("project deleted");
        } else {
            debug!("project already gone");
        }
        Ok(())
    }

    #[instrument(skip(self, values), fields(tenant_id = %values.tenant_id))]
    pub async fn list_projects(&self, values: &RequestValues) -> DomainResult<Vec<Project>> {
        self.repository.list_projects(values).await
    }

    #[instrument(skip(self, values), fields(tenant_id = %values.tenant_id))]
    pub async fn get_project(&self, values: &RequestValues, project_id: &str) -> DomainResult<Project> {
        self.repository
            .get_project(values, project_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("project {}", project_id)))
    }
}
