use crate::{Project, ProjectRepository, UpdateProjectRepoInput};
use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, RequestValues};
use common::postgres::PostgresClient;
use tokio_postgres::Row;
use tracing::{debug, instrument};

const PROJECT_COLUMNS: &str = "project_id, tenant_id, name, prefix, description, team_id, user_id, \
     active, public, column_order, created_at, updated_at";

fn project_from_row(row: &Row) -> Project {
    Project {
        project_id: row.get("project_id"),
        tenant_id: row.get("tenant_id"),
        name: row.get("name"),
        prefix: row.get("prefix"),
        description: row.get("description"),
        team_id: row.get("team_id"),
        user_id: row.get("user_id"),
        active: row.get("active"),
        public: row.get("public"),
        column_order: row.get("column_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of ProjectRepository trait
#[derive(Clone)]
pub struct PostgresProjectRepository {
    client: PostgresClient,
}

impl PostgresProjectRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    #[instrument(skip(self, values, project), fields(project_id = %project.project_id, tenant_id = %values.tenant_id))]
    async fn upsert_project(&self, values: &RequestValues, project: Project) -> DomainResult<bool> {
        let conn = self.client.get_tenant_connection(values).await?;

        let rows = conn
            .execute(
                "INSERT INTO projects (project_id, tenant_id, name, prefix, description, team_id,
                     user_id, active, public, column_order, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                 ON CONFLICT (project_id) DO UPDATE SET
                     name = EXCLUDED.name,
                     prefix = EXCLUDED.prefix,
                     description = EXCLUDED.description,
                     team_id = EXCLUDED.team_id,
                     user_id = EXCLUDED.user_id,
                     active = EXCLUDED.active,
                     public = EXCLUDED.public,
                     column_order = EXCLUDED.column_order,
                     updated_at = EXCLUDED.updated_at
                 WHERE projects.updated_at < EXCLUDED.updated_at",
                &[
                    &project.project_id,
                    &project.tenant_id,
                    &project.name,
                    &project.prefix,
                    &project.description,
                    &project.team_id,
                    &project.user_id,
                    &project.active,
                    &project.public,
                    &project.column_order,
                    &project.created_at,
                    &project.updated_at,
                ],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        debug!(rows, "project upserted");
        Ok(rows > 0)
    }

    #[instrument(skip(self, values, input), fields(project_id = %input.project_id, tenant_id = %values.tenant_id))]
    async fn update_project(
        &self,
        values: &RequestValues,
        input: UpdateProjectRepoInput,
    ) -> DomainResult<bool> {
        let conn = self.client.get_tenant_connection(values).await?;

        let rows = conn
            .execute(
                "UPDATE projects SET
                     name = COALESCE($2, name),
                     description = COALESCE($3, description),
                     active = COALESCE($4, active),
                     public = COALESCE($5, public),
                     team_id = COALESCE($6, team_id),
                     column_order = COALESCE($7, column_order),
                     updated_at = $8
                 WHERE project_id = $1 AND updated_at < $8",
                &[
                    &input.project_id,
                    &input.name,
                    &input.description,
                    &input.active,
                    &input.public,
                    &input.team_id,
                    &input.column_order,
                    &input.updated_at,
                ],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if rows > 0 {
            return Ok(true);
        }

        let exists = conn
            .query_opt("SELECT 1 FROM projects WHERE project_id = $1", &[&input.project_id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?
            .is_some();

        if exists {
            Ok(false)
        } else {
            Err(DomainError::NotFound(format!("project {}", input.project_id)))
        }
    }

    #[instrument(skip(self, values), fields(tenant_id = %values.tenant_id))]
    async fn delete_project(&self, values: &RequestValues, project_id: &str) -> DomainResult<bool> {
        let conn = self.client.get_tenant_connection(values).await?;

        let rows = conn
            .execute("DELETE FROM projects WHERE project_id = $1", &[&project_id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(rows > 0)
    }

    #[instrument(skip(self, values), fields(tenant_id = %values.tenant_id))]
    async fn get_project(
        &self,
        values: &RequestValues,
        project_id: &str,
    ) -> DomainResult<Option<Project>> {
        let conn = self.client.get_tenant_connection(values).await?;

        let row = conn
            .query_opt(
                &format!("SELECT {} FROM projects WHERE project_id = $1", PROJECT_COLUMNS),
                &[&project_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.as_ref().map(project_from_row))
    }

    #[instrument(skip(self, values), fields(tenant_id = %values.tenant_id))]
    async fn list_projects(&self, values: &RequestValues) -> DomainResult<Vec<Project>> {
        let conn = self.client.get_tenant_connection(values).await?;

        let rows = conn
            .query(
                &format!("SELECT {} FROM projects ORDER BY created_at, project_id", PROJECT_COLUMNS),
                &[],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        debug!(count = rows.len(), "projects listed");
        Ok(rows.iter().map(project_from_row).collect())
    }
}
