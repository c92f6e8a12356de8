use crate::{Membership, MembershipRepository, UpdateMembershipRepoInput};
use async_trait::async_trait;
use common::domain::{DomainError, DomainResult, RequestValues};
use common::postgres::PostgresClient;
use tracing::{debug, instrument};

/// PostgreSQL implementation of MembershipRepository trait
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    client: PostgresClient,
}

impl PostgresMembershipRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    #[instrument(skip(self, values, membership), fields(membership_id = %membership.membership_id, tenant_id = %values.tenant_id))]
    async fn upsert_membership(
        &self,
        values: &RequestValues,
        membership: Membership,
    ) -> DomainResult<bool> {
        let conn = self.client.get_tenant_connection(values).await?;

        let rows = conn
            .execute(
                "INSERT INTO memberships (membership_id, tenant_id, team_id, user_id, role,
                     created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (membership_id) DO UPDATE SET
                     team_id = EXCLUDED.team_id,
                     user_id = EXCLUDED.user_id,
                     role = EXCLUDED.role,
                     updated_at = EXCLUDED.updated_at
                 WHERE memberships.updated_at < EXCLUDED.updated_at",
                &[
                    &membership.membership_id,
                    &membership.tenant_id,
                    &membership.team_id,
                    &membership.user_id,
                    &membership.role,
                    &membership.created_at,
                    &membership.updated_at,
                ],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        debug!(rows, "membership upserted");
        Ok(rows > 0)
    }

    #[instrument(skip(self, values, input), fields(membership_id = %input.membership_id, tenant_id = %values.tenant_id))]
    async fn update_membership(
        &self,
        values: &RequestValues,
        input: UpdateMembershipRepoInput,
    ) -> DomainResult<bool> {
        let conn = self.client.get_tenant_connection(values).await?;

        let rows = conn
            .execute(
                "UPDATE memberships SET role = $2, updated_at = $3
                 WHERE membership_id = $1 AND updated_at < $3",
                &[&input.membership_id, &input.role, &input.updated_at],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if rows > 0 {
            return Ok(true);
        }

        let exists = conn
            .query_opt(
                "SELECT 1 FROM memberships WHERE membership_id = $1",
                &[&input.membership_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?
            .is_some();

        if exists {
            Ok(false)
        } else {
            Err(DomainError::NotFound(format!("membership {}", input.membership_id)))
        }
    }

    #[instrument(skip(self, values), fields(tenant_id = %values.tenant_id))]
    async fn delete_membership(
        &self,
        values: &RequestValues,
        membership_id: &str,
    ) -> DomainResult<bool> {
        let conn = self.client.get_tenant_connection(values).await?;

        let rows = conn
            .execute(
                "DELETE FROM memberships WHERE membership_id = $1",
                &[&membership_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(rows > 0)
    }
}
