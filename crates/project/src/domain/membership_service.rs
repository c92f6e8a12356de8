use crate::{event_scope, Membership, MembershipRepository, UpdateMembershipRepoInput};
use common::domain::{
    DomainError, DomainResult, MembershipCreatedData, MembershipDeletedData, MembershipUpdatedData,
    RequestValues,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Applies membership events to the tenant's replica.
pub struct MembershipService {
    repository: Arc<dyn MembershipRepository>,
}

impl MembershipService {
    pub fn new(repository: Arc<dyn MembershipRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, values, data), fields(membership_id = %data.membership_id, trace_id = %values.trace_id))]
    pub async fn create_membership_from_event(
        &self,
        values: &RequestValues,
        data: MembershipCreatedData,
    ) -> DomainResult<()> {
        if data.membership_id.is_empty() {
            return Err(DomainError::validation("membershipId", "required"));
        }
        let scoped = event_scope(values, &data.tenant_id)?;

        let membership = Membership {
            membership_id: data.membership_id,
            tenant_id: scoped.tenant_id.clone(),
            team_id: data.team_id,
            user_id: data.user_id,
            role: data.role,
            created_at: data.created_at,
            updated_at: data.updated_at,
        };

        if self.repository.upsert_membership(&scoped, membership).await? {
            info!("membership stored");
        } else {
            debug!("membership already up to date");
        }
        Ok(())
    }

    #[instrument(skip(self, values, data), fields(membership_id = %data.membership_id, trace_id = %values.trace_id))]
    pub async fn update_membership_from_event(
        &self,
        values: &RequestValues,
        data: MembershipUpdatedData,
    ) -> DomainResult<()> {
        let input = UpdateMembershipRepoInput {
            membership_id: data.membership_id,
            role: data.role,
            updated_at: data.updated_at,
        };

        if self.repository.update_membership(values, input).await? {
            info!("membership updated");
        } else {
            debug!("stale membership update ignored");
        }
        Ok(())
    }

    #[instrument(skip(self, values, data), fields(membership_id = %data.membership_id, trace_id = %values.trace_id))]
    pub async fn delete_membership_from_event(
        &self,
        values: &RequestValues,
        data: MembershipDeletedData,
    ) -> DomainResult<()> {
        if !self
            .repository
            .delete_membership(values, &data.membership_id)
            .await?
        {
            debug!("membership already gone");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockMembershipRepository;
    use chrono::Utc;

    #[tokio::test]
    async fn test_created_event_upserts_membership() {
        let mut repository = MockMembershipRepository::new();
        repository
            .expect_upsert_membership()
            .withf(|values: &RequestValues, membership: &Membership| {
                values.tenant_id == "t-1"
                    && membership.membership_id == "m-1"
                    && membership.role == "editor"
            })
            .times(1)
            .return_once(|_, _| Ok(true));

        let now = Utc::now();
        MembershipService::new(Arc::new(repository))
            .create_membership_from_event(
                &RequestValues::default().with_tenant("t-1"),
                MembershipCreatedData {
                    tenant_id: "t-1".to_string(),
                    membership_id: "m-1".to_string(),
                    team_id: "team-1".to_string(),
                    user_id: "u-1".to_string(),
                    role: "editor".to_string(),
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stale_update_is_ignored() {
        let mut repository = MockMembershipRepository::new();
        repository
            .expect_update_membership()
            .withf(|_, input: &UpdateMembershipRepoInput| input.role == "viewer")
            .times(1)
            .return_once(|_, _| Ok(false));

        let result = MembershipService::new(Arc::new(repository))
            .update_membership_from_event(
                &RequestValues::default().with_tenant("t-1"),
                MembershipUpdatedData {
                    membership_id: "m-1".to_string(),
                    role: "viewer".to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut repository = MockMembershipRepository::new();
        repository
            .expect_delete_membership()
            .times(1)
            .return_once(|_, _| Err(DomainError::NoTenant));

        let result = MembershipService::new(Arc::new(repository))
            .delete_membership_from_event(
                &RequestValues::default(),
                MembershipDeletedData {
                    membership_id: "m-1".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::NoTenant)));
    }
}
