use crate::MembershipService;
use async_trait::async_trait;
use common::domain::{
    event_types, subjects, DomainResult, Envelope, MembershipCreatedData, MembershipDeletedData,
    MembershipUpdatedData, RequestValues,
};
use common::nats::{EnvelopeHandler, ListenBinding};
use std::sync::Arc;

use super::PROJECT_QUEUE_GROUP;

pub struct MembershipCreatedHandler {
    service: Arc<MembershipService>,
}

impl MembershipCreatedHandler {
    pub fn new(service: Arc<MembershipService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(
            event_types::MEMBERSHIP_CREATED,
            subjects::MEMBERSHIP_CREATED,
            PROJECT_QUEUE_GROUP,
        )
    }
}

#[async_trait]
impl EnvelopeHandler for MembershipCreatedHandler {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: MembershipCreatedData = envelope.data_as()?;
        self.service.create_membership_from_event(&values, data).await
    }
}

pub struct MembershipUpdatedHandler {
    service: Arc<MembershipService>,
}

impl MembershipUpdatedHandler {
    pub fn new(service: Arc<MembershipService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(
            event_types::MEMBERSHIP_UPDATED,
            subjects::MEMBERSHIP_UPDATED,
            PROJECT_QUEUE_GROUP,
        )
    }
}

#[async_trait]
impl EnvelopeHandler for MembershipUpdatedHandler {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: MembershipUpdatedData = envelope.data_as()?;
        self.service.update_membership_from_event(&values, data).await
    }
}

pub struct MembershipDeletedHandler {
    service: Arc<MembershipService>,
}

impl MembershipDeletedHandler {
    pub fn new(service: Arc<MembershipService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(
            event_types::MEMBERSHIP_DELETED,
            subjects::MEMBERSHIP_DELETED,
            PROJECT_QUEUE_GROUP,
        )
    }
}

#[async_trait]
impl EnvelopeHandler for MembershipDeletedHandler {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: MembershipDeletedData = envelope.data_as()?;
        self.service.delete_membership_from_event(&values, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockMembershipRepository;
    use common::domain::Metadata;

    #[tokio::test]
    async fn test_deleted_membership_reaches_repository_under_metadata_tenant() {
        let mut repository = MockMembershipRepository::new();
        repository
            .expect_delete_membership()
            .withf(|values: &RequestValues, membership_id: &str| {
                values.tenant_id == "t-1" && membership_id == "m-1"
            })
            .times(1)
            .return_once(|_, _| Ok(true));
        let handler =
            MembershipDeletedHandler::new(Arc::new(MembershipService::new(Arc::new(repository))));

        let envelope = Envelope {
            kind: event_types::MEMBERSHIP_DELETED.to_string(),
            metadata: Metadata {
                tenant_id: "t-1".to_string(),
                ..Default::default()
            },
            data: serde_json::json!({"membershipId": "m-1"}),
        };
        let values = RequestValues::from_metadata(&envelope.metadata);

        handler.handle(values, envelope).await.unwrap();
        assert_eq!(MembershipDeletedHandler::binding().stream_name(), "MEMBERSHIPS");
    }
}
