use crate::ProjectService;
use async_trait::async_trait;
use common::domain::{
    event_types, subjects, DomainResult, Envelope, ProjectCreatedData, ProjectDeletedData,
    ProjectUpdatedData, RequestValues,
};
use common::nats::{EnvelopeHandler, ListenBinding};
use std::sync::Arc;

pub const PROJECT_QUEUE_GROUP: &str = "project_consumer";

pub struct ProjectCreatedHandler {
    service: Arc<ProjectService>,
}

impl ProjectCreatedHandler {
    pub fn new(service: Arc<ProjectService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(
            event_types::PROJECT_CREATED,
            subjects::PROJECT_CREATED,
            PROJECT_QUEUE_GROUP,
        )
    }
}

#[async_trait]
impl EnvelopeHandler for ProjectCreatedHandler {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: ProjectCreatedData = envelope.data_as()?;
        self.service.create_project_from_event(&values, data).await
    }
}

pub struct ProjectUpdatedHandler {
    service: Arc<ProjectService>,
}

impl ProjectUpdatedHandler {
    pub fn new(service: Arc<ProjectService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(
            event_types::PROJECT_UPDATED,
            subjects::PROJECT_UPDATED,
            PROJECT_QUEUE_GROUP,
        )
    }
}

#[async_trait]
impl EnvelopeHandler for ProjectUpdatedHandler {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: ProjectUpdatedData = envelope.data_as()?;
        self.service.update_project_from_event(&values, data).await
    }
}

pub struct ProjectDeletedHandler {
    service: Arc<ProjectService>,
}

impl ProjectDeletedHandler {
    pub fn new(service: Arc<ProjectService>) -> Self {
        Self { service }
    }

    pub fn binding() -> ListenBinding {
        ListenBinding::new(
            event_types::PROJECT_DELETED,
            subjects::PROJECT_DELETED,
            PROJECT_QUEUE_GROUP,
        )
    }
}

#[async_trait]
impl EnvelopeHandler for ProjectDeletedHandler {
    async fn handle(&self, values: RequestValues, envelope: Envelope) -> DomainResult<()> {
        let data: ProjectDeletedData = envelope.data_as()?;
        self.service.delete_project_from_event(&values, data).await
    }
}
