use crate::{
    project_routes, MembershipCreatedHandler, MembershipDeletedHandler, MembershipRepository,
    MembershipService, MembershipUpdatedHandler, ProjectCreatedHandler, ProjectDeletedHandler,
    ProjectRepository, ProjectService, ProjectState, ProjectUpdatedHandler,
};
use axum::Router;
use common::http::AuthState;
use common::nats::{EnvelopeHandler, ListenBinding};
use std::sync::Arc;
use tracing::debug;

/// Project module: tenant-scoped replicas of projects and memberships.
pub struct Projects {
    project_service: Arc<ProjectService>,
    membership_service: Arc<MembershipService>,
    auth: AuthState,
}

impl Projects {
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        membership_repository: Arc<dyn MembershipRepository>,
        auth: AuthState,
    ) -> Self {
        debug!("initializing project module");

        Self {
            project_service: Arc::new(ProjectService::new(project_repository)),
            membership_service: Arc::new(MembershipService::new(membership_repository)),
            auth,
        }
    }

    pub fn router(&self) -> Router {
        project_routes(
            ProjectState {
                service: Arc::clone(&self.project_service),
            },
            self.auth.clone(),
        )
    }

    pub fn listeners(&self) -> Vec<(ListenBinding, Arc<dyn EnvelopeHandler>)> {
        let projects = &self.project_service;
        let memberships = &self.membership_service;

        vec![
            (
                ProjectCreatedHandler::binding(),
                Arc::new(ProjectCreatedHandler::new(Arc::clone(projects))),
            ),
            (
                ProjectUpdatedHandler::binding(),
                Arc::new(ProjectUpdatedHandler::new(Arc::clone(projects))),
            ),
            (
                ProjectDeletedHandler::binding(),
                Arc::new(ProjectDeletedHandler::new(Arc::clone(projects))),
            ),
            (
                MembershipCreatedHandler::binding(),
                Arc::new(MembershipCreatedHandler::new(Arc::clone(memberships))),
            ),
            (
                MembershipUpdatedHandler::binding(),
                Arc::new(MembershipUpdatedHandler::new(Arc::clone(memberships))),
            ),
            (
                MembershipDeletedHandler::binding(),
                Arc::new(MembershipDeletedHandler::new(Arc::clone(memberships))),
            ),
        ]
    }
}
