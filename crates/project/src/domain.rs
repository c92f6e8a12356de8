mod event_scope;
mod membership;
mod membership_service;
mod project;
mod project_service;

pub use event_scope::*;
pub use membership::*;
pub use membership_service::*;
pub use project::*;
pub use project_service::*;
