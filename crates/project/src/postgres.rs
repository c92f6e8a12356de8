mod membership_repository;
mod migrations;
mod project_repository;

pub use membership_repository::*;
pub use migrations::*;
pub use project_repository::*;
