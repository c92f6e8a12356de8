mod membership_handlers;
mod project_handlers;

pub use membership_handlers::*;
pub use project_handlers::*;
