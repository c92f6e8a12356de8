mod identity_service;
mod new_tenant;
mod registration_service;

pub use identity_service::*;
pub use new_tenant::*;
pub use registration_service::*;
