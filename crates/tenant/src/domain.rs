mod auth_info_service;
mod silo_config_service;
mod tenant_service;

pub use auth_info_service::*;
pub use silo_config_service::*;
pub use tenant_service::*;
