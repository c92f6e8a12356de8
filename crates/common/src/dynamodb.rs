mod auth_info_repository;
mod client;
mod connection_repository;
mod item;
mod silo_config_repository;
mod tenant_repository;

pub use auth_info_repository::*;
pub use client::*;
pub use connection_repository::*;
pub use silo_config_repository::*;
pub use tenant_repository::*;
