mod auth_info_handler;

pub use auth_info_handler::*;
