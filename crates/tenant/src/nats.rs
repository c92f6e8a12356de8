mod tenant_registered_handler;
mod tenant_siloed_handler;

pub use tenant_registered_handler::*;
pub use tenant_siloed_handler::*;
