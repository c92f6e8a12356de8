mod auth_info;
mod envelope;
mod identity;
mod publisher;
mod request_values;
mod result;
mod tenant;

pub use auth_info::*;
pub use envelope::*;
pub use identity::*;
pub use publisher::*;
pub use request_values::*;
pub use result::*;
pub use tenant::*;
