mod domain;
mod http;
mod nats;
mod tenant;

pub use domain::*;
pub use http::*;
pub use nats::*;
pub use tenant::*;
