mod domain;
mod http;
mod registration;

pub use domain::*;
pub use http::*;
pub use registration::*;
