mod domain;
mod http;
mod nats;
mod postgres;
mod projects;

pub use domain::*;
pub use http::*;
pub use nats::*;
pub use postgres::*;
pub use projects::*;
