mod claims;
mod config;
mod context;
mod jwks;
mod traits;

pub use claims::*;
pub use config::*;
pub use context::*;
pub use jwks::*;
pub use traits::*;
