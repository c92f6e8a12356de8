mod error;
mod extract;
mod logging;
mod middleware;
mod server;

pub use error::*;
pub use extract::*;
pub use logging::*;
pub use middleware::*;
pub use server::*;
