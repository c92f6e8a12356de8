mod client;
mod envelope_publisher;
mod listen;
mod middleware;
mod trace_context;
mod tower_consumer;
mod traits;

pub use client::*;
pub use envelope_publisher::*;
pub use listen::*;
pub use middleware::*;
pub use trace_context::*;
pub use tower_consumer::*;
pub use traits::*;
