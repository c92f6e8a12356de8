mod client;
mod config;
mod migrations;

pub use client::*;
pub use config::*;
pub use migrations::*;
