//! Process plumbing around the adapter: configuration, server and startup errors.

mod config;
mod error;
mod server;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use server::{Listener, RuntimeServer};
