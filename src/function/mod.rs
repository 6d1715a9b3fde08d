//! The handler contract and the adapter that drives it.

pub mod adapter;
pub mod handler;

pub use adapter::Adapter;
pub use handler::{blocking, Blocking, Context, Handler, HandlerError, CONTRACT_VERSION};
