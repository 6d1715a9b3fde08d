//! Handler-facing HTTP contract: the normalized [`Event`] and the handler's [`Response`].

mod request;
mod response;

pub use request::{Event, QueryMap};
pub use response::Response;
