//! Header maps and responses as seen by handlers.

mod headers;
mod response;

pub use headers::Headers;
pub use response::Response;

pub use bytes::Bytes;
pub use http::{Method, StatusCode};
