//! An ASGI-style gateway engine.
//!
//! A [`Gateway`] takes the [`Scope`] of a connection and a receive/emit channel
//! pair. It materializes the request body, runs hooks, resolves a route through
//! its routing tables, invokes the handler and emits the response. Failures at
//! any step end up as an error response on the same channel.

mod bounded;
mod config;
mod error;
mod gateway;
mod handler;
mod hooks;
mod reply;
mod router;
mod statics;
mod transport;

pub mod body;
pub mod http;
pub mod request;
pub mod wire;

pub use async_trait::async_trait;
pub use bounded::{BoxError, BoxFuture, BoxStream};
pub use config::Config;
pub use error::{ErrorReport, Failure};
pub use gateway::{ErrorResponder, Gateway};
pub use handler::{BoxHandler, Handler};
pub use hooks::{Event, Hooks};
pub use reply::Reply;
pub use request::Request;
pub use router::{
    ErrorHandler, InsertError, Itinerary, MountHandler, Params, RouteHook, RouteMatch, Routes,
    StaticMount, Target,
};
pub use transport::{AsgiTransport, Transport};

pub use crate::http::{Bytes, Headers, Method, Response, StatusCode};
pub use wire::{Addr, Emit, Inbound, Outbound, Phase, Receive, Scope, StreamReceiver};
