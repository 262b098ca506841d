use crate::bounded::BoxFuture;
use crate::router::Params;
use crate::{Failure, Reply, Request};

use std::sync::Arc;

/// An asynchronous request handler.
///
/// This trait is implemented for functions of the form
/// `fn(&mut Request, Params) -> BoxFuture<'_, Result<impl Into<Reply>, Failure>>`:
///
/// ```
/// use asgate::{BoxFuture, Failure, Params, Request};
///
/// fn hello(_: &mut Request, params: Params) -> BoxFuture<'_, Result<String, Failure>> {
///     Box::pin(async move {
///         Ok(format!("Hello {}!", params.get("name").unwrap_or("world")))
///     })
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call<'r>(&'r self, req: &'r mut Request, params: Params) -> BoxFuture<'r, Result<Reply, Failure>>;
}

impl<F, R> Handler for F
where
    F: for<'r> Fn(&'r mut Request, Params) -> BoxFuture<'r, Result<R, Failure>>
        + Send
        + Sync
        + 'static,
    R: Into<Reply> + 'static,
{
    fn call<'r>(&'r self, req: &'r mut Request, params: Params) -> BoxFuture<'r, Result<Reply, Failure>> {
        // the handler body runs inside the future, so a panic in it surfaces on poll
        Box::pin(async move { (self)(req, params).await.map(Into::into) })
    }
}

/// A type-erased, shareable handler.
pub type BoxHandler = Arc<dyn Handler>;
