use crate::bounded::BoxFuture;
use crate::http::Response;
use crate::{Failure, Reply, Request};

use std::fmt;
use std::future::Future;

type InitHook = Box<dyn Fn(&mut Request) + Send + Sync>;
type BeforeRequestHook = Box<dyn Fn(&Request) -> Result<Option<Reply>, Failure> + Send + Sync>;
type BeforeResponseHook = Box<dyn Fn(Response) -> Response + Send + Sync>;
type LifespanHook = Box<dyn Fn() -> BoxFuture<'static, Result<(), Failure>> + Send + Sync>;

/// The points in a call where hooks run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Event {
    InitRequest,
    BeforeRequest,
    BeforeResponse,
    Startup,
    Shutdown,
}

/// A registry of lifecycle hooks.
///
/// Hooks are registered by value before serving and run in registration
/// order. Once handed to a [`Gateway`](crate::Gateway) the registry is shared
/// read-only.
///
/// ```
/// use asgate::{Hooks, Event};
///
/// let hooks = Hooks::new()
///     .init_request(|req| req.set_actor("anonymous"))
///     .before_response(|res| res.header("X-Served-By", "asgate"));
///
/// assert_eq!(hooks.len(Event::InitRequest), 1);
/// ```
#[derive(Default)]
pub struct Hooks {
    init_request: Vec<InitHook>,
    before_request: Vec<BeforeRequestHook>,
    before_response: Vec<BeforeResponseHook>,
    startup: Vec<LifespanHook>,
    shutdown: Vec<LifespanHook>,
}

impl Hooks {
    pub fn new() -> Hooks {
        Hooks::default()
    }

    /// Runs on every request right after it is built.
    pub fn init_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        self.init_request.push(Box::new(hook));
        self
    }

    /// Runs before routing. The first hook that returns a reply
    /// short-circuits the call with it; a failure is answered like any other.
    pub fn before_request<F, R>(mut self, hook: F) -> Self
    where
        F: Fn(&Request) -> Result<Option<R>, Failure> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.before_request.push(Box::new(
            move |req: &Request| -> Result<Option<Reply>, Failure> { Ok(hook(req)?.map(Into::into)) },
        ));
        self
    }

    /// Runs on every http response before it is emitted. Each hook may
    /// replace the response.
    pub fn before_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.before_response.push(Box::new(hook));
        self
    }

    /// Runs on `lifespan.startup`.
    pub fn on_startup<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Failure>> + Send + 'static,
    {
        self.startup.push(Box::new(
            move || -> BoxFuture<'static, Result<(), Failure>> { Box::pin(hook()) },
        ));
        self
    }

    /// Runs on `lifespan.shutdown`.
    pub fn on_shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Failure>> + Send + 'static,
    {
        self.shutdown.push(Box::new(
            move || -> BoxFuture<'static, Result<(), Failure>> { Box::pin(hook()) },
        ));
        self
    }

    /// Number of hooks registered for `event`.
    pub fn len(&self, event: Event) -> usize {
        match event {
            Event::InitRequest => self.init_request.len(),
            Event::BeforeRequest => self.before_request.len(),
            Event::BeforeResponse => self.before_response.len(),
            Event::Startup => self.startup.len(),
            Event::Shutdown => self.shutdown.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        [
            Event::InitRequest,
            Event::BeforeRequest,
            Event::BeforeResponse,
            Event::Startup,
            Event::Shutdown,
        ]
        .into_iter()
        .all(|event| self.len(event) == 0)
    }

    pub(crate) fn run_init(&self, req: &mut Request) {
        for hook in &self.init_request {
            hook(req);
        }
    }

    pub(crate) fn run_before_request(&self, req: &Request) -> Result<Option<Reply>, Failure> {
        for hook in &self.before_request {
            if let Some(reply) = hook(req)? {
                return Ok(Some(reply));
            }
        }
        Ok(None)
    }

    pub(crate) fn run_before_response(&self, response: Response) -> Response {
        self.before_response
            .iter()
            .fold(response, |response, hook| hook(response))
    }

    pub(crate) async fn run_startup(&self) -> Result<(), Failure> {
        for hook in &self.startup {
            hook().await?;
        }
        Ok(())
    }

    pub(crate) async fn run_shutdown(&self) -> Result<(), Failure> {
        for hook in &self.shutdown {
            hook().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("init_request", &self.init_request.len())
            .field("before_request", &self.before_request.len())
            .field("before_response", &self.before_response.len())
            .field("startup", &self.startup.len())
            .field("shutdown", &self.shutdown.len())
            .finish()
    }
}
