use crate::handler::{BoxHandler, Handler};
use crate::http::{Method, Response, StatusCode};
use crate::{Failure, Reply, Request};

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use matchit::InsertError;

/// Path parameters captured by a route pattern.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Params(pub(crate) Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A route-level hook, run on the request after its route is bound. A reply
/// short-circuits the handler; a failure goes to the error path.
pub type RouteHook = Arc<dyn Fn(&mut Request) -> Result<Option<Reply>, Failure> + Send + Sync>;

/// Rewrites an error response.
pub type ErrorHandler = Arc<dyn Fn(Response, Option<&Request>) -> Response + Send + Sync>;

/// Post-processes a served static file.
pub type MountHandler = Arc<dyn Fn(Response, &Request) -> Response + Send + Sync>;

/// What a matched route resolves to.
#[derive(Clone)]
pub enum Target {
    Handler(BoxHandler),
    /// Answer with a `302` to this location.
    Redirect(String),
}

/// A successful route lookup.
#[derive(Clone)]
pub struct RouteMatch {
    pub target: Target,
    pub params: Params,
    /// The pattern that matched, e.g. `/users/:id`.
    pub pattern: String,
    pub before_request: Vec<RouteHook>,
}

/// A directory served under a path prefix.
#[derive(Clone)]
pub struct StaticMount {
    pub prefix: String,
    pub directory: PathBuf,
    pub handler: Option<MountHandler>,
}

impl StaticMount {
    pub fn new(prefix: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        StaticMount {
            prefix: prefix.into(),
            directory: directory.into(),
            handler: None,
        }
    }

    /// `/static` covers `/static` and `/static/...` but not `/staticky`.
    pub fn covers(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        match path.strip_prefix(prefix) {
            Some(rest) => prefix.is_empty() || rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The part of `path` below the mount prefix.
    pub fn relative<'p>(&self, path: &'p str) -> &'p str {
        path.strip_prefix(self.prefix.trim_end_matches('/'))
            .unwrap_or(path)
            .trim_start_matches('/')
    }
}

impl fmt::Debug for StaticMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticMount")
            .field("prefix", &self.prefix)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

/// A routing table.
///
/// The gateway queries its tables in registration order; the first table that
/// matches owns the call, including its response post-processing.
pub trait Itinerary: Send + Sync {
    fn route(&self, req: &Request) -> Option<RouteMatch>;

    fn static_mount(&self, _req: &Request) -> Option<StaticMount> {
        None
    }

    fn error_handler(&self, _res: &Response) -> Option<ErrorHandler> {
        None
    }

    fn modify_response(&self, res: Response) -> Response {
        res
    }
}

struct Endpoint {
    target: Target,
    pattern: String,
}

/// A routing table backed by a radix tree per method.
///
/// ```
/// use asgate::{BoxFuture, Failure, Params, Request, Routes};
///
/// fn user(_: &mut Request, params: Params) -> BoxFuture<'_, Result<String, Failure>> {
///     Box::pin(async move { Ok(format!("user {}", params.get("id").unwrap_or_default())) })
/// }
///
/// let routes = Routes::new()
///     .get("/users/:id", user)?
///     .redirect("/old", "/users/1")?
///     .static_files("/assets", "./public");
/// # Ok::<(), asgate::InsertError>(())
/// ```
#[derive(Default)]
pub struct Routes {
    routes: HashMap<Method, matchit::Router<Endpoint>>,
    statics: Vec<StaticMount>,
    error_handlers: Vec<(StatusCode, ErrorHandler)>,
    before_request: Vec<RouteHook>,
    modify_response: Option<Arc<dyn Fn(Response) -> Response + Send + Sync>>,
}

macro_rules! insert_route {
    ($($name:ident => $method:ident),* $(,)?) => { $(
        pub fn $name<H>(self, path: impl Into<String>, handler: H) -> Result<Self, InsertError>
        where
            H: Handler,
        {
            self.route(Method::$method, path, handler)
        })*
    };
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    insert_route! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
    }

    pub fn route<H>(self, method: Method, path: impl Into<String>, handler: H) -> Result<Self, InsertError>
    where
        H: Handler,
    {
        let handler: BoxHandler = Arc::new(handler);
        self.insert(method, path.into(), Target::Handler(handler))
    }

    /// Answer `GET path` with a redirect to `location`.
    pub fn redirect(self, path: impl Into<String>, location: impl Into<String>) -> Result<Self, InsertError> {
        self.insert(Method::GET, path.into(), Target::Redirect(location.into()))
    }

    /// Serve files from `directory` under `prefix`.
    pub fn static_files(mut self, prefix: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        self.statics.push(StaticMount::new(prefix, directory));
        self
    }

    /// Serve files from `directory` under `prefix`, passing every served
    /// response through `handler`.
    pub fn static_files_with<F>(mut self, prefix: impl Into<String>, directory: impl Into<PathBuf>, handler: F) -> Self
    where
        F: Fn(Response, &Request) -> Response + Send + Sync + 'static,
    {
        let handler: MountHandler = Arc::new(handler);
        let mut mount = StaticMount::new(prefix, directory);
        mount.handler = Some(handler);
        self.statics.push(mount);
        self
    }

    /// Rewrite error responses with the given status.
    pub fn error_handler<F>(mut self, status: StatusCode, handler: F) -> Self
    where
        F: Fn(Response, Option<&Request>) -> Response + Send + Sync + 'static,
    {
        let handler: ErrorHandler = Arc::new(handler);
        self.error_handlers.push((status, handler));
        self
    }

    /// Run `hook` on every request this table routes.
    pub fn before_request<F, R>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) -> Result<Option<R>, Failure> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.before_request.push(Arc::new(
            move |req: &mut Request| -> Result<Option<Reply>, Failure> { Ok(hook(req)?.map(Into::into)) },
        ));
        self
    }

    /// Transform every response produced by this table's handlers.
    pub fn modify_response<F>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Response + Send + Sync + 'static,
    {
        self.modify_response = Some(Arc::new(f));
        self
    }

    fn insert(mut self, method: Method, pattern: String, target: Target) -> Result<Self, InsertError> {
        let endpoint = Endpoint {
            target,
            pattern: pattern.clone(),
        };
        self.routes
            .entry(method)
            .or_insert_with(matchit::Router::new)
            .insert(pattern, endpoint)?;
        Ok(self)
    }
}

impl Itinerary for Routes {
    fn route(&self, req: &Request) -> Option<RouteMatch> {
        let router = self.routes.get(req.method()?)?;
        let matched = router.at(req.path()).ok()?;

        Some(RouteMatch {
            target: matched.value.target.clone(),
            params: matched.params.iter().collect(),
            pattern: matched.value.pattern.clone(),
            before_request: self.before_request.clone(),
        })
    }

    fn static_mount(&self, req: &Request) -> Option<StaticMount> {
        self.statics
            .iter()
            .find(|mount| mount.covers(req.path()))
            .cloned()
    }

    fn error_handler(&self, res: &Response) -> Option<ErrorHandler> {
        self.error_handlers
            .iter()
            .find(|(status, _)| *status == res.status)
            .map(|(_, handler)| handler.clone())
    }

    fn modify_response(&self, res: Response) -> Response {
        match &self.modify_response {
            Some(modify) => modify(res),
            None => res,
        }
    }
}
