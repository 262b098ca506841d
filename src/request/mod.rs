//! The materialized request handed to hooks and handlers.

mod negotiate;
mod query;
mod url;

pub use query::{Query, QueryValue};
pub use url::Url;

use crate::body::{self, Body, FieldStorage, FileStorage, Format, FormData, Payload};
use crate::http::{Bytes, Headers, Method};
use crate::wire::{Addr, Phase, Scope};
use crate::{Failure, Hooks};

use std::any::Any;
use std::fmt;

use http::Extensions;
use once_cell::sync::{Lazy, OnceCell};
use serde_json::{Map, Value};

static EMPTY_OBJECT: Lazy<Value> = Lazy::new(|| Value::Object(Map::new()));

/// One inbound call: scope metadata, headers and the materialized body.
///
/// A request is immutable once built, except for the fields the dispatcher and
/// hooks bind late: the matched route, the routing table that matched it, the
/// actor and the extensions.
pub struct Request {
    phase: Phase,
    method: Option<Method>,
    protocol: Option<String>,
    url: Url,
    server: Option<Addr>,
    remote_addr: Option<Addr>,
    headers: Headers,
    format: Option<Format>,
    charset: String,
    body: Result<Body, Failure>,
    query: OnceCell<Query>,
    route: Option<String>,
    itinerary: Option<usize>,
    actor: Option<Box<dyn Any + Send + Sync>>,
    extensions: Extensions,
}

impl Request {
    /// Build a request and run every `init_request` hook on it, in
    /// registration order.
    pub fn from_scope(
        scope: &Scope,
        headers: Headers,
        payload: Payload,
        hooks: &Hooks,
    ) -> Result<Request, Failure> {
        let url = Url::from_scope(scope, headers.get("Host"))?;

        let mut request = Request {
            phase: scope.phase,
            method: scope.method.clone(),
            protocol: scope.scheme.as_deref().map(str::to_ascii_uppercase),
            url,
            server: scope.server.clone(),
            remote_addr: scope.client.clone(),
            headers,
            format: payload.format,
            charset: payload.charset,
            body: payload.body,
            query: OnceCell::new(),
            route: None,
            itinerary: None,
            actor: None,
            extensions: Extensions::new(),
        };

        hooks.run_init(&mut request);
        Ok(request)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The upper-cased scheme, e.g. `HTTPS`.
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.url.scheme
    }

    pub fn host(&self) -> Option<&str> {
        self.url.hostname.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port
    }

    pub fn path(&self) -> &str {
        &self.url.path
    }

    pub fn query_string(&self) -> &str {
        &self.url.query
    }

    pub fn server(&self) -> Option<&Addr> {
        self.server.as_ref()
    }

    pub fn remote_addr(&self) -> Option<&Addr> {
        self.remote_addr.as_ref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The classification the body was decoded under.
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    /// The decoded body.
    ///
    /// Fails with [`Failure::MissingAttribute`] when decoding failed.
    pub fn body(&self) -> Result<&Body, Failure> {
        self.body
            .as_ref()
            .map_err(|_| Failure::MissingAttribute("body"))
    }

    pub fn body_mut(&mut self) -> Result<&mut Body, Failure> {
        self.body
            .as_mut()
            .map_err(|_| Failure::MissingAttribute("body"))
    }

    /// The decoded JSON body, or an empty object for any other body.
    pub fn json(&self) -> &Value {
        match (&self.body, self.is_json()) {
            (Ok(Body::Json(value)), true) => value,
            _ => &EMPTY_OBJECT,
        }
    }

    /// The XML document, or an empty one for any other body.
    pub fn xml(&self) -> &[u8] {
        match (&self.body, self.is_xml()) {
            (Ok(Body::Raw(bytes)), true) => &bytes[..],
            _ => &[],
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == Some(Format::Json)
    }

    pub fn is_xml(&self) -> bool {
        self.format == Some(Format::Xml)
    }

    /// Url-encoded and multipart bodies.
    pub fn is_form(&self) -> bool {
        self.format.map_or(false, Format::is_form)
    }

    /// The request was not classified at all.
    pub fn is_buffer(&self) -> bool {
        self.format.is_none()
    }

    pub fn is_exception(&self) -> bool {
        self.body.is_err()
    }

    pub fn exception(&self) -> Option<&Failure> {
        self.body.as_ref().err()
    }

    /// Mark the request as failed. The decoded body is dropped.
    pub fn set_exception(&mut self, failure: Failure) {
        self.body = Err(failure);
    }

    /// The decoded query string. Every key maps to a single value, or to all
    /// of its values in arrival order when it occurs more than once.
    pub fn query(&self) -> &Query {
        self.query.get_or_init(|| Query::parse(&self.url.query))
    }

    /// The multi-valued query view. It follows the same accumulation policy as
    /// [`query`](Self::query).
    pub fn m_query(&self) -> &Query {
        self.query()
    }

    /// Query pairs in order, with repeats.
    pub fn raw_query(&self) -> Vec<(String, String)> {
        query::parse_pairs(&self.url.query)
    }

    pub fn cookies(&self) -> Vec<(String, String)> {
        self.headers
            .get("Cookie")
            .map(query::parse_cookies)
            .unwrap_or_default()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// `Accept` entries with their quality, most preferred first.
    pub fn accept(&self) -> Vec<(String, f32)> {
        negotiate::quality_list(self.headers.get("Accept"))
    }

    pub fn accept_language(&self) -> Vec<(String, f32)> {
        negotiate::quality_list(self.headers.get("Accept-Language"))
    }

    pub fn accept_encoding(&self) -> Vec<(String, f32)> {
        negotiate::quality_list(self.headers.get("Accept-Encoding"))
    }

    /// The essence of `Content-Type`, lower-cased. Defaults to `text/html`.
    pub fn content_type(&self) -> String {
        self.headers
            .get("Content-Type")
            .and_then(|ct| ct.split(';').next())
            .map(|essence| essence.trim().to_ascii_lowercase())
            .filter(|essence| !essence.is_empty())
            .unwrap_or_else(|| "text/html".to_owned())
    }

    pub fn boundary(&self) -> Option<String> {
        body::boundary(self.headers.get("Content-Type")?)
    }

    /// The `charset=` parameter of `Content-Type`, if any.
    pub fn content_charset(&self) -> Option<String> {
        body::content_charset(self.headers.get("Content-Type")).map(str::to_ascii_lowercase)
    }

    /// The charset the body was decoded under.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// `None` for chunked requests or a missing/invalid `Content-Length`.
    pub fn content_length(&self) -> Option<u64> {
        let chunked = self
            .headers
            .get("Transfer-Encoding")
            .map_or(false, |te| te.eq_ignore_ascii_case("chunked"));
        if chunked {
            return None;
        }
        self.headers.get("Content-Length")?.trim().parse().ok()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get("User-Agent")
    }

    pub fn origin(&self) -> Option<&str> {
        self.headers.get("Origin")
    }

    /// The first segment of the path: `/api/users` -> `api`.
    pub fn prefix(&self) -> Option<&str> {
        self.url
            .path
            .strip_prefix('/')
            .and_then(|path| path.split('/').next())
            .filter(|segment| !segment.is_empty())
    }

    pub fn is_get(&self) -> bool {
        self.method == Some(Method::GET)
    }

    pub fn is_post(&self) -> bool {
        self.method == Some(Method::POST)
    }

    pub fn is_put(&self) -> bool {
        self.method == Some(Method::PUT)
    }

    pub fn is_delete(&self) -> bool {
        self.method == Some(Method::DELETE)
    }

    /// `https` or `wss`.
    pub fn is_secure(&self) -> bool {
        matches!(self.url.scheme.as_str(), "https" | "wss")
    }

    pub fn base_url(&self) -> String {
        self.url.base_url()
    }

    pub fn host_url(&self) -> String {
        self.url.host_url()
    }

    /// The decoded form, when the body is one.
    pub fn form(&self) -> Option<&FormData> {
        match &self.body {
            Ok(Body::Form(form)) if self.is_form() => Some(form),
            _ => None,
        }
    }

    /// Every non-file form field.
    pub fn forms(&self) -> Vec<&FieldStorage> {
        self.form().map(|form| form.fields().collect()).unwrap_or_default()
    }

    /// Every uploaded file.
    pub fn files(&self) -> Vec<&FileStorage> {
        self.form().map(|form| form.files().collect()).unwrap_or_default()
    }

    pub fn files_mut(&mut self) -> Vec<&mut FileStorage> {
        let is_form = self.is_form();
        match &mut self.body {
            Ok(Body::Form(form)) if is_form => form.files_mut().collect(),
            _ => Vec::new(),
        }
    }

    /// The raw body of an unclassified request.
    pub fn buffer(&self) -> Option<&Bytes> {
        match &self.body {
            Ok(Body::Raw(bytes)) if self.is_buffer() => Some(bytes),
            _ => None,
        }
    }

    /// The pattern of the matched route.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Index of the routing table that matched.
    pub fn itinerary(&self) -> Option<usize> {
        self.itinerary
    }

    pub(crate) fn bind_route(&mut self, pattern: String, itinerary: usize) {
        self.route = Some(pattern);
        self.itinerary = Some(itinerary);
    }

    /// Attach the acting principal, usually from an `init_request` or
    /// `before_request` hook.
    pub fn set_actor<T>(&mut self, actor: T)
    where
        T: Any + Send + Sync,
    {
        self.actor = Some(Box::new(actor));
    }

    pub fn actor<T>(&self) -> Option<&T>
    where
        T: Any,
    {
        self.actor.as_deref()?.downcast_ref()
    }

    pub fn has_actor(&self) -> bool {
        self.actor.is_some()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("phase", &self.phase)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("format", &self.format)
            .field("body", &self.body)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}
