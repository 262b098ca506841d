use crate::error::ErrorReport;
use crate::http::{Method, Response, StatusCode};
use crate::router::{Itinerary, Target};
use crate::transport::{AsgiTransport, Transport};
use crate::wire::{Emit, Phase, Receive, Scope};
use crate::{statics, Config, Failure, Hooks, Request};

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use serde_json::json;
use tracing::Instrument;

/// Builds the response for a failed call.
pub trait ErrorResponder: Send + Sync {
    fn respond(&self, report: &ErrorReport, req: Option<&Request>) -> Response;
}

impl<F> ErrorResponder for F
where
    F: Fn(&ErrorReport, Option<&Request>) -> Response + Send + Sync,
{
    fn respond(&self, report: &ErrorReport, req: Option<&Request>) -> Response {
        self(report, req)
    }
}

/// The dispatcher: runs hooks, resolves routes, invokes handlers and sends
/// every outcome, including failures, back through the transport.
///
/// ```no_run
/// use asgate::{Gateway, Hooks, Inbound, Method, Outbound, Routes, Scope};
/// use std::collections::VecDeque;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::new()
///     .hooks(Hooks::new())
///     .itinerary(Routes::new().static_files("/assets", "./public"));
///
/// let receive = VecDeque::from([Inbound::body("")]);
/// let mut sent: Vec<Outbound> = Vec::new();
/// gateway.serve(Scope::http(Method::GET, "/assets/app.js"), receive, &mut sent).await?;
/// # Ok(())
/// # }
/// ```
pub struct Gateway {
    hooks: Arc<Hooks>,
    itineraries: Vec<Arc<dyn Itinerary>>,
    error_responder: Option<Arc<dyn ErrorResponder>>,
    config: Arc<Config>,
}

impl Gateway {
    pub fn new() -> Self {
        Gateway {
            hooks: Arc::new(Hooks::new()),
            itineraries: Vec::new(),
            error_responder: None,
            config: Arc::new(Config::new()),
        }
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Add a routing table. Tables are queried in the order they are added.
    pub fn itinerary<I>(mut self, itinerary: I) -> Self
    where
        I: Itinerary + 'static,
    {
        self.itineraries.push(Arc::new(itinerary));
        self
    }

    /// Replace the default JSON error response.
    pub fn error_responder<E>(mut self, responder: E) -> Self
    where
        E: ErrorResponder + 'static,
    {
        self.error_responder = Some(Arc::new(responder));
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Serve one connection over the given channel pair.
    pub async fn serve<R, E>(&self, scope: Scope, receive: R, emit: E) -> Result<(), Failure>
    where
        R: Receive,
        E: Emit,
    {
        let mut transport =
            AsgiTransport::new(scope, receive, emit, self.hooks.clone(), self.config.clone());
        self.execute(&mut transport).await
    }

    /// Drive a connection to completion according to its phase.
    ///
    /// The returned error is a failure that could not be delivered to the
    /// client: a transport failure, or an unsupported phase.
    pub async fn execute<T>(&self, transport: &mut T) -> Result<(), Failure>
    where
        T: Transport + ?Sized,
    {
        match transport.phase() {
            Phase::Lifespan => transport.lifespan().await,
            Phase::Http => self.http(transport).await,
            phase => {
                tracing::error!(%phase, "unsupported connection phase");
                Err(Failure::UnsupportedPhase(phase))
            }
        }
    }

    async fn http<T>(&self, transport: &mut T) -> Result<(), Failure>
    where
        T: Transport + ?Sized,
    {
        let built = AssertUnwindSafe(transport.make_request())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panicked("init_request hook", &*panic)));
        let mut req = match built {
            Ok(req) => req,
            Err(err) => return self.send_error(transport, &err, None).await,
        };

        let span = tracing::debug_span!(
            "request",
            method = %req.method().map(Method::as_str).unwrap_or("-"),
            path = %req.path(),
        );

        async move {
            if let Some(failure) = req.exception() {
                tracing::warn!(error = %failure, "request body failed to materialize");
                return self.send_error(transport, failure, Some(&req)).await;
            }

            if req.method() == Some(&Method::OPTIONS) {
                tracing::debug!("answering OPTIONS");
                return self.respond(transport, Response::new(StatusCode::NO_CONTENT), &req).await;
            }

            let dispatched = AssertUnwindSafe(self.dispatch(&mut req))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(panicked("dispatch", &*panic)));

            match dispatched {
                Ok(response) => {
                    tracing::debug!(status = response.status.as_u16(), "sending response");
                    self.respond(transport, response, &req).await
                }
                Err(err) => self.send_error(transport, &err, Some(&req)).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, req: &mut Request) -> Result<Response, Failure> {
        for itinerary in &self.itineraries {
            if let Some(mount) = itinerary.static_mount(req) {
                return statics::serve(&mount, req).await;
            }
        }

        if let Some(reply) = self.hooks.run_before_request(req)? {
            tracing::debug!("before_request hook answered");
            return reply.normalize();
        }

        let (index, matched) = self
            .itineraries
            .iter()
            .enumerate()
            .find_map(|(index, itinerary)| itinerary.route(req).map(|matched| (index, matched)))
            .ok_or_else(|| {
                Failure::NotFound(format!(
                    "no route for {} {}",
                    req.method().map(Method::as_str).unwrap_or("-"),
                    req.path()
                ))
            })?;
        let owner = &self.itineraries[index];

        tracing::debug!(route = %matched.pattern, itinerary = index, "route matched");
        req.bind_route(matched.pattern, index);

        for hook in &matched.before_request {
            if let Some(reply) = hook(&mut *req)? {
                return Ok(owner.modify_response(reply.normalize()?));
            }
        }

        let response = match matched.target {
            Target::Redirect(location) => Response::redirect(location),
            Target::Handler(handler) => handler.call(req, matched.params).await?.normalize()?,
        };

        Ok(owner.modify_response(response))
    }

    /// Emit a successful response. A panicking `before_response` hook turns
    /// it into an error response.
    async fn respond<T>(&self, transport: &mut T, response: Response, req: &Request) -> Result<(), Failure>
    where
        T: Transport + ?Sized,
    {
        let sent = AssertUnwindSafe(transport.make_response(response))
            .catch_unwind()
            .await;
        match sent {
            Ok(sent) => sent,
            Err(panic) => {
                let err = panicked("before_response hook", &*panic);
                self.send_error(transport, &err, Some(req)).await
            }
        }
    }

    async fn send_error<T>(&self, transport: &mut T, failure: &Failure, req: Option<&Request>) -> Result<(), Failure>
    where
        T: Transport + ?Sized,
    {
        let report = failure.report();
        tracing::error!(status = report.status.as_u16(), reason = %report.reason, "sending error response");

        let response = panic::catch_unwind(AssertUnwindSafe(|| self.render_error(&report, req)))
            .unwrap_or_else(|panic| {
                let err = panicked("error handler", &*panic);
                self.default_error(&err.report())
            });

        AssertUnwindSafe(transport.make_response(response))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(panicked("before_response hook", &*panic)))
    }

    fn render_error(&self, report: &ErrorReport, req: Option<&Request>) -> Response {
        let response = match &self.error_responder {
            Some(responder) => responder.respond(report, req),
            None => self.default_error(report),
        };

        let handler = self
            .itineraries
            .iter()
            .find_map(|itinerary| itinerary.error_handler(&response));
        match handler {
            Some(handler) => handler(response, req),
            None => response,
        }
    }

    fn default_error(&self, report: &ErrorReport) -> Response {
        let mut body = json!({
            "status": report.status.as_u16(),
            "reason": report.reason,
            "body": report.body,
        });
        if self.config.expose_trace {
            body["trace"] = json!(report.trace);
        }

        match Response::json(&body) {
            Ok(response) => response.status(report.status),
            Err(_) => Response::new(report.status),
        }
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("hooks", &self.hooks)
            .field("itineraries", &self.itineraries.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A panic caught at `stage`, as a `500` application failure.
fn panicked(stage: &str, panic: &(dyn Any + Send)) -> Failure {
    let reason = if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        format!("{} panicked", stage)
    };
    tracing::error!(%stage, %reason, "panic during call");
    Failure::application(StatusCode::INTERNAL_SERVER_ERROR, reason)
}
