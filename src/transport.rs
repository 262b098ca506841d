use crate::body::materialize;
use crate::bounded::async_trait;
use crate::http::{Bytes, Headers, Method, Response, StatusCode};
use crate::wire::{Emit, Inbound, Outbound, Phase, Receive, Scope};
use crate::{Config, Failure, Hooks, Request};

use std::sync::Arc;

/// Bridges one connection's wire messages to requests and responses.
#[async_trait]
pub trait Transport: Send {
    /// The phase of the connection, fixed for its whole duration.
    fn phase(&self) -> Phase;

    /// Receive the body and build the request.
    async fn make_request(&mut self) -> Result<Request, Failure>;

    /// Emit a response.
    async fn make_response(&mut self, response: Response) -> Result<(), Failure>;

    /// Answer lifespan messages until shutdown or until the channel closes.
    async fn lifespan(&mut self) -> Result<(), Failure>;
}

/// The ASGI transport: a scope plus a receive/emit channel pair.
pub struct AsgiTransport<R, E> {
    scope: Scope,
    receive: R,
    emit: E,
    hooks: Arc<Hooks>,
    config: Arc<Config>,
}

impl<R, E> AsgiTransport<R, E>
where
    R: Receive,
    E: Emit,
{
    pub fn new(scope: Scope, receive: R, emit: E, hooks: Arc<Hooks>, config: Arc<Config>) -> Self {
        AsgiTransport {
            scope,
            receive,
            emit,
            hooks,
            config,
        }
    }

    async fn send(&mut self, message: Outbound) -> Result<(), Failure> {
        let kind = message.kind();
        self.emit.emit(message).await.map_err(|err| {
            let failure = Failure::transport(err);
            tracing::error!(kind, error = %failure, "failed to emit message");
            failure
        })
    }

    async fn http_response(&mut self, response: Response) -> Result<(), Failure> {
        let response = self.hooks.run_before_response(response);

        let (status, body) = if self.scope.method == Some(Method::OPTIONS) {
            (StatusCode::NO_CONTENT, Bytes::new())
        } else {
            (response.status, response.body)
        };

        let headers = response
            .headers
            .into_iter()
            .map(|(name, value)| (Bytes::from(name.to_ascii_lowercase()), Bytes::from(value)))
            .collect();

        self.send(Outbound::ResponseStart { status, headers }).await?;
        self.send(Outbound::ResponseBody {
            body,
            more_body: false,
        })
        .await
    }
}

#[async_trait]
impl<R, E> Transport for AsgiTransport<R, E>
where
    R: Receive,
    E: Emit,
{
    fn phase(&self) -> Phase {
        self.scope.phase
    }

    async fn make_request(&mut self) -> Result<Request, Failure> {
        if self.scope.phase != Phase::Http {
            return Err(Failure::UnsupportedPhase(self.scope.phase));
        }

        let headers = Headers::from_raw(&self.scope.headers);
        let payload = materialize(&headers, &mut self.receive, &self.config).await;
        Request::from_scope(&self.scope, headers, payload, &self.hooks)
    }

    async fn make_response(&mut self, response: Response) -> Result<(), Failure> {
        match self.scope.phase {
            Phase::Http => self.http_response(response).await,
            phase => Err(Failure::UnsupportedPhase(phase)),
        }
    }

    async fn lifespan(&mut self) -> Result<(), Failure> {
        if self.scope.phase != Phase::Lifespan {
            return Err(Failure::UnsupportedPhase(self.scope.phase));
        }

        while let Some(message) = self.receive.receive().await {
            match message {
                Inbound::Startup => {
                    tracing::debug!("lifespan startup");
                    let reply = match self.hooks.run_startup().await {
                        Ok(()) => Outbound::StartupComplete,
                        Err(err) => {
                            tracing::warn!(error = %err, "startup hook failed");
                            Outbound::StartupFailed {
                                message: err.to_string(),
                            }
                        }
                    };
                    self.send(reply).await?;
                }
                Inbound::Shutdown => {
                    tracing::debug!("lifespan shutdown");
                    let reply = match self.hooks.run_shutdown().await {
                        Ok(()) => Outbound::ShutdownComplete,
                        Err(err) => {
                            tracing::warn!(error = %err, "shutdown hook failed");
                            Outbound::ShutdownFailed {
                                message: err.to_string(),
                            }
                        }
                    };
                    return self.send(reply).await;
                }
                other => {
                    tracing::debug!(kind = other.kind(), "ignoring message in lifespan phase");
                }
            }
        }

        Ok(())
    }
}
