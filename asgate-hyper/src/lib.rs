//! Serve an [`asgate::Gateway`] with hyper.

use std::convert::Infallible;
use std::future::{ready, Future, Ready};
use std::io;
use std::net::*;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use asgate::{Addr, Bytes, Gateway, Inbound, Method, Outbound, Scope, StreamReceiver};
use futures::stream::{self, StreamExt};
use hyper::header::{HeaderName, HeaderValue};
use hyper::server::conn::{AddrIncoming, AddrStream};
use hyper::service::Service;

pub use hyper::Server;

pub trait Serve {
    fn serve(self, addr: impl ToSocketAddr) -> io::Result<Server<AddrIncoming, GatewayMakeService>>;
    fn into_make_service(self) -> GatewayMakeService;
    fn into_service(self) -> GatewayService;
}

impl Serve for Gateway {
    fn serve(self, addr: impl ToSocketAddr) -> io::Result<Server<AddrIncoming, GatewayMakeService>> {
        let addr = addr.to_socket_addr()?;
        let builder = hyper::Server::try_bind(&addr).map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        tracing::debug!(%addr, "listening");
        Ok(builder.serve(self.into_make_service()))
    }

    fn into_make_service(self) -> GatewayMakeService {
        GatewayMakeService {
            service: self.into_service(),
        }
    }

    fn into_service(self) -> GatewayService {
        GatewayService {
            gateway: Arc::new(self),
            remote: None,
        }
    }
}

pub struct GatewayMakeService {
    service: GatewayService,
}

impl<'a> Service<&'a AddrStream> for GatewayMakeService {
    type Response = GatewayService;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Infallible>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, conn: &'a AddrStream) -> Self::Future {
        let mut service = self.service.clone();
        service.remote = Some(conn.remote_addr());
        ready(Ok(service))
    }
}

pub struct GatewayService {
    gateway: Arc<Gateway>,
    remote: Option<SocketAddr>,
}

impl Service<hyper::Request<hyper::Body>> for GatewayService {
    type Response = hyper::Response<hyper::Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: hyper::Request<hyper::Body>) -> Self::Future {
        let (parts, body) = req.into_parts();
        let gateway = self.gateway.clone();
        let scope = scope(&parts, self.remote);

        Box::pin(async move {
            let scope = match scope {
                Some(scope) => scope,
                None => return Ok(status(hyper::StatusCode::BAD_REQUEST)),
            };

            let receive = StreamReceiver::boxed(
                body.map(|chunk| match chunk {
                    Ok(chunk) => Inbound::chunk(chunk),
                    Err(err) => {
                        tracing::warn!(error = %err, "request body stream failed");
                        Inbound::Disconnect
                    }
                })
                .chain(stream::once(ready(Inbound::body(Bytes::new())))),
            );

            let mut sent = Vec::new();
            if let Err(err) = Gateway::serve(&gateway, scope, receive, &mut sent).await {
                tracing::error!(error = %err, "gateway failed to answer");
            }

            Ok(response(sent))
        })
    }
}

impl Clone for GatewayService {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            remote: self.remote,
        }
    }
}

fn scope(parts: &hyper::http::request::Parts, remote: Option<SocketAddr>) -> Option<Scope> {
    let method = Method::from_bytes(parts.method.as_str().as_bytes()).ok()?;

    let mut scope = Scope::http(method, parts.uri.path())
        .scheme(parts.uri.scheme_str().unwrap_or("http"))
        .query(parts.uri.query().unwrap_or_default().to_owned());

    scope.http_version = match parts.version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_owned();

    if !parts.headers.contains_key(hyper::header::HOST) {
        if let Some(authority) = parts.uri.authority() {
            scope = scope.header("host", authority.as_str().to_owned());
        }
    }

    for (name, value) in parts.headers.iter() {
        scope = scope.header(
            Bytes::copy_from_slice(name.as_str().as_bytes()),
            Bytes::copy_from_slice(value.as_bytes()),
        );
    }

    if let Some(remote) = remote {
        scope = scope.client(Addr::new(remote.ip().to_string(), remote.port()));
    }

    Some(scope)
}

fn response(sent: Vec<Outbound>) -> hyper::Response<hyper::Body> {
    let mut builder = None;
    let mut chunks = Vec::new();

    for message in sent {
        match message {
            Outbound::ResponseStart { status, headers } => {
                let status = hyper::StatusCode::from_u16(status.as_u16())
                    .unwrap_or(hyper::StatusCode::INTERNAL_SERVER_ERROR);
                let mut response = hyper::Response::new(hyper::Body::empty());
                *response.status_mut() = status;

                for (name, value) in headers {
                    match (HeaderName::from_bytes(&name), HeaderValue::from_maybe_shared(value)) {
                        (Ok(name), Ok(value)) => {
                            response.headers_mut().append(name, value);
                        }
                        _ => tracing::warn!("dropping invalid response header"),
                    }
                }

                builder = Some(response);
            }
            Outbound::ResponseBody { body, .. } => chunks.push(body),
            other => tracing::debug!(kind = other.kind(), "ignoring non-http message"),
        }
    }

    match builder {
        Some(mut response) => {
            *response.body_mut() = hyper::Body::from(chunks.concat());
            response
        }
        None => status(hyper::StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn status(status: hyper::StatusCode) -> hyper::Response<hyper::Body> {
    let mut response = hyper::Response::new(hyper::Body::empty());
    *response.status_mut() = status;
    response
}

pub trait ToSocketAddr {
    fn to_socket_addr(self) -> io::Result<SocketAddr>;
}

impl ToSocketAddr for SocketAddr {
    fn to_socket_addr(self) -> io::Result<SocketAddr> {
        Ok(self)
    }
}

macro_rules! to_socket_addr {
    ($($ty:ty),*) => {$(
        impl ToSocketAddr for $ty {
            fn to_socket_addr(self) -> io::Result<SocketAddr> {
                self.to_socket_addrs()?
                    .next()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no socket address resolved"))
            }
        }
    )*}
}

to_socket_addr! {
    &str,
    String,
    (&str, u16),
    (IpAddr, u16),
    (String, u16),
    (Ipv4Addr, u16),
    (Ipv6Addr, u16),
    SocketAddrV4,
    SocketAddrV6
}
