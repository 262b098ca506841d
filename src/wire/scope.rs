use bytes::Bytes;
use http::Method;

use std::fmt;

/// The top-level category of a connection, fixed for its whole duration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Phase {
    Http,
    Websocket,
    Lifespan,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Http => "http",
            Phase::Websocket => "websocket",
            Phase::Lifespan => "lifespan",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network address pair. `port` is `None` for unix sockets, where `host`
/// holds the socket path.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Addr {
    pub host: String,
    pub port: Option<u16>,
}

impl Addr {
    pub fn new(host: impl Into<String>, port: impl Into<Option<u16>>) -> Self {
        Addr {
            host: host.into(),
            port: port.into(),
        }
    }
}

/// The handshake metadata describing one call.
#[derive(Clone, Debug)]
pub struct Scope {
    pub phase: Phase,
    pub http_version: String,
    pub method: Option<Method>,
    pub scheme: Option<String>,
    pub path: Option<String>,
    pub raw_path: Option<Bytes>,
    pub query_string: Bytes,
    pub headers: Vec<(Bytes, Bytes)>,
    pub server: Option<Addr>,
    pub client: Option<Addr>,
}

impl Scope {
    fn new(phase: Phase) -> Self {
        Scope {
            phase,
            http_version: "1.1".to_owned(),
            method: None,
            scheme: None,
            path: None,
            raw_path: None,
            query_string: Bytes::new(),
            headers: Vec::new(),
            server: None,
            client: None,
        }
    }

    /// An `http` scope for the given method and path.
    pub fn http(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        Scope {
            method: Some(method),
            scheme: Some("http".to_owned()),
            raw_path: Some(Bytes::from(path.clone())),
            path: Some(path),
            ..Scope::new(Phase::Http)
        }
    }

    pub fn lifespan() -> Self {
        Scope::new(Phase::Lifespan)
    }

    pub fn websocket(path: impl Into<String>) -> Self {
        let path = path.into();
        Scope {
            scheme: Some("ws".to_owned()),
            raw_path: Some(Bytes::from(path.clone())),
            path: Some(path),
            ..Scope::new(Phase::Websocket)
        }
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn query(mut self, query: impl Into<Bytes>) -> Self {
        self.query_string = query.into();
        self
    }

    /// Appends a raw header pair.
    pub fn header(mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn server(mut self, addr: Addr) -> Self {
        self.server = Some(addr);
        self
    }

    pub fn client(mut self, addr: Addr) -> Self {
        self.client = Some(addr);
        self
    }
}
