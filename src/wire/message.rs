use bytes::Bytes;
use http::StatusCode;

/// A message received from the host.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Inbound {
    /// `http.request`: one chunk of the request body.
    Request { body: Bytes, more_body: bool },
    /// `http.disconnect`
    Disconnect,
    /// `lifespan.startup`
    Startup,
    /// `lifespan.shutdown`
    Shutdown,
}

impl Inbound {
    /// A final body chunk.
    pub fn body(body: impl Into<Bytes>) -> Self {
        Inbound::Request {
            body: body.into(),
            more_body: false,
        }
    }

    /// A body chunk with more to follow.
    pub fn chunk(body: impl Into<Bytes>) -> Self {
        Inbound::Request {
            body: body.into(),
            more_body: true,
        }
    }

    /// The wire name of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Request { .. } => "http.request",
            Inbound::Disconnect => "http.disconnect",
            Inbound::Startup => "lifespan.startup",
            Inbound::Shutdown => "lifespan.shutdown",
        }
    }
}

/// A message sent back to the host.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Outbound {
    /// `http.response.start`
    ResponseStart {
        status: StatusCode,
        headers: Vec<(Bytes, Bytes)>,
    },
    /// `http.response.body`
    ResponseBody { body: Bytes, more_body: bool },
    /// `lifespan.startup.complete`
    StartupComplete,
    /// `lifespan.startup.failed`
    StartupFailed { message: String },
    /// `lifespan.shutdown.complete`
    ShutdownComplete,
    /// `lifespan.shutdown.failed`
    ShutdownFailed { message: String },
}

impl Outbound {
    /// The wire name of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::ResponseStart { .. } => "http.response.start",
            Outbound::ResponseBody { .. } => "http.response.body",
            Outbound::StartupComplete => "lifespan.startup.complete",
            Outbound::StartupFailed { .. } => "lifespan.startup.failed",
            Outbound::ShutdownComplete => "lifespan.shutdown.complete",
            Outbound::ShutdownFailed { .. } => "lifespan.shutdown.failed",
        }
    }
}
