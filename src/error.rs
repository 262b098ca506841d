use crate::bounded::BoxError;
use crate::wire::Phase;

use std::error::Error as StdError;
use std::io;

use http::StatusCode;

/// Every way a call can fail.
///
/// Decoder failures are carried inside a [`Request`](crate::Request) instead of
/// being raised; everything else ends up on the gateway's error path, where it is
/// turned into an [`ErrorReport`] and emitted as a response.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// A multipart segment without a header/body separator.
    #[error("malformed body part: {0}")]
    MalformedBodyPart(String),

    /// Content claiming multipart semantics that cannot be split.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// JSON, charset or URL-decoding errors.
    #[error("{reason}: {source}")]
    Decode {
        reason: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("payload of at least {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Access to a request attribute that does not exist.
    #[error("request.{0} is empty")]
    MissingAttribute(&'static str),

    #[error("{0}")]
    NotFound(String),

    /// A failure raised by application code, or anything else that went wrong
    /// while dispatching.
    #[error("{reason}")]
    Application {
        status: StatusCode,
        reason: String,
        body: Option<String>,
        trace: Vec<String>,
    },

    /// An error raised while emitting a response.
    #[error("transport failure: {reason}")]
    Transport { reason: String, trace: Vec<String> },

    #[error("the {0} phase is not implemented")]
    UnsupportedPhase(Phase),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Failure {
    /// An application failure with the given status and reason.
    pub fn application(status: StatusCode, reason: impl Into<String>) -> Self {
        Failure::Application {
            status,
            reason: reason.into(),
            body: None,
            trace: Vec::new(),
        }
    }

    /// Wraps an arbitrary error as a 500 application failure, keeping its
    /// source chain as the trace.
    pub fn internal<E>(err: E) -> Self
    where
        E: StdError,
    {
        Failure::Application {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            reason: err.to_string(),
            body: None,
            trace: chain(&err),
        }
    }

    pub(crate) fn decode<E>(reason: &'static str, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Failure::Decode {
            reason,
            source: err.into(),
        }
    }

    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        let err = err.into();
        Failure::Transport {
            reason: err.to_string(),
            trace: chain(&*err),
        }
    }

    /// Attach a response body to an application failure.
    pub fn with_body(mut self, text: impl Into<String>) -> Self {
        if let Failure::Application { ref mut body, .. } = self {
            *body = Some(text.into());
        }
        self
    }

    /// The status code this failure is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Failure::MalformedBodyPart(_) | Failure::Decode { .. } => StatusCode::BAD_REQUEST,
            Failure::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Failure::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Failure::NotFound(_) => StatusCode::NOT_FOUND,
            Failure::Application { status, .. } => *status,
            Failure::MissingAttribute(_)
            | Failure::Transport { .. }
            | Failure::UnsupportedPhase(_)
            | Failure::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The diagnostic trace: either the one captured at construction, or the
    /// chain of underlying sources.
    pub fn trace(&self) -> Vec<String> {
        match self {
            Failure::Application { trace, .. } | Failure::Transport { trace, .. } => trace.clone(),
            other => chain(other).into_iter().skip(1).collect(),
        }
    }

    /// Flatten this failure into the `(status, reason, body, trace)` tuple used on
    /// the error path.
    pub fn report(&self) -> ErrorReport {
        let (reason, body) = match self {
            Failure::Application { reason, body, .. } => (reason.clone(), body.clone()),
            other => (
                other
                    .status()
                    .canonical_reason()
                    .unwrap_or("Error")
                    .to_owned(),
                Some(other.to_string()),
            ),
        };

        ErrorReport {
            status: self.status(),
            reason,
            body,
            trace: self.trace(),
        }
    }
}

/// A failure normalized for the error path.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub reason: String,
    pub body: Option<String>,
    pub trace: Vec<String>,
}

fn chain(err: &(dyn StdError + '_)) -> Vec<String> {
    let mut trace = vec![err.to_string()];
    let mut source = err.source();
    while let Some(err) = source {
        trace.push(err.to_string());
        source = err.source();
    }
    trace
}
