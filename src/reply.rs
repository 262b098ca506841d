use crate::http::{Bytes, Response, StatusCode};
use crate::Failure;

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{Map, Value};

/// Anything a handler or hook can return.
///
/// A reply is turned into a [`Response`] by [`Reply::normalize`].
#[derive(Debug)]
pub enum Reply {
    Response(Response),
    /// Served as `text/html; charset=utf-8`.
    Text(String),
    /// Served as `application/octet-stream`.
    Bytes(Bytes),
    Json(Value),
    /// A reply with an explicit status and extra headers.
    Parts {
        body: Box<Reply>,
        status: StatusCode,
        headers: Vec<(String, String)>,
    },
    /// An empty `200`.
    Empty,
}

impl Reply {
    /// Serialize `value` into a JSON reply.
    pub fn json<T>(value: &T) -> Result<Reply, Failure>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_value(value)
            .map(Reply::Json)
            .map_err(Failure::internal)
    }

    /// Convert into a response. Text, bytes and JSON get a `200`; parts set
    /// their status positionally and replace same-named headers.
    pub fn normalize(self) -> Result<Response, Failure> {
        match self {
            Reply::Response(response) => Ok(response),
            Reply::Text(text) => Ok(Response::text(text)),
            Reply::Bytes(bytes) => Ok(Response::bytes(bytes)),
            Reply::Json(value) => Response::json(&value).map_err(Failure::internal),
            Reply::Parts {
                body,
                status,
                headers,
            } => {
                let mut response = body.normalize()?;
                response.status = status;
                for (name, value) in headers {
                    response.set_header(name, value);
                }
                Ok(response)
            }
            Reply::Empty => Ok(Response::new(StatusCode::OK)),
        }
    }
}

macro_rules! into_reply {
    ($($ty:ty $(|$into:ident)? => $variant:ident),* $(,)?) => { $(
        impl From<$ty> for Reply {
            fn from(value: $ty) -> Reply {
                Reply::$variant(value $(.$into())?)
            }
        })*
    }
}

into_reply! {
    Response => Response,
    String => Text,
    &'static str | into => Text,
    Cow<'static, str> | into_owned => Text,
    Bytes => Bytes,
    Vec<u8> | into => Bytes,
    &'static [u8] | into => Bytes,
    Value => Json,
    Map<String, Value> | into => Json,
}

impl From<()> for Reply {
    fn from(_: ()) -> Reply {
        Reply::Empty
    }
}

impl<T> From<(T, StatusCode)> for Reply
where
    T: Into<Reply>,
{
    fn from((body, status): (T, StatusCode)) -> Reply {
        Reply::Parts {
            body: Box::new(body.into()),
            status,
            headers: Vec::new(),
        }
    }
}

impl<T> From<(T, StatusCode, Vec<(String, String)>)> for Reply
where
    T: Into<Reply>,
{
    fn from((body, status, headers): (T, StatusCode, Vec<(String, String)>)) -> Reply {
        Reply::Parts {
            body: Box::new(body.into()),
            status,
            headers,
        }
    }
}
