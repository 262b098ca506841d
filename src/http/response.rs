use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

/// An outgoing response: a status, ordered headers and a serialized body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// The response's status
    pub status: StatusCode,

    /// The response's headers, in emission order
    pub headers: Vec<(String, String)>,

    /// The response body
    pub body: Bytes,
}

impl Response {
    /// An empty response with the given status.
    pub fn new(status: StatusCode) -> Response {
        Response {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// A `200` text response, served as `text/html; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Response {
        let body: String = body.into();
        Response::new(StatusCode::OK)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body)
    }

    pub fn bytes(body: impl Into<Bytes>) -> Response {
        Response::new(StatusCode::OK)
            .header("Content-Type", "application/octet-stream")
            .body(body)
    }

    /// Serialize `value` as a JSON response.
    pub fn json<T>(value: &T) -> Result<Response, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(value)?;
        Ok(Response::new(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(body))
    }

    /// A `302 Found` pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Response {
        Response::new(StatusCode::FOUND).header("Location", location)
    }

    pub fn status(mut self, status: StatusCode) -> Response {
        self.status = status;
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Response {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace every header with the given name, case-insensitively.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Response {
        self.body = body.into();
        self
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
