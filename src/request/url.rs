use crate::wire::Scope;
use crate::Failure;

use http::{StatusCode, Uri};

/// The parsed components of a request URL.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Url {
    pub scheme: String,
    /// `user:password@host:port`
    pub netloc: String,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub query: String,
    pub fragment: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Url {
    /// Rebuild the URL a scope was requested with. The authority is only known
    /// when the client sent a `Host` header.
    pub(crate) fn from_scope(scope: &Scope, host: Option<&str>) -> Result<Url, Failure> {
        let scheme = scope.scheme.as_deref().unwrap_or("http");
        let path = match (&scope.raw_path, &scope.path) {
            (Some(raw), _) => String::from_utf8_lossy(raw).into_owned(),
            (None, Some(path)) => path.clone(),
            (None, None) => String::new(),
        };

        let mut url = String::new();
        if let Some(host) = host {
            url.push_str(scheme);
            url.push_str("://");
            url.push_str(host);
        }
        url.push_str(&path);
        if !scope.query_string.is_empty() {
            url.push('?');
            url.push_str(&String::from_utf8_lossy(&scope.query_string));
        }

        Url::parse(&url)
    }

    /// Parse an absolute URL or an origin-form path.
    pub fn parse(url: &str) -> Result<Url, Failure> {
        let (url, fragment) = url.split_once('#').unwrap_or((url, ""));
        if url.is_empty() {
            return Ok(Url {
                fragment: fragment.to_owned(),
                ..Url::default()
            });
        }

        let uri: Uri = url.parse().map_err(|err: http::uri::InvalidUri| {
            Failure::application(StatusCode::BAD_REQUEST, "Bad request")
                .with_body(format!("Malformed request line: {}", err))
        })?;

        let netloc = uri
            .authority()
            .map(|authority| authority.as_str().to_owned())
            .unwrap_or_default();
        let (username, password) = match netloc.rsplit_once('@') {
            Some((userinfo, _)) => match userinfo.split_once(':') {
                Some((user, password)) => (Some(user.to_owned()), Some(password.to_owned())),
                None => (Some(userinfo.to_owned()), None),
            },
            None => (None, None),
        };

        Ok(Url {
            scheme: uri.scheme_str().unwrap_or_default().to_owned(),
            hostname: uri.host().map(str::to_ascii_lowercase),
            port: uri.port_u16(),
            path: uri.path().to_owned(),
            query: uri.query().unwrap_or_default().to_owned(),
            fragment: fragment.to_owned(),
            netloc,
            username,
            password,
        })
    }

    /// `scheme://host[:port]`, or an empty string without a host.
    pub fn host_url(&self) -> String {
        match &self.hostname {
            Some(host) => match self.port {
                Some(port) => format!("{}://{}:{}", self.scheme, host, port),
                None => format!("{}://{}", self.scheme, host),
            },
            None => String::new(),
        }
    }

    /// The host URL followed by the path, without query or fragment.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.host_url(), self.path)
    }
}
