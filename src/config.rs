use serde::Deserialize;

use std::path::PathBuf;

/// Gateway-wide settings.
///
/// ```
/// use asgate::Config;
///
/// let config = Config::new().limit(1024).charset("latin1");
/// assert_eq!(config.body_limit, 1024);
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of body bytes assembled for one request.
    pub body_limit: usize,
    /// Charset used when `Content-Type` carries none.
    pub default_charset: String,
    /// Directory for temporary upload files. Defaults to the system temp dir.
    pub temp_dir: Option<PathBuf>,
    /// Include the failure trace in default error responses.
    pub expose_trace: bool,
}

impl Config {
    /// Create a [`Config`] instance.
    pub fn new() -> Self {
        Self {
            body_limit: 8_388_608, // (~8mb)
            default_charset: "utf-8".to_owned(),
            temp_dir: None,
            expose_trace: false,
        }
    }

    /// Set maximum number of bytes that can be streamed.
    ///
    /// By default the limit is 8mb.
    pub fn limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.default_charset = charset.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn expose_trace(mut self, expose: bool) -> Self {
        self.expose_trace = expose;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
