//! Error types.
//!
//! Two kinds of failure exist in this crate:
//!
//! - [`ConfigError`] is returned while building or mounting an API and aborts
//!   startup.
//! - [`HttpError`] is returned by middleware and handlers while serving a
//!   request. The app's [`ErrorHandler`](crate::server::ErrorHandler) turns it
//!   into a response.

use serde_json::{json, Value};
use std::path::PathBuf;
use thiserror::Error;

use crate::server::Response;

/// Label attached to errors raised by this crate when the caller configures none.
pub const DEFAULT_ERROR_NAME: &str = "SwaggerizeError";

/// Setup-time failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("api definition is required")]
    MissingApi,

    #[error("api definition must be an object")]
    ApiNotAnObject,

    #[error("unsupported swagger version {0:?}, expected \"2.0\"")]
    UnsupportedVersion(String),

    #[error("failed to read api document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse api document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("malformed api document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("invalid option `{option}`: {message}")]
    InvalidOption { option: &'static str, message: String },

    #[error("unresolvable reference {0}")]
    UnresolvedRef(String),

    #[error("invalid schema for parameter `{parameter}` ({location}): {message}")]
    Schema {
        parameter: String,
        location: String,
        message: String,
    },
}

/// Request-time failure forwarded to the app's error handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    pub status: u16,
    pub title: String,
    pub detail: String,
    /// The configured `errorname` of the mount that raised the error.
    pub name: String,
    /// Extra response headers, e.g. `Allow` on a 405.
    pub headers: Vec<(String, String)>,
}

impl HttpError {
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            detail: detail.into(),
            name: DEFAULT_ERROR_NAME.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request", detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(401, "Unauthorized", detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found", detail)
    }

    pub fn method_not_allowed(detail: impl Into<String>) -> Self {
        Self::new(405, "Method Not Allowed", detail)
    }

    pub fn not_acceptable(detail: impl Into<String>) -> Self {
        Self::new(406, "Not Acceptable", detail)
    }

    pub fn unsupported_media_type(detail: impl Into<String>) -> Self {
        Self::new(415, "Unsupported Media Type", detail)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// JSON payload: `{"errors":[{"detail","status","title"}],"name"}`.
    pub fn to_body(&self) -> Value {
        json!({
            "errors": [{
                "detail": self.detail,
                "status": self.status,
                "title": self.title,
            }],
            "name": self.name,
        })
    }

    pub fn into_response(self) -> Response {
        let mut res = Response::json(self.status, self.to_body());
        for (k, v) in self.headers {
            res.headers.push((k, v));
        }
        res
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status, self.title, self.detail)
    }
}

impl std::error::Error for HttpError {}
