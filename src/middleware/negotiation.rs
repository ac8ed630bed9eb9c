//! Path-level HTTP semantics shared by every method registered on a path:
//! method allow-lists and content negotiation.
//!
//! Media types match by substring: a header token matches a declared type when
//! it contains it, so `application/json; charset=utf-8` satisfies
//! `application/json`. Comma-separated header values are checked one by one.

use http::Method;
use std::sync::Arc;
use tracing::debug;

use super::{Flow, Middleware};
use crate::error::HttpError;
use crate::server::Request;

/// Media types declared by one operation on a path.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMedia {
    pub method: Method,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
}

fn lookup<'a>(table: &'a [MethodMedia], method: &Method) -> Option<&'a MethodMedia> {
    let find = |m: &Method| table.iter().find(|entry| entry.method == *m);
    find(method).or_else(|| (*method == Method::HEAD).then(|| find(&Method::GET)).flatten())
}

/// True when no constraint applies or some header token contains a declared type.
fn media_matches(header: Option<&str>, declared: &[String]) -> bool {
    let header = header.map(str::trim).unwrap_or("");
    if header.is_empty() || declared.is_empty() {
        return true;
    }
    let tokens: Vec<String> = header
        .split(',')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.iter().any(|t| t.contains("*/*")) {
        return true;
    }
    declared.iter().any(|d| {
        let d = d.to_ascii_lowercase();
        tokens.iter().any(|t| t.contains(&d))
    })
}

/// 405 with an `Allow` header when the path has no route for the method.
pub struct MethodNotAllowed {
    table: Arc<Vec<MethodMedia>>,
    error_name: String,
}

impl MethodNotAllowed {
    pub fn allow_header(&self) -> String {
        self.table
            .iter()
            .map(|entry| entry.method.as_str().to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Middleware for MethodNotAllowed {
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError> {
        if lookup(&self.table, &req.method).is_some() {
            return Ok(Flow::Continue);
        }
        let allow = self.allow_header();
        debug!(request_id = %req.id, method = %req.method, allow = %allow, "Method not allowed");
        Err(HttpError::method_not_allowed(format!(
            "{} is not allowed on {}, expected one of: {}",
            req.method, req.path, allow
        ))
        .with_header("Allow", allow)
        .with_name(&self.error_name))
    }
}

/// 415 when a PATCH, POST or PUT body has a type the operation does not consume.
pub struct ContentTypeCheck {
    table: Arc<Vec<MethodMedia>>,
    error_name: String,
}

impl Middleware for ContentTypeCheck {
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError> {
        if !matches!(req.method, Method::PATCH | Method::POST | Method::PUT) {
            return Ok(Flow::Continue);
        }
        let Some(media) = lookup(&self.table, &req.method) else {
            return Ok(Flow::Continue);
        };
        if media_matches(req.content_type(), &media.consumes) {
            return Ok(Flow::Continue);
        }
        Err(HttpError::unsupported_media_type(format!(
            "Content-Type {} is not one of: {}",
            req.content_type().unwrap_or_default(),
            media.consumes.join(", ")
        ))
        .with_name(&self.error_name))
    }
}

/// 406 when `Accept` excludes everything the operation produces (or, when it
/// declares no `produces`, consumes).
pub struct AcceptCheck {
    table: Arc<Vec<MethodMedia>>,
    error_name: String,
}

impl Middleware for AcceptCheck {
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError> {
        let Some(media) = lookup(&self.table, &req.method) else {
            return Ok(Flow::Continue);
        };
        let declared = if media.produces.is_empty() {
            &media.consumes
        } else {
            &media.produces
        };
        if media_matches(req.header("accept"), declared) {
            return Ok(Flow::Continue);
        }
        Err(HttpError::not_acceptable(format!(
            "Accept {} does not include any of: {}",
            req.header("accept").unwrap_or_default(),
            declared.join(", ")
        ))
        .with_name(&self.error_name))
    }
}

/// The per-path guard: method check, then Content-Type, then Accept.
///
/// Attached once per distinct path and run once per request, ahead of the
/// method's chain.
pub struct PathGuard {
    steps: [Box<dyn Middleware>; 3],
}

impl PathGuard {
    /// `table` lists the path's operations in registration order.
    pub fn new(table: Vec<MethodMedia>, error_name: &str) -> Self {
        let table = Arc::new(table);
        Self {
            steps: [
                Box::new(MethodNotAllowed {
                    table: Arc::clone(&table),
                    error_name: error_name.to_string(),
                }),
                Box::new(ContentTypeCheck {
                    table: Arc::clone(&table),
                    error_name: error_name.to_string(),
                }),
                Box::new(AcceptCheck {
                    table,
                    error_name: error_name.to_string(),
                }),
            ],
        }
    }
}

impl Middleware for PathGuard {
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError> {
        for step in &self.steps {
            if let Flow::Respond(res) = step.call(req)? {
                return Ok(Flow::Respond(res));
            }
        }
        Ok(Flow::Continue)
    }
}
