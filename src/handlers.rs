//! Handler trait and the registry that routes are resolved against.
//!
//! Operations in the document are bound to handlers in this order:
//!
//! 1. the operation's `x-handler` extension, looked up by name
//! 2. the operation's `operationId`, looked up by name
//! 3. the `(method, path)` pair as written in the document
//! 4. the registry fallback, if one is set

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::HttpError;
use crate::middleware::Middleware;
use crate::server::{Request, Response};

/// Final step of a route: produces the response.
pub trait Handler: Send + Sync {
    fn handle(&self, req: &mut Request) -> Result<Response, HttpError>;
}

impl<F> Handler for F
where
    F: Fn(&mut Request) -> Result<Response, HttpError> + Send + Sync,
{
    fn handle(&self, req: &mut Request) -> Result<Response, HttpError> {
        self(req)
    }
}

/// Wrap a closure as a shareable handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut Request) -> Result<Response, HttpError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A handler as declared for an operation: either a single handler, or
/// pre-handlers that run (after authorization, before validation) ahead of
/// the final handler.
#[derive(Clone)]
pub enum HandlerSpec {
    Single(Arc<dyn Handler>),
    Chain {
        before: Vec<Arc<dyn Middleware>>,
        handler: Arc<dyn Handler>,
    },
}

impl HandlerSpec {
    pub fn chain(before: Vec<Arc<dyn Middleware>>, handler: Arc<dyn Handler>) -> Self {
        HandlerSpec::Chain { before, handler }
    }

    /// Pre-handlers, empty for a single handler.
    pub fn before(&self) -> &[Arc<dyn Middleware>] {
        match self {
            HandlerSpec::Single(_) => &[],
            HandlerSpec::Chain { before, .. } => before,
        }
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        match self {
            HandlerSpec::Single(h) => h,
            HandlerSpec::Chain { handler, .. } => handler,
        }
    }
}

impl From<Arc<dyn Handler>> for HandlerSpec {
    fn from(h: Arc<dyn Handler>) -> Self {
        HandlerSpec::Single(h)
    }
}

impl std::fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerSpec::Single(_) => f.write_str("Single"),
            HandlerSpec::Chain { before, .. } => write!(f, "Chain(before: {})", before.len()),
        }
    }
}

/// Handlers available to route discovery.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    named: HashMap<String, HandlerSpec>,
    operations: HashMap<(Method, String), HandlerSpec>,
    fallback: Option<HandlerSpec>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under a name matched against `x-handler` or `operationId`.
    pub fn named(&mut self, name: &str, spec: impl Into<HandlerSpec>) -> &mut Self {
        self.named.insert(name.to_string(), spec.into());
        self
    }

    /// Register for a method and the path exactly as written in the document,
    /// e.g. `/pets/{id}`.
    pub fn operation(&mut self, method: Method, path: &str, spec: impl Into<HandlerSpec>) -> &mut Self {
        self.operations.insert((method, path.to_string()), spec.into());
        self
    }

    /// Used for every operation nothing else matches.
    pub fn fallback(&mut self, spec: impl Into<HandlerSpec>) -> &mut Self {
        self.fallback = Some(spec.into());
        self
    }

    pub fn resolve(
        &self,
        x_handler: Option<&str>,
        operation_id: Option<&str>,
        method: &Method,
        path: &str,
    ) -> Option<HandlerSpec> {
        x_handler
            .and_then(|name| self.named.get(name))
            .or_else(|| operation_id.and_then(|id| self.named.get(id)))
            .or_else(|| self.operations.get(&(method.clone(), path.to_string())))
            .or(self.fallback.as_ref())
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.operations.is_empty() && self.fallback.is_none()
    }
}
