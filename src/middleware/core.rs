use serde_json::Value;
use std::sync::Arc;

use crate::error::HttpError;
use crate::handlers::Handler;
use crate::server::{Request, Response};

/// What a middleware step decided.
#[derive(Debug)]
pub enum Flow {
    /// Run the next step.
    Continue,
    /// Stop the chain and send this response.
    Respond(Response),
}

/// One step of a request chain.
///
/// Returning `Err` stops the chain and hands the error to the app's error
/// handler.
pub trait Middleware: Send + Sync {
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request) -> Result<Flow, HttpError> + Send + Sync,
{
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError> {
        self(req)
    }
}

/// Wrap a closure as a shareable middleware.
pub fn middleware_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut Request) -> Result<Flow, HttpError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered middleware ending in a handler, registered for one method and path.
#[derive(Clone)]
pub struct Chain {
    pub steps: Vec<Arc<dyn Middleware>>,
    pub handler: Arc<dyn Handler>,
    /// Swagger operation object attached to the request before any step runs
    pub operation: Option<Arc<Value>>,
}

impl Chain {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            steps: Vec::new(),
            handler,
            operation: None,
        }
    }

    /// Run every step in order, short-circuiting on the first response or error.
    pub fn run(&self, req: &mut Request) -> Result<Response, HttpError> {
        if let Some(op) = &self.operation {
            req.operation = Some(Arc::clone(op));
        }
        for step in &self.steps {
            match step.call(req)? {
                Flow::Continue => {}
                Flow::Respond(res) => return Ok(res),
            }
        }
        self.handler.handle(req)
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("steps", &self.steps.len())
            .field("operation", &self.operation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::handler_fn;
    use http::Method;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_chain_runs_in_order() {
        let mut chain = Chain::new(handler_fn(|req: &mut Request| {
            Ok(Response::ok_json(req.extensions.get("trail").cloned().unwrap_or_default()))
        }));
        for step in ["a", "b"] {
            chain.steps.push(middleware_fn(move |req: &mut Request| {
                let trail = req
                    .extensions
                    .entry("trail")
                    .or_insert_with(|| json!([]));
                if let Some(items) = trail.as_array_mut() {
                    items.push(json!(step));
                }
                Ok(Flow::Continue)
            }));
        }
        let mut req = Request::new(Method::GET, "/");
        let res = chain.run(&mut req).unwrap();
        assert_eq!(res.json_body(), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_chain_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut chain = Chain::new(handler_fn(move |_req: &mut Request| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(204))
        }));
        chain
            .steps
            .push(middleware_fn(|_req: &mut Request| Err(HttpError::bad_request("stop"))));
        let mut req = Request::new(Method::GET, "/");
        let err = chain.run(&mut req).unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chain_attaches_operation() {
        let mut chain = Chain::new(handler_fn(|req: &mut Request| {
            let id = req
                .operation
                .as_ref()
                .and_then(|op| op.get("operationId").cloned())
                .unwrap_or_default();
            Ok(Response::ok_json(id))
        }));
        chain.operation = Some(Arc::new(json!({"operationId": "listPets"})));
        let mut req = Request::new(Method::GET, "/pets");
        let res = chain.run(&mut req).unwrap();
        assert_eq!(res.json_body(), Some(&json!("listPets")));
    }
}
