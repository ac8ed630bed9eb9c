use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span};

use crate::error::HttpError;
use crate::handlers::Handler;
use crate::mount::MountedApi;
use crate::router::{MatchOptions, Router};
use crate::server::{Request, Response};

/// Renders errors that reach the end of a chain.
pub trait ErrorHandler: Send + Sync {
    fn render(&self, req: &Request, err: HttpError) -> Response;
}

/// Default renderer: `{"errors":[{"detail","status","title"}],"name"}` with the
/// error's status and extra headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorHandler;

impl ErrorHandler for JsonErrorHandler {
    fn render(&self, req: &Request, err: HttpError) -> Response {
        debug!(
            request_id = %req.id,
            status = err.status,
            title = %err.title,
            detail = %err.detail,
            "Request failed"
        );
        err.into_response()
    }
}

/// The catch-all an app starts with, mirroring express' final handler.
fn default_fallback() -> Arc<dyn Handler> {
    Arc::new(|req: &mut Request| -> Result<Response, HttpError> {
        Ok(Response::text(404, format!("Cannot {} {}", req.method, req.path)))
    })
}

/// The host application: settings, router, and error handling.
///
/// Setting names follow express (`x-powered-by`, `trust proxy`,
/// `json spaces`, `case sensitive routing`, `strict routing`); those are the
/// ones that change behaviour here. Any other key is stored and returned
/// as-is.
pub struct App {
    settings: BTreeMap<String, Value>,
    router: Router,
    fallback: Option<Arc<dyn Handler>>,
    error_handler: Arc<dyn ErrorHandler>,
    swagger: Option<Arc<MountedApi>>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        let mut settings = BTreeMap::new();
        settings.insert("x-powered-by".to_string(), Value::Bool(true));
        settings.insert("trust proxy".to_string(), Value::Bool(false));
        settings.insert("case sensitive routing".to_string(), Value::Bool(false));
        settings.insert("strict routing".to_string(), Value::Bool(false));
        Self {
            settings,
            router: Router::new(),
            fallback: Some(default_fallback()),
            error_handler: Arc::new(JsonErrorHandler),
            swagger: None,
        }
    }

    pub fn set(&mut self, name: &str, value: Value) -> &mut Self {
        self.settings.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }

    /// Truthy check: `null`, `false`, `0` and `""` are disabled.
    pub fn enabled(&self, name: &str) -> bool {
        match self.settings.get(name) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    pub fn settings(&self) -> &BTreeMap<String, Value> {
        &self.settings
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Handler for requests no route matches. `None` turns them into a 404
    /// [`HttpError`] for the error handler.
    pub fn set_fallback(&mut self, handler: Option<Arc<dyn Handler>>) {
        self.fallback = handler;
    }

    pub fn remove_fallback(&mut self) -> Option<Arc<dyn Handler>> {
        self.fallback.take()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn set_error_handler(&mut self, handler: Arc<dyn ErrorHandler>) {
        self.error_handler = handler;
    }

    /// The API mounted on this app, if any.
    pub fn swagger(&self) -> Option<&Arc<MountedApi>> {
        self.swagger.as_ref()
    }

    pub(crate) fn set_swagger(&mut self, mounted: Arc<MountedApi>) {
        self.swagger = Some(mounted);
    }

    /// Indentation for JSON bodies, from `json spaces`.
    pub fn json_spaces(&self) -> usize {
        self.settings
            .get("json spaces")
            .and_then(Value::as_u64)
            .map_or(0, |n| n as usize)
    }

    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.enabled("case sensitive routing"),
            strict: self.enabled("strict routing"),
        }
    }

    fn client_ip(&self, req: &Request) -> Option<String> {
        if self.enabled("trust proxy") {
            if let Some(forwarded) = req.header("x-forwarded-for") {
                if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
                    return Some(first.to_string());
                }
            }
        }
        req.remote_addr.clone()
    }

    /// Run a request through the router and render the outcome.
    pub fn handle(&self, mut req: Request) -> Response {
        let span = info_span!(
            "request",
            id = %req.id,
            method = %req.method,
            path = %req.path
        );
        let _entered = span.enter();
        let started = Instant::now();

        req.ip = self.client_ip(&req);

        let outcome = match self.router.dispatch(&mut req, self.match_options()) {
            Some(outcome) => outcome,
            None => match &self.fallback {
                Some(fallback) => fallback.handle(&mut req),
                None => Err(HttpError::not_found(format!(
                    "Cannot {} {}",
                    req.method, req.path
                ))
                .with_name(
                    self.swagger
                        .as_ref()
                        .map_or(crate::error::DEFAULT_ERROR_NAME, |s| s.error_name.as_str()),
                )),
            },
        };

        let mut response = match outcome {
            Ok(response) => response,
            Err(err) => self.error_handler.render(&req, err),
        };

        if req.method == http::Method::HEAD {
            response.body = Default::default();
        }
        if self.enabled("x-powered-by") {
            response.set_header("X-Powered-By", "swaggerize");
        }

        debug!(
            status = response.status,
            latency_us = started.elapsed().as_micros() as u64,
            "Request completed"
        );
        response
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("settings", &self.settings)
            .field("routes", &self.router.route_count())
            .field("fallback", &self.fallback.is_some())
            .field("mounted", &self.swagger.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::handler_fn;
    use http::Method;
    use serde_json::json;

    fn app() -> App {
        let mut app = App::new();
        app.router_mut().get(
            "/ip",
            handler_fn(|req: &mut Request| Ok(Response::ok_json(json!({"ip": req.ip})))),
        );
        app
    }

    #[test]
    fn test_default_fallback() {
        let res = app().handle(Request::new(Method::GET, "/nope"));
        assert_eq!(res.status, 404);
        assert_eq!(res.body_bytes(0), b"Cannot GET /nope".to_vec());
    }

    #[test]
    fn test_without_fallback_errors_are_json() {
        let mut app = app();
        assert!(app.remove_fallback().is_some());
        let res = app.handle(Request::new(Method::GET, "/nope"));
        assert_eq!(res.status, 404);
        assert_eq!(res.json_body().unwrap()["errors"][0]["title"], json!("Not Found"));
    }

    struct PlainErrors;

    impl ErrorHandler for PlainErrors {
        fn render(&self, _req: &Request, err: HttpError) -> Response {
            Response::text(err.status, format!("{}: {}", err.title, err.detail))
        }
    }

    #[test]
    fn test_custom_error_handler_and_fallback() {
        let mut app = app();
        app.set_error_handler(Arc::new(PlainErrors));
        app.set_fallback(Some(handler_fn(|_req: &mut Request| {
            Err(HttpError::new(410, "Gone", "retired"))
        })));
        let res = app.handle(Request::new(Method::GET, "/nope"));
        assert_eq!(res.status, 410);
        assert_eq!(res.body_bytes(0), b"Gone: retired".to_vec());

        app.set_fallback(None);
        assert!(!app.has_fallback());
        let res = app.handle(Request::new(Method::GET, "/nope"));
        assert_eq!(res.status, 404);
        assert_eq!(res.body_bytes(0), b"Not Found: Cannot GET /nope".to_vec());
    }

    #[test]
    fn test_trust_proxy() {
        let mut app = app();
        let req = || {
            let mut req = Request::new(Method::GET, "/ip").with_header("X-Forwarded-For", "10.0.0.1, 10.0.0.2");
            req.remote_addr = Some("127.0.0.1".to_string());
            req
        };
        assert_eq!(app.handle(req()).json_body().unwrap()["ip"], json!("127.0.0.1"));
        app.set("trust proxy", json!(true));
        assert_eq!(app.handle(req()).json_body().unwrap()["ip"], json!("10.0.0.1"));
    }

    #[test]
    fn test_powered_by_and_head() {
        let mut app = app();
        let res = app.handle(Request::new(Method::HEAD, "/ip"));
        assert_eq!(res.status, 200);
        assert_eq!(res.header("x-powered-by"), Some("swaggerize"));
        assert!(res.body_bytes(0).is_empty());

        app.set("x-powered-by", json!(false));
        let res = app.handle(Request::new(Method::GET, "/ip"));
        assert_eq!(res.header("x-powered-by"), None);
    }

    #[test]
    fn test_enabled_truthiness() {
        let mut app = App::new();
        app.set("a", json!(0)).set("b", json!("x")).set("c", Value::Null);
        assert!(!app.enabled("a"));
        assert!(app.enabled("b"));
        assert!(!app.enabled("c"));
        assert!(!app.enabled("missing"));
    }
}
