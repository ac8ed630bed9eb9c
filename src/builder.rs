//! Turns derived routes into router registrations.
//!
//! Each route becomes one [`Chain`]:
//!
//! 1. [`AuthorizeMiddleware`] when the route declares security
//! 2. the handler's pre-handlers, for array handlers
//! 3. one [`ValidatorMiddleware`] per parameter
//! 4. the handler
//!
//! After every route is registered, each distinct path gets one
//! [`PathGuard`] built from all routes sharing it.

use std::sync::Arc;
use tracing::debug;

use crate::middleware::{AuthorizeMiddleware, Chain, Middleware, MethodMedia, PathGuard};
use crate::router::{from_template, Router};
use crate::spec::RouteMeta;
use crate::validator::ValidatorMiddleware;

/// Join a base path and a document path template into a router pattern.
///
/// The base loses its trailing slash; `{param}` becomes `:param`.
pub fn resolve_path(base_path: &str, template: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let path = from_template(template);
    if path == "/" && !base.is_empty() {
        return base.to_string();
    }
    format!("{base}{path}")
}

/// The middleware chain for one route.
pub fn build_chain(route: &RouteMeta, error_name: &str) -> Chain {
    let mut steps: Vec<Arc<dyn Middleware>> = Vec::new();

    if let Some(entries) = &route.security {
        steps.push(Arc::new(AuthorizeMiddleware::new(entries.clone(), error_name)));
    }
    steps.extend(route.handler.before().iter().cloned());
    for validator in &route.validators {
        steps.push(Arc::new(ValidatorMiddleware::new(validator.clone(), error_name)));
    }

    Chain {
        steps,
        handler: Arc::clone(route.handler.handler()),
        operation: Some(Arc::clone(&route.operation)),
    }
}

/// Register every route. Returns the number of method chains added.
pub fn register_routes(
    router: &mut Router,
    routes: &[Arc<RouteMeta>],
    base_path: &str,
    error_name: &str,
) -> usize {
    for route in routes {
        let path = resolve_path(base_path, &route.path);
        debug!(method = %route.method, path = %path, "Registering route");
        router.route(route.method.clone(), &path, build_chain(route, error_name));
    }
    routes.len()
}

/// Attach one [`PathGuard`] per distinct resolved path. Returns the number of
/// guards attached.
pub fn register_path_guards(
    router: &mut Router,
    routes: &[Arc<RouteMeta>],
    base_path: &str,
    error_name: &str,
) -> usize {
    let mut by_path: Vec<(String, Vec<MethodMedia>)> = Vec::new();
    for route in routes {
        let path = resolve_path(base_path, &route.path);
        let media = MethodMedia {
            method: route.method.clone(),
            consumes: route.consumes.clone(),
            produces: route.produces.clone(),
        };
        match by_path.iter_mut().find(|(p, _)| *p == path) {
            Some((_, table)) => table.push(media),
            None => by_path.push((path, vec![media])),
        }
    }

    let count = by_path.len();
    for (path, table) in by_path {
        router.use_path(&path, Arc::new(PathGuard::new(table, error_name)));
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{handler_fn, HandlerSpec};
    use crate::middleware::{middleware_fn, Flow};
    use crate::router::MatchOptions;
    use crate::security::SecurityEntry;
    use crate::server::{Request, Response};
    use crate::spec::Parameter;
    use crate::validator::make_validator;
    use http::Method;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn route(method: Method, path: &str) -> RouteMeta {
        RouteMeta {
            method,
            path: path.to_string(),
            operation_id: None,
            handler: HandlerSpec::Single(handler_fn(|req: &mut Request| {
                Ok(Response::ok_json(json!({
                    "trail": req.extensions.get("trail").cloned().unwrap_or(Value::Null),
                    "operation": req.operation.as_deref().cloned().unwrap_or(Value::Null),
                })))
            })),
            validators: Vec::new(),
            consumes: vec!["application/json".to_string()],
            produces: Vec::new(),
            security: None,
            operation: Arc::new(json!({"operationId": "op"})),
        }
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("/", "/pets/{id}"), "/pets/:id");
        assert_eq!(resolve_path("/v1/", "/pets"), "/v1/pets");
        assert_eq!(resolve_path("/v1", "/"), "/v1");
        assert_eq!(resolve_path("", "/"), "/");
    }

    #[test]
    fn test_chain_order() {
        let mut r = route(Method::GET, "/pets");
        r.security = Some(vec![SecurityEntry {
            scheme: "open".to_string(),
            scopes: Vec::new(),
            definition: None,
            authorizer: Some(Arc::new(crate::security::FnAuthorizer::new(
                |req: &mut Request, _ctx: &crate::security::SecurityContext<'_>| {
                    req.extensions.insert("trail".into(), json!(["auth"]));
                    Ok(())
                },
            ))),
        }]);
        let pre = middleware_fn(|req: &mut Request| {
            if let Some(Value::Array(trail)) = req.extensions.get_mut("trail") {
                trail.push(json!("pre"));
            }
            Ok(Flow::Continue)
        });
        r.handler = HandlerSpec::chain(vec![pre], Arc::clone(r.handler.handler()));
        r.validators.push(
            make_validator(
                Parameter::new("limit", crate::spec::ParameterLocation::Query).with_type("integer"),
                &BTreeMap::new(),
            )
            .unwrap(),
        );

        let chain = build_chain(&r, "Api");
        assert_eq!(chain.steps.len(), 3);
        let mut req = Request::new(Method::GET, "/pets?limit=3");
        let res = chain.run(&mut req).unwrap();
        assert_eq!(res.json_body().unwrap()["trail"], json!(["auth", "pre"]));
        assert_eq!(res.json_body().unwrap()["operation"]["operationId"], json!("op"));
        assert_eq!(req.query["limit"], json!(3));
    }

    #[test]
    fn test_counts() {
        let routes: Vec<Arc<RouteMeta>> = vec![
            Arc::new(route(Method::GET, "/pets")),
            Arc::new(route(Method::POST, "/pets")),
            Arc::new(route(Method::GET, "/pets/{id}")),
        ];
        let mut router = Router::new();
        assert_eq!(register_routes(&mut router, &routes, "/api", "Api"), 3);
        assert_eq!(register_path_guards(&mut router, &routes, "/api", "Api"), 2);
        assert_eq!(router.route_count(), 3);
        assert_eq!(router.guard_count(), 2);

        let mut req = Request::new(Method::DELETE, "/api/pets");
        let err = router
            .dispatch(&mut req, MatchOptions::default())
            .unwrap()
            .unwrap_err();
        assert_eq!(err.status, 405);
        assert_eq!(err.headers[0].1, "GET, POST");
    }
}
