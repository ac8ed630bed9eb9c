use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::radix::{MatchOptions, PathEntry, RadixRouter};
use crate::error::HttpError;
use crate::handlers::Handler;
use crate::middleware::{Chain, Flow, Middleware};
use crate::server::{Request, Response};

static TEMPLATE_PARAM: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\{([^}]+)\}").unwrap()
});

/// Convert a Swagger path template (`/pets/{id}`) to router syntax (`/pets/:id`).
pub fn from_template(template: &str) -> String {
    TEMPLATE_PARAM.replace_all(template, ":$1").into_owned()
}

/// Path router with per-path guards and per-method chains.
#[derive(Clone, Default)]
pub struct Router {
    tree: RadixRouter,
    route_count: usize,
    guard_count: usize,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chain for `method` on `path` (router syntax).
    pub fn route(&mut self, method: Method, path: &str, chain: Chain) {
        let entry = self.tree.entry_mut(path);
        let chain = Arc::new(chain);
        match entry.methods.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => {
                slot.1 = chain;
                debug!(method = %method, path = %path, "Route replaced");
            }
            None => {
                entry.methods.push((method.clone(), chain));
                self.route_count += 1;
                debug!(method = %method, path = %path, "Route registered");
            }
        }
    }

    /// Convenience for a GET route with no middleware.
    pub fn get(&mut self, path: &str, handler: Arc<dyn Handler>) {
        self.route(Method::GET, path, Chain::new(handler));
    }

    /// Attach middleware that runs for every request matching `path`, before
    /// the method's chain.
    pub fn use_path(&mut self, path: &str, guard: Arc<dyn Middleware>) {
        self.tree.entry_mut(path).guards.push(guard);
        self.guard_count += 1;
        debug!(path = %path, "Path middleware attached");
    }

    /// Number of method chains registered.
    pub fn route_count(&self) -> usize {
        self.route_count
    }

    /// Number of path-level middleware attached.
    pub fn guard_count(&self) -> usize {
        self.guard_count
    }

    /// `(method, pattern)` for every registered chain.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.tree
            .entries()
            .into_iter()
            .flat_map(|entry| {
                entry
                    .methods
                    .iter()
                    .map(|(m, _)| (m.clone(), entry.pattern.clone()))
            })
            .collect()
    }

    /// Path entry matching a concrete request path, with captured parameters.
    pub fn find(&self, path: &str, opts: MatchOptions) -> Option<(&PathEntry, Vec<(String, String)>)> {
        self.tree.search(path, opts)
    }

    /// Run the request through the matching path.
    ///
    /// Returns `None` when nothing handles it: no path matched, or the path
    /// matched but has neither a guard that rejects the method nor a chain
    /// for it.
    pub fn dispatch(
        &self,
        req: &mut Request,
        opts: MatchOptions,
    ) -> Option<Result<Response, HttpError>> {
        let (entry, params) = self.find(&req.path, opts)?;

        req.params = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        for guard in &entry.guards {
            match guard.call(req) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Respond(res)) => return Some(Ok(res)),
                Err(e) => return Some(Err(e)),
            }
        }

        let chain = entry.chain_for(&req.method)?;
        debug!(
            request_id = %req.id,
            method = %req.method,
            pattern = %entry.pattern,
            "Route matched"
        );
        Some(chain.run(req))
    }

    /// Log every registered route.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        info!(count = routes.len(), "Registered routes");
        for (method, pattern) in routes {
            info!(method = %method, pattern = %pattern, "Route");
        }
    }
}
