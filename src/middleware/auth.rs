use std::sync::Arc;
use tracing::debug;

use super::{Flow, Middleware};
use crate::error::HttpError;
use crate::security::SecurityEntry;
use crate::server::Request;

/// Authorizes a request against a route's security alternatives.
///
/// Alternatives are tried in order and the first success wins. When all fail
/// the first failure is returned with status 401.
pub struct AuthorizeMiddleware {
    entries: Arc<Vec<SecurityEntry>>,
    error_name: String,
}

impl AuthorizeMiddleware {
    pub fn new(entries: Vec<SecurityEntry>, error_name: &str) -> Self {
        Self {
            entries: Arc::new(entries),
            error_name: error_name.to_string(),
        }
    }
}

impl Middleware for AuthorizeMiddleware {
    fn call(&self, req: &mut Request) -> Result<Flow, HttpError> {
        let mut failures: Vec<HttpError> = Vec::new();

        for entry in self.entries.iter() {
            let Some(authorizer) = &entry.authorizer else {
                failures.push(HttpError::unauthorized("Unauthorized."));
                continue;
            };
            req.required_scopes = entry.scopes.clone();
            match authorizer.authorize(req, &entry.context()) {
                Ok(()) => {
                    debug!(request_id = %req.id, scheme = %entry.scheme, "Authorized");
                    return Ok(Flow::Continue);
                }
                Err(e) => {
                    debug!(
                        request_id = %req.id,
                        scheme = %entry.scheme,
                        detail = %e.detail,
                        "Authorization failed"
                    );
                    failures.push(e);
                }
            }
        }

        let first = failures
            .into_iter()
            .next()
            .unwrap_or_else(|| HttpError::unauthorized("Unauthorized."));
        Err(first.with_status(401).with_name(&self.error_name))
    }
}
