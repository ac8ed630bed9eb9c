//! # Security Module
//!
//! Pluggable authorization for the schemes a document declares under
//! `securityDefinitions`.
//!
//! An [`Authorizer`] is registered per scheme name (or under the name given by
//! the definition's `x-authorize` extension). When a route declares security,
//! [`AuthorizeMiddleware`](crate::middleware::AuthorizeMiddleware) calls the
//! authorizer of each alternative in turn; the first success lets the request
//! through.
//!
//! ## Built-in authorizers
//!
//! - [`ApiKeyAuthorizer`] checks an `apiKey` definition's header or query
//!   parameter against a static key set
//! - [`FnAuthorizer`] wraps a closure
//!
//! ```ignore
//! let mut options = SwaggerizeOptions::new(api);
//! options.authorizer("api_key", ApiKeyAuthorizer::new(["secret"]));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::HttpError;
use crate::server::Request;
use crate::spec::SecurityDefinition;

/// What an authorizer is asked to check.
#[derive(Debug, Clone, Copy)]
pub struct SecurityContext<'a> {
    /// Scheme name as used in the route's `security` list
    pub scheme: &'a str,
    pub scopes: &'a [String],
    /// `None` when the document references a scheme it never defines
    pub definition: Option<&'a SecurityDefinition>,
}

/// Decides whether a request satisfies one security scheme.
///
/// Return `Err` to reject; the error's status is replaced by 401 when no
/// alternative succeeds.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, req: &mut Request, ctx: &SecurityContext<'_>) -> Result<(), HttpError>;
}

/// Authorizers keyed by scheme name or `x-authorize` value.
pub type Authorizers = HashMap<String, Arc<dyn Authorizer>>;

/// One alternative of a route's security requirement.
#[derive(Clone)]
pub struct SecurityEntry {
    pub scheme: String,
    pub scopes: Vec<String>,
    pub definition: Option<SecurityDefinition>,
    /// `None` when nothing is registered for the scheme; the entry always fails
    pub authorizer: Option<Arc<dyn Authorizer>>,
}

impl SecurityEntry {
    pub fn context(&self) -> SecurityContext<'_> {
        SecurityContext {
            scheme: &self.scheme,
            scopes: &self.scopes,
            definition: self.definition.as_ref(),
        }
    }
}

impl std::fmt::Debug for SecurityEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityEntry")
            .field("scheme", &self.scheme)
            .field("scopes", &self.scopes)
            .field("authorizer", &self.authorizer.is_some())
            .finish()
    }
}

/// Closure-backed authorizer.
pub struct FnAuthorizer<F> {
    f: F,
}

impl<F> FnAuthorizer<F>
where
    F: Fn(&mut Request, &SecurityContext<'_>) -> Result<(), HttpError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Authorizer for FnAuthorizer<F>
where
    F: Fn(&mut Request, &SecurityContext<'_>) -> Result<(), HttpError> + Send + Sync,
{
    fn authorize(&self, req: &mut Request, ctx: &SecurityContext<'_>) -> Result<(), HttpError> {
        (self.f)(req, ctx)
    }
}

/// Static API keys read from the header or query parameter named by an
/// `apiKey` definition. Without a definition it falls back to `X-API-Key`.
pub struct ApiKeyAuthorizer {
    keys: HashSet<String>,
}

impl ApiKeyAuthorizer {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    fn presented<'r>(req: &'r Request, definition: Option<&SecurityDefinition>) -> Option<&'r str> {
        let name = definition
            .and_then(|d| d.name.as_deref())
            .unwrap_or("x-api-key");
        match definition.and_then(|d| d.location.as_deref()) {
            Some("query") => req.query.get(name).and_then(|v| v.as_str()),
            _ => req.header(name),
        }
    }
}

impl Authorizer for ApiKeyAuthorizer {
    fn authorize(&self, req: &mut Request, ctx: &SecurityContext<'_>) -> Result<(), HttpError> {
        match Self::presented(req, ctx.definition) {
            Some(key) if self.keys.contains(key) => Ok(()),
            Some(_) => Err(HttpError::unauthorized("Invalid API key.")),
            None => Err(HttpError::unauthorized("Missing API key.")),
        }
    }
}
