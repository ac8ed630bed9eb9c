//! Request middleware.
//!
//! A route is a [`Chain`]: middleware steps followed by a handler. Steps
//! attached at mount time:
//!
//! - [`AuthorizeMiddleware`] for routes with a security requirement
//! - [`ValidatorMiddleware`](crate::validator::ValidatorMiddleware), one per
//!   parameter
//! - [`PathGuard`], once per path, ahead of every method's chain

mod auth;
mod core;
mod negotiation;

pub use auth::AuthorizeMiddleware;
pub use self::core::{middleware_fn, Chain, Flow, Middleware};
pub use negotiation::{AcceptCheck, ContentTypeCheck, MethodMedia, MethodNotAllowed, PathGuard};
