//! # swaggerize
//!
//! **swaggerize** mounts a [Swagger 2.0](https://swagger.io/specification/v2/) document on a
//! coroutine HTTP app: every operation becomes a route with authorization, parameter
//! validation and content negotiation derived from the document.
//!
//! ## Overview
//!
//! A document is loaded once, turned into route metadata, and registered on an [`App`]
//! under a base path. Requests then flow through per-path guards, per-route middleware and
//! finally the handler bound to the operation. Anything the document describes is enforced
//! before handler code runs; handlers receive already coerced parameters.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Swagger 2.0 model, document loading and route derivation
//! - **[`mount`]** - Mount options, validation and registration on an app
//! - **[`builder`]** - Per-route middleware chains and per-path guards
//! - **[`validator`]** - JSON Schema (draft 4) parameter validation and coercion
//! - **[`accessor`]** - Reading and writing parameters by location
//! - **[`security`]** - Authorizer trait and the API key authorizer
//! - **[`middleware`]** - Middleware trait, chains, authorization and negotiation guards
//! - **[`router`]** - Radix-tree path matching with settings-driven options
//! - **[`server`]** - The app, request/response types and the `may_minihttp` server
//! - **[`scaffold`]** - Handler and model stub generation
//! - **[`cli`]** - The `swaggerize` binary
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant App
//!     participant Router
//!     participant Guard as PathGuard
//!     participant Chain
//!     participant Handler
//!
//!     Client->>Server: HTTP request
//!     Server->>App: Request::from_parts
//!     App->>Router: dispatch(method, path)
//!     Router->>Guard: 405 / 415 / 406 checks
//!     Guard-->>Router: Continue
//!     Router->>Chain: authorize, pre-handlers, validators
//!     Chain->>Handler: handle(&mut Request)
//!     Handler-->>App: Response
//!     App-->>Server: Response (or error handler output)
//!     Server-->>Client: HTTP response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use swaggerize::{handler_fn, App, HttpServer, AppService, Response, Swaggerize, SwaggerizeOptions};
//! use std::sync::Arc;
//!
//! let mut options = SwaggerizeOptions::new("petstore.yaml");
//! options.handler("listPets", handler_fn(|_req| Ok(Response::ok_json(serde_json::json!([])))));
//!
//! let mut app = App::new();
//! Swaggerize::new(options)?.mount(&mut app, "/")?;
//! HttpServer(AppService::new(Arc::new(app))).start("0.0.0.0:8080")?.join().ok();
//! ```
//!
//! ## Runtime Considerations
//!
//! Requests run on `may` coroutines. Handlers must not block the OS thread for long, and
//! deep recursion needs a larger coroutine stack (`SWAGGERIZE_STACK_SIZE`, see
//! [`runtime_config`]).

pub mod accessor;
pub mod builder;
pub mod cli;
pub mod echo;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod mount;
pub mod router;
pub mod runtime_config;
pub mod scaffold;
pub mod security;
pub mod server;
pub mod spec;
pub mod validator;

pub use error::{ConfigError, HttpError, DEFAULT_ERROR_NAME};
pub use handlers::{handler_fn, Handler, HandlerRegistry, HandlerSpec};
pub use middleware::{middleware_fn, Flow, Middleware};
pub use mount::{MountConfig, MountedApi, Swaggerize, SwaggerizeOptions};
pub use security::{ApiKeyAuthorizer, Authorizer, Authorizers, FnAuthorizer, SecurityContext};
pub use server::{App, AppService, ErrorHandler, HttpServer, Request, Response, ServerHandle};
pub use spec::{ApiDocument, ApiSource, RouteMeta};
