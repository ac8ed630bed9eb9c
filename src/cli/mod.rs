//! # CLI Module
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Mount a document on a fresh app and serve it. Operations without a
//! handler echo the validated request back:
//!
//! ```bash
//! swaggerize serve --api petstore.yaml --addr 127.0.0.1:8080
//! swaggerize serve --config mount.yaml
//! ```
//!
//! ### `routes`
//!
//! Print the method, router pattern and operationId of every route:
//!
//! ```bash
//! swaggerize routes --api petstore.yaml --format json
//! ```
//!
//! ### `scaffold`
//!
//! Write handler and model stubs, never touching existing files:
//!
//! ```bash
//! swaggerize scaffold --api petstore.yaml --output src
//! ```
//!
//! Logging is configured through `SWAGGERIZE_LOG_*`, the server through
//! `SWAGGERIZE_STACK_SIZE` and `SWAGGERIZE_ADDR`.

mod commands;


pub use commands::{run_cli, summarize, Cli, Commands, RoutesFormat};
