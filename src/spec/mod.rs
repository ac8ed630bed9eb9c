//! Swagger 2.0 document model, loading and route discovery.
mod build;
mod load;
mod types;

pub use build::{build_routes, resolve_parameter};
pub use load::{load_document, parse_document, ApiSource};
pub use types::*;
