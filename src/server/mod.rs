//! Host framework: request and response types, the [`App`], and the
//! `may_minihttp` bridge that serves it.

mod app;
mod http_server;
mod request;
mod response;
mod service;

pub use app::{App, ErrorHandler, JsonErrorHandler};
pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_multipart, parse_query, Request, UploadedFile};
pub use response::{write_response, Body, Response};
pub use service::AppService;
