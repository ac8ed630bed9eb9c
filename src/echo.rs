use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::HttpError;
use crate::handlers::{handler_fn, Handler};
use crate::server::{Request, Response};

/// Handler that answers with what it received after validation and coercion.
/// `swaggerize serve` binds it to every operation without a real handler.
pub fn echo_handler() -> Arc<dyn Handler> {
    handler_fn(echo)
}

fn echo(req: &mut Request) -> Result<Response, HttpError> {
    let operation_id = req
        .operation
        .as_deref()
        .and_then(|op| op.get("operationId"))
        .cloned()
        .unwrap_or(Value::Null);
    Ok(Response::ok_json(json!({
        "operationId": operation_id,
        "method": req.method.as_str(),
        "path": req.path,
        "params": req.params,
        "query": req.query,
        "body": req.body,
    })))
}
