#![allow(dead_code)]

use serde_json::{json, Value};
use swaggerize::security::FnAuthorizer;
use swaggerize::{
    handler_fn, ApiKeyAuthorizer, App, HttpError, Request, Response, SecurityContext, Swaggerize,
    SwaggerizeOptions,
};

/// Pet store document used across the integration tests.
pub fn petstore() -> Value {
    json!({
        "swagger": "2.0",
        "info": {"title": "Pet Store", "version": "1.0.0"},
        "basePath": "/v1",
        "consumes": ["application/json"],
        "produces": ["application/json"],
        "securityDefinitions": {
            "api_key": {"type": "apiKey", "name": "x-api-key", "in": "header"},
            "session": {"type": "apiKey", "name": "session", "in": "query", "x-authorize": "sessionAuth"}
        },
        "definitions": {
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "id": {"type": "integer"},
                    "name": {"type": "string"}
                }
            }
        },
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [
                        {"name": "limit", "in": "query", "type": "integer", "maximum": 100},
                        {"name": "tags", "in": "query", "type": "array", "items": {"type": "string"}, "collectionFormat": "csv"}
                    ]
                },
                "post": {
                    "operationId": "addPet",
                    "security": [{"api_key": []}, {"session": []}],
                    "parameters": [
                        {"name": "pet", "in": "body", "required": true, "schema": {"$ref": "#/definitions/Pet"}}
                    ]
                }
            },
            "/pets/{id}": {
                "parameters": [{"name": "id", "in": "path", "required": true, "type": "integer"}],
                "get": {"operationId": "getPet", "produces": ["application/json", "application/xml"]},
                "delete": {
                    "operationId": "deletePet",
                    "parameters": [{"name": "X-Request-Token", "in": "header", "required": true, "type": "string"}]
                }
            },
            "/notes": {
                "get": {
                    "operationId": "readNote",
                    "parameters": [{"name": "Content-Type", "in": "header", "type": "string", "enum": ["text/plain"]}]
                },
                "put": {"operationId": "writeNote", "consumes": ["text/plain"], "produces": ["text/plain"]}
            }
        }
    })
}

/// Handler answering with the operation name and the coerced inputs.
fn reply(name: &'static str) -> std::sync::Arc<dyn swaggerize::Handler> {
    handler_fn(move |req: &mut Request| -> Result<Response, HttpError> {
        Ok(Response::ok_json(json!({
            "handler": name,
            "params": req.params,
            "query": req.query,
            "body": req.body,
            "user": req.extensions.get("user").cloned().unwrap_or(Value::Null),
        })))
    })
}

/// Options with a handler for every operation and both authorizers.
pub fn options(api: Value) -> SwaggerizeOptions {
    let mut options = SwaggerizeOptions::new(api);
    for name in ["listPets", "addPet", "getPet", "deletePet", "readNote", "writeNote"] {
        options.handler(name, reply(name));
    }
    options.authorizer("api_key", ApiKeyAuthorizer::new(["secret"]));
    options.authorizer(
        "sessionAuth",
        FnAuthorizer::new(|req: &mut Request, _ctx: &SecurityContext<'_>| {
            match req.query.get("session").and_then(Value::as_str) {
                Some("valid") => {
                    req.extensions.insert("user".into(), json!("session-user"));
                    Ok(())
                }
                _ => Err(HttpError::new(403, "Forbidden", "Session expired.")),
            }
        }),
    );
    options
}

/// A fresh app with the pet store mounted at `mountpath`.
pub fn mounted_app(mountpath: &str) -> App {
    let mut app = App::new();
    Swaggerize::new(options(petstore()))
        .unwrap()
        .mount(&mut app, mountpath)
        .unwrap();
    app
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw request and read until the peer closes or times out.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if response_complete(&buf) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn response_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        });
        length.is_some_and(|len| body.len() >= len)
    }

    /// Status, lowercase header pairs and body of a raw response.
    pub fn parse_parts(resp: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        (status, headers, body.to_string())
    }
}

pub mod test_server {
    use std::sync::Once;

    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }
}
