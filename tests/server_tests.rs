use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use swaggerize::{App, AppService, HttpServer, ServerHandle, Swaggerize};

mod common;
use common::http::{parse_parts, send_request};
use common::options;
use common::petstore;
use common::test_server::setup_may_runtime;

fn start_service(app: App) -> (ServerHandle, SocketAddr) {
    setup_may_runtime();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let handle = HttpServer(AppService::new(Arc::new(app))).start(addr).unwrap();
    handle.wait_ready().unwrap();
    (handle, addr)
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[test]
fn test_request_over_socket() {
    let mut app = App::new();
    Swaggerize::new(options(petstore()))
        .unwrap()
        .mount(&mut app, "/")
        .unwrap();
    let (handle, addr) = start_service(app);

    let resp = send_request(
        &addr,
        "GET /v1/pets/7?limit=1 HTTP/1.1\r\nHost: localhost\r\nAccept: application/json\r\n\r\n",
    );
    let (status, headers, body) = parse_parts(&resp);
    assert_eq!(status, 200);
    assert!(header(&headers, "content-type").unwrap().starts_with("application/json"));
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["handler"], json!("getPet"));
    assert_eq!(body["params"]["id"], json!(7));

    let resp = send_request(
        &addr,
        "DELETE /v1/pets HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    let (status, headers, _) = parse_parts(&resp);
    assert_eq!(status, 405);
    assert_eq!(header(&headers, "allow"), Some("GET, POST"));

    handle.stop();
}

#[test]
fn test_post_body_over_socket() {
    let mut app = App::new();
    Swaggerize::new(options(petstore()))
        .unwrap()
        .mount(&mut app, "/")
        .unwrap();
    let (handle, addr) = start_service(app);

    let payload = r#"{"name":"Rex"}"#;
    let req = format!(
        "POST /v1/pets HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nX-API-Key: secret\r\nContent-Length: {}\r\n\r\n{}",
        payload.len(),
        payload
    );
    let (status, _, body) = parse_parts(&send_request(&addr, &req));
    assert_eq!(status, 200);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["body"], json!({"name": "Rex"}));

    handle.stop();
}

#[test]
fn test_json_spaces_setting_applies_to_wire_body() {
    let mut opts = options(petstore());
    opts.express("json spaces", json!(2));
    let mut app = App::new();
    Swaggerize::new(opts).unwrap().mount(&mut app, "/").unwrap();
    let (handle, addr) = start_service(app);

    let resp = send_request(&addr, "GET /v1/pets HTTP/1.1\r\nHost: localhost\r\n\r\n");
    let (status, _, body) = parse_parts(&resp);
    assert_eq!(status, 200);
    assert!(body.contains("\n  \""), "{body}");

    handle.stop();
}
