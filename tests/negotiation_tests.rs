use http::Method;
use serde_json::json;
use swaggerize::server::Body;
use swaggerize::Request;

mod common;
use common::mounted_app;

#[test]
fn test_unknown_method_is_405_with_allow() {
    let app = mounted_app("/");
    let res = app.handle(Request::new(Method::DELETE, "/v1/pets"));
    assert_eq!(res.status, 405);
    assert_eq!(res.header("Allow"), Some("GET, POST"));
    let body = res.json_body().unwrap();
    assert_eq!(body["errors"][0]["title"], json!("Method Not Allowed"));

    let res = app.handle(Request::new(Method::POST, "/v1/pets/1"));
    assert_eq!(res.status, 405);
    assert_eq!(res.header("Allow"), Some("GET, DELETE"));
}

#[test]
fn test_unsupported_content_type_on_post() {
    let app = mounted_app("/");
    let req = Request::new(Method::POST, "/v1/pets")
        .with_header("Content-Type", "text/xml")
        .with_header("X-API-Key", "secret")
        .with_body("<pet/>");
    let res = app.handle(req);
    assert_eq!(res.status, 415);
    assert_eq!(
        res.json_body().unwrap()["errors"][0]["title"],
        json!("Unsupported Media Type")
    );
}

#[test]
fn test_content_type_matching_ignores_case_and_parameters() {
    let app = mounted_app("/");
    let req = Request::new(Method::POST, "/v1/pets")
        .with_header("Content-Type", "Application/JSON; charset=utf-8")
        .with_header("X-API-Key", "secret")
        .with_json(json!({"name": "Rex"}));
    assert_eq!(app.handle(req).status, 200);

    let req = Request::new(Method::PUT, "/v1/notes")
        .with_header("Content-Type", "text/plain")
        .with_body("remember the milk");
    assert_eq!(app.handle(req).status, 200);
}

#[test]
fn test_get_ignores_content_type() {
    let app = mounted_app("/");
    let req = Request::new(Method::GET, "/v1/pets").with_header("Content-Type", "text/xml");
    assert_eq!(app.handle(req).status, 200);
}

#[test]
fn test_not_acceptable() {
    let app = mounted_app("/");
    let req = Request::new(Method::GET, "/v1/pets").with_header("Accept", "text/html");
    let res = app.handle(req);
    assert_eq!(res.status, 406);
    assert_eq!(res.json_body().unwrap()["errors"][0]["status"], json!(406));
}

#[test]
fn test_accept_variants() {
    let app = mounted_app("/");
    for accept in ["*/*", "text/html, application/json;q=0.9", "application/xml"] {
        let req = Request::new(Method::GET, "/v1/pets/9").with_header("Accept", accept);
        assert_eq!(app.handle(req).status, 200, "Accept: {accept}");
    }
}

#[test]
fn test_head_follows_get() {
    let app = mounted_app("/");
    let res = app.handle(Request::new(Method::HEAD, "/v1/pets"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body, Body::Empty);

    let req = Request::new(Method::HEAD, "/v1/pets").with_header("Accept", "text/html");
    assert_eq!(app.handle(req).status, 406);
}

#[test]
fn test_guard_runs_before_authorization() {
    let app = mounted_app("/");
    // no credentials, but the media type is rejected first
    let req = Request::new(Method::POST, "/v1/pets")
        .with_header("Content-Type", "text/xml")
        .with_body("<pet/>");
    assert_eq!(app.handle(req).status, 415);
}
