use http::Method;
use serde_json::json;
use swaggerize::validator::MISSING_VALUE_TITLE;
use swaggerize::Request;

mod common;
use common::mounted_app;

#[test]
fn test_query_parameters_are_coerced() {
    let app = mounted_app("/");
    let res = app.handle(Request::new(Method::GET, "/v1/pets?limit=5&tags=cat,%20dog"));
    assert_eq!(res.status, 200);
    let body = res.json_body().unwrap();
    assert_eq!(body["query"]["limit"], json!(5));
    assert_eq!(body["query"]["tags"], json!(["cat", "dog"]));
}

#[test]
fn test_path_parameter_is_coerced() {
    let app = mounted_app("/");
    let res = app.handle(Request::new(Method::GET, "/v1/pets/42"));
    assert_eq!(res.status, 200);
    assert_eq!(res.json_body().unwrap()["params"]["id"], json!(42));
}

#[test]
fn test_invalid_values_are_bad_request() {
    let app = mounted_app("/");
    for url in ["/v1/pets?limit=500", "/v1/pets?limit=many", "/v1/pets/abc"] {
        let res = app.handle(Request::new(Method::GET, url));
        assert_eq!(res.status, 400, "{url}");
        let error = &res.json_body().unwrap()["errors"][0];
        assert_eq!(error["title"], json!("Bad Request"), "{url}");
    }
}

#[test]
fn test_detail_names_the_parameter() {
    let app = mounted_app("/");
    let res = app.handle(Request::new(Method::GET, "/v1/pets?limit=500"));
    let detail = res.json_body().unwrap()["errors"][0]["detail"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(detail.starts_with("limit"), "{detail}");
}

#[test]
fn test_missing_required_header() {
    let app = mounted_app("/");
    let res = app.handle(Request::new(Method::DELETE, "/v1/pets/1"));
    assert_eq!(res.status, 400);
    assert_eq!(
        res.json_body().unwrap()["errors"][0]["title"],
        json!(MISSING_VALUE_TITLE)
    );

    let req = Request::new(Method::DELETE, "/v1/pets/1").with_header("x-request-token", "t-1");
    assert_eq!(app.handle(req).status, 200);
}

#[test]
fn test_content_type_parameter_failure_is_415() {
    let app = mounted_app("/");
    let req = Request::new(Method::GET, "/v1/notes").with_header("Content-Type", "application/json");
    assert_eq!(app.handle(req).status, 415);

    let req = Request::new(Method::GET, "/v1/notes").with_header("Content-Type", "text/plain");
    assert_eq!(app.handle(req).status, 200);
}

#[test]
fn test_body_validated_against_definitions() {
    let app = mounted_app("/");
    let post = |body: serde_json::Value| {
        Request::new(Method::POST, "/v1/pets")
            .with_header("X-API-Key", "secret")
            .with_json(body)
    };

    let res = app.handle(post(json!({"id": 1, "name": "Rex"})));
    assert_eq!(res.status, 200);
    assert_eq!(res.json_body().unwrap()["body"]["name"], json!("Rex"));

    let res = app.handle(post(json!({"id": 1})));
    assert_eq!(res.status, 400);
    assert_eq!(res.json_body().unwrap()["errors"][0]["title"], json!("Bad Request"));
}

#[test]
fn test_missing_required_body() {
    let app = mounted_app("/");
    let req = Request::new(Method::POST, "/v1/pets").with_header("X-API-Key", "secret");
    let res = app.handle(req);
    assert_eq!(res.status, 400);
    assert_eq!(
        res.json_body().unwrap()["errors"][0]["title"],
        json!(MISSING_VALUE_TITLE)
    );
}
