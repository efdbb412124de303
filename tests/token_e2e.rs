//! Token-gated routes.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use glutton::{ComponentRegistry, GluttonServer};

use common::{client, config, file_route, start_server, url};

#[tokio::test]
async fn test_token_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut route = file_route("save", dir.path());
    route.use_token = true;
    let (addr, shutdown) = start_server(config(vec![route]), &ComponentRegistry::with_builtins()).await;
    let client = client();

    let res = client.get(url(addr, "/v1/glutton/save/token")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let token = res.text().await.unwrap();
    assert!(!token.is_empty());

    let res = client
        .post(url(addr, "/v1/glutton/save"))
        .header("token", &token)
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(std::fs::read_to_string(dir.path().join("out_1")).unwrap().contains("hello"));

    let res = client
        .post(url(addr, "/v1/glutton/save"))
        .header("token", "garbage")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 412);
    assert!(!dir.path().join("out_2").exists());

    shutdown.trigger();
}

#[tokio::test]
async fn test_token_bound_to_route() {
    let dir = tempfile::tempdir().unwrap();
    let mut a = file_route("a", &dir.path().join("a"));
    a.use_token = true;
    let mut b = file_route("b", &dir.path().join("b"));
    b.use_token = true;
    let router = GluttonServer::new(config(vec![a, b]), &ComponentRegistry::with_builtins())
        .unwrap()
        .router();

    let res = router
        .clone()
        .oneshot(Request::get("/v1/glutton/a/token").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let token = String::from_utf8(bytes.to_vec()).unwrap();

    let res = router
        .clone()
        .oneshot(
            Request::post("/v1/glutton/b")
                .header("token", &token)
                .body(Body::from("x"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);

    let res = router
        .oneshot(
            Request::post("/v1/glutton/a")
                .header("token", &token)
                .body(Body::from("x"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut route = file_route("save", dir.path());
    route.use_token = true;
    let router = GluttonServer::new(config(vec![route]), &ComponentRegistry::with_builtins())
        .unwrap()
        .router();

    let res = router
        .oneshot(Request::post("/v1/glutton/save").body(Body::from("x")).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_gate_runs_before_redirect() {
    let dir = tempfile::tempdir().unwrap();
    let mut route = file_route("save", dir.path());
    route.use_token = true;
    route.redirect = Some("/thanks".to_string());
    let router = GluttonServer::new(config(vec![route]), &ComponentRegistry::with_builtins())
        .unwrap()
        .router();

    let res = router
        .oneshot(
            Request::post("/v1/glutton/save")
                .header("token", "garbage")
                .body(Body::from("x"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PRECONDITION_FAILED);
    assert!(!res.headers().contains_key("location"));
}

#[tokio::test]
async fn test_ungated_route_has_no_token_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let router = GluttonServer::new(config(vec![file_route("open", dir.path())]), &ComponentRegistry::with_builtins())
        .unwrap()
        .router();

    let res = router
        .oneshot(Request::get("/v1/glutton/open/token").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
