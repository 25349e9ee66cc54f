mod common;

use std::sync::Arc;

use axum::{
    Router,
    http::{Request, StatusCode, header},
    routing::get,
};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use stockwatch::{
    auth::Claims,
    controllers::watchlist_controller,
    models::{CurrentUser, User},
    routes,
};
use tower::ServiceExt;

use common::{MemoryStore, test_state, user};

fn watchlist_app(store: Arc<MemoryStore>) -> Router {
    let (state, _rx) = test_state(store);

    Router::new()
        .route(
            "/api/watchlist",
            get(watchlist_controller::get_watchlist).post(watchlist_controller::post_add_watchlist),
        )
        .route(
            "/api/watchlist/:symbol",
            get(watchlist_controller::get_watchlist_status).delete(watchlist_controller::delete_watchlist),
        )
        .with_state(state)
}

fn current_user(id: ObjectId) -> CurrentUser {
    CurrentUser {
        id,
        email: "test@example.com".to_string(),
        name: "Test".to_string(),
    }
}

fn post_json(uri: &str, body: &str, user: Option<CurrentUser>) -> Request<axum::body::Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    if let Some(u) = user {
        req.extensions_mut().insert(u);
    }
    req
}

fn bare(method: &str, uri: &str, user: Option<CurrentUser>) -> Request<axum::body::Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    if let Some(u) = user {
        req.extensions_mut().insert(u);
    }
    req
}

async fn response_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn watchlist_requires_a_user() {
    let app = watchlist_app(Arc::new(MemoryStore::new()));

    let res = app.oneshot(bare("GET", "/api/watchlist", None)).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(res).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn adding_twice_updates_the_same_entry() {
    let store = Arc::new(MemoryStore::new());
    let uid = ObjectId::new();

    let app = watchlist_app(store.clone());
    let res = app
        .oneshot(post_json(
            "/api/watchlist",
            r#"{"symbol":" aapl ","company":"Apple Inc","minValue":100,"maxValue":200}"#,
            Some(current_user(uid)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first = response_json(res).await;
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["symbol"], "AAPL");
    assert_eq!(first["data"]["minValue"], 100.0);

    let app = watchlist_app(store.clone());
    let res = app
        .oneshot(post_json(
            "/api/watchlist",
            r#"{"symbol":"AAPL","company":"Apple Inc","minValue":"90"}"#,
            Some(current_user(uid)),
        ))
        .await
        .unwrap();
    let second = response_json(res).await;
    assert_eq!(second["success"], true);
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(second["data"]["minValue"], 90.0);
    assert!(second["data"]["maxValue"].is_null());

    assert_eq!(store.entry_count(), 1);
}

#[tokio::test]
async fn invalid_input_is_reported_not_stored() {
    let store = Arc::new(MemoryStore::new());
    let uid = ObjectId::new();

    let cases = [
        (r#"{"symbol":"not a symbol!"}"#, "Please enter a valid symbol."),
        (r#"{"symbol":"AAPL","minValue":-5}"#, "Minimum price must be a positive number."),
        (r#"{"symbol":"AAPL","maxValue":0}"#, "Maximum price must be a positive number."),
        (
            r#"{"symbol":"AAPL","minValue":300,"maxValue":200}"#,
            "Minimum price cannot be above the maximum price.",
        ),
    ];

    for (payload, message) in cases {
        let res = watchlist_app(store.clone())
            .oneshot(post_json("/api/watchlist", payload, Some(current_user(uid))))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = response_json(res).await;
        assert_eq!(body["success"], false, "payload {payload}");
        assert_eq!(body["error"], message, "payload {payload}");
    }

    assert_eq!(store.entry_count(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let res = watchlist_app(Arc::new(MemoryStore::new()))
        .oneshot(post_json("/api/watchlist", "{not json", Some(current_user(ObjectId::new()))))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_and_status_only_show_the_callers_entries() {
    let me = user(Some("me@example.com"), Some("Me"));
    let other = user(Some("other@example.com"), Some("Other"));
    let store = Arc::new(
        MemoryStore::new()
            .with_entry(common::entry(&me, "AAPL", Some(100.0), None))
            .with_entry(common::entry(&other, "TSLA", None, Some(300.0))),
    );

    let res = watchlist_app(store.clone())
        .oneshot(bare("GET", "/api/watchlist", Some(current_user(me.id))))
        .await
        .unwrap();
    let body = response_json(res).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["symbol"], "AAPL");

    let res = watchlist_app(store.clone())
        .oneshot(bare("GET", "/api/watchlist/aapl", Some(current_user(me.id))))
        .await
        .unwrap();
    let body = response_json(res).await;
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["inWatchlist"], true);

    let res = watchlist_app(store)
        .oneshot(bare("GET", "/api/watchlist/TSLA", Some(current_user(me.id))))
        .await
        .unwrap();
    let body = response_json(res).await;
    assert_eq!(body["inWatchlist"], false);
}

#[tokio::test]
async fn delete_removes_the_entry_once() {
    let me = user(Some("me@example.com"), Some("Me"));
    let store = Arc::new(MemoryStore::new().with_entry(common::entry(&me, "AAPL", Some(100.0), None)));

    let res = watchlist_app(store.clone())
        .oneshot(bare("DELETE", "/api/watchlist/AAPL", Some(current_user(me.id))))
        .await
        .unwrap();
    let body = response_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(store.entry_count(), 0);

    let res = watchlist_app(store)
        .oneshot(bare("DELETE", "/api/watchlist/AAPL", Some(current_user(me.id))))
        .await
        .unwrap();
    let body = response_json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AAPL is not in your watchlist");
}

fn bearer_for(user: &User, secret: &str) -> String {
    let claims = Claims {
        sub: user.id.to_hex(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
    format!("Bearer {token}")
}

#[tokio::test]
async fn full_app_resolves_the_user_from_a_token() {
    let me = user(Some("me@example.com"), Some("Me"));
    let store = Arc::new(
        MemoryStore::new()
            .with_entry(common::entry(&me, "NVDA", None, Some(1000.0)))
            .with_user(me.clone()),
    );
    let (state, _rx) = test_state(store);
    let auth = bearer_for(&me, &state.settings.jwt_secret);
    let app = routes::app(state);

    let req = Request::builder()
        .method("GET")
        .uri("/api/watchlist")
        .header(header::AUTHORIZATION, auth)
        .body(axum::body::Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["data"][0]["symbol"], "NVDA");

    let res = app.clone().oneshot(bare("GET", "/api/watchlist", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.oneshot(bare("GET", "/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_app_accepts_the_session_cookie() {
    let me = user(Some("me@example.com"), Some("Me"));
    let store = Arc::new(MemoryStore::new().with_user(me.clone()));
    let (state, _rx) = test_state(store);

    let bearer = bearer_for(&me, &state.settings.jwt_secret);
    let token = bearer.trim_start_matches("Bearer ").to_string();
    let cookie = format!("{}={}", state.settings.jwt_cookie_name, token);
    let app = routes::app(state);

    let req = Request::builder()
        .method("GET")
        .uri("/api/watchlist/AAPL")
        .header(header::COOKIE, cookie)
        .body(axum::body::Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["inWatchlist"], false);
}
