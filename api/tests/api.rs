use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use nearby_api::{AppState, Config, build_router, geo::MAX_RADIUS_MILES};
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use tower::ServiceExt;

const SAN_FRANCISCO: &str = "lat=37.1&long=-122.5";

fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("JWT_SECRET", "integration-secret"),
        ("BCRYPT_COST", "4"),
        ("RATE_LIMIT_PER_SECOND", "1000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

fn test_app() -> Router {
    build_router(AppState::new(test_config(&[])))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let (status, _, json) = send_request(app, request).await;
    (status, json)
}

async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, JsonValue) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).expect("valid JSON response")
    };
    (status, headers, json)
}

async fn send_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Signs up a fresh user and returns `(token, user_id)`.
async fn signup(app: &Router, username: &str) -> (String, String) {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/signup",
        None,
        Some(json!({ "username": username, "password": "qqqqqq" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {json}");

    let token = json["token"].as_str().expect("token").to_string();
    let id = json["user"]["id"].as_str().expect("user id").to_string();
    (token, id)
}

async fn create_post(app: &Router, token: &str, content: &str, lat: f64, long: f64) -> JsonValue {
    let (status, json) = send(
        app,
        "POST",
        "/api/v1/posts",
        Some(token),
        Some(json!({ "content": content, "latitude": lat, "longitude": long })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {json}");
    json
}

fn assert_error(json: &JsonValue, code: u16) {
    assert_eq!(json["error"]["code"], code, "unexpected body {json}");
    assert!(json["error"]["message"].is_string(), "unexpected body {json}");
}

fn created_at(post: &JsonValue) -> DateTime<Utc> {
    serde_json::from_value(post["created_at"].clone()).expect("created_at timestamp")
}

#[tokio::test]
async fn root_heartbeat_and_health() {
    let app = test_app();

    assert_eq!(
        send_text(&app, "/").await,
        (StatusCode::OK, "Let's do this".to_string())
    );
    assert_eq!(
        send_text(&app, "/heartbeat").await,
        (StatusCode::OK, "OK".to_string())
    );

    let (status, json) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn signup_login_and_find_user() {
    let app = test_app();
    let (token, id) = signup(&app, "  TestUser42 ").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/signup",
        None,
        Some(json!({ "username": "testuser42", "password": "qqqqqq" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&json, 409);

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "TESTUSER42", "password": "qqqqqq" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["id"], id.as_str());
    assert!(json["token"].is_string());

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/login",
        None,
        Some(json!({ "username": "testuser42", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&json, 401);

    let (status, json) = send(&app, "GET", &format!("/api/v1/users/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "testuser42");
    assert!(json.get("hashed_password").is_none());

    let (status, json) = send(&app, "GET", "/api/v1/users/bogus", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid userID");

    let unknown = uuid::Uuid::new_v4();
    let (status, json) =
        send(&app, "GET", &format!("/api/v1/users/{unknown}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&json, 404);
}

#[tokio::test]
async fn signup_rejects_bad_params() {
    let app = test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/signup",
        None,
        Some(json!({ "username": "ab", "password": "qqqqqq" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&json, 400);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = test_app();

    let uri = format!("/api/v1/posts_by_location?{SAN_FRANCISCO}");
    let (status, json) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&json, 401);

    let (status, _) = send(&app, "GET", &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn geo_query_from_san_francisco_excludes_far_posts() {
    let app = test_app();
    let (token, _) = signup(&app, "skier").await;

    create_post(&app, &token, "This is a post from Squaw Valley!", 39.21, -120.24).await;
    create_post(&app, &token, "This is a post from Mammoth Lakes!", 37.61, -118.9).await;
    create_post(&app, &token, "This is a post from Aspen!", 39.18, -106.82).await;
    create_post(&app, &token, "This is a post from Whistler!", 50.12, -122.95).await;

    let uri = format!("/api/v1/posts_by_location?{SAN_FRANCISCO}&within=300");
    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let posts = json["posts"].as_array().expect("posts");
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| {
        let content = p["content"].as_str().unwrap_or_default();
        content.contains("Squaw") || content.contains("Mammoth")
    }));
    // Too few posts, so both schedule steps were applied: 300 + 25 + 100
    assert_eq!(json["radius_miles"], 425.0);
}

#[tokio::test]
async fn sparse_area_expands_to_full_schedule() {
    let app = test_app();
    let (token, _) = signup(&app, "sparse").await;

    create_post(&app, &token, "one", 37.11, -122.51).await;
    create_post(&app, &token, "two", 37.09, -122.49).await;

    let uri = format!("/api/v1/posts_by_location?{SAN_FRANCISCO}&within=5");
    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["posts"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["radius_miles"], 130.0);
}

#[tokio::test]
async fn dense_area_keeps_requested_radius_newest_first() {
    let app = test_app();
    let (token, _) = signup(&app, "dense").await;

    for i in 0..15 {
        let lat = 37.1 + f64::from(i) * 0.001;
        create_post(&app, &token, &format!("post {i}"), lat, -122.5).await;
    }

    let uri = format!("/api/v1/posts_by_location?{SAN_FRANCISCO}&within=5");
    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["radius_miles"], 5.0);
    let posts = json["posts"].as_array().expect("posts");
    assert_eq!(posts.len(), 15);
    assert!(posts.windows(2).all(|w| created_at(&w[0]) >= created_at(&w[1])));
    assert_eq!(posts[0]["content"], "post 14");
}

#[tokio::test]
async fn missing_radius_uses_configured_default() {
    let app = build_router(AppState::new(test_config(&[("DEFAULT_RADIUS_MILES", "7")])));
    let (token, _) = signup(&app, "defaults").await;

    let uri = format!("/api/v1/posts_by_location?{SAN_FRANCISCO}");
    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["posts"], json!([]));
    assert_eq!(json["radius_miles"], 132.0);
}

#[tokio::test]
async fn long_form_query_names_are_accepted() {
    let app = test_app();
    let (token, _) = signup(&app, "longform").await;

    let uri = "/api/v1/posts_by_location?latitude=37.1&longitude=-122.5&within=5";
    let (status, json) = send(&app, "GET", uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["radius_miles"], 130.0);
}

#[tokio::test]
async fn location_query_rejects_bad_params() {
    let app = test_app();
    let (token, _) = signup(&app, "badparams").await;

    for uri in [
        "/api/v1/posts_by_location?lat=37.1&within=300",
        "/api/v1/posts_by_location?long=-122.5",
        "/api/v1/posts_by_location?lat=north&long=-122.5",
        "/api/v1/posts_by_location?lat=37.1&long=-122.5&within=0",
        "/api/v1/posts_by_location?lat=137.1&long=-122.5",
    ] {
        let (status, json) = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_error(&json, 400);
    }
}

#[tokio::test]
async fn oversized_radius_is_capped_instead_of_failing() {
    let app = test_app();
    let (token, _) = signup(&app, "globetrotter").await;
    create_post(&app, &token, "sydney", -33.87, 151.21).await;

    let uri = format!("/api/v1/posts_by_location?{SAN_FRANCISCO}&within=1e306");
    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["radius_miles"].as_f64(), Some(MAX_RADIUS_MILES));
    assert_eq!(json["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleted_posts_never_show_up_nearby() {
    let app = test_app();
    let (token, _) = signup(&app, "deleter").await;

    let post = create_post(&app, &token, "short lived", 37.1, -122.5).await;
    let id = post["id"].as_str().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/post/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/posts_by_location?{SAN_FRANCISCO}&within=5");
    let (status, json) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["posts"], json!([]));
    assert_eq!(json["radius_miles"], 130.0);
}

#[tokio::test]
async fn post_create_read_delete() {
    let app = test_app();
    let (token, user_id) = signup(&app, "author").await;
    let (other_token, _) = signup(&app, "intruder").await;

    let post = create_post(
        &app,
        &token,
        "This is a test post from Tahoe city",
        39.1677,
        -120.1452,
    )
    .await;
    assert_eq!(post["owner"], user_id.as_str());
    assert_eq!(post["latitude"], 39.1677);
    assert_eq!(post["longitude"], -120.1452);
    assert_eq!(post["location"]["coordinates"], json!([-120.1452, 39.1677]));
    assert_eq!(post["comment_count"], 0);
    let id = post["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/posts",
        Some(&token),
        Some(json!({ "content": "This is an invalid test post" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&json, 400);

    let (status, json) = send(&app, "GET", &format!("/api/v1/post/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id.as_str());

    let (status, json) = send(&app, "GET", "/api/v1/post/bogusPostID", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid postID");

    let missing = uuid::Uuid::new_v4();
    let (status, json) =
        send(&app, "GET", &format!("/api/v1/post/{missing}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "That post doesn't exist");

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("/api/v1/post/{id}"),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&json, 401);

    let (status, json) =
        send(&app, "DELETE", &format!("/api/v1/post/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, _) = send(&app, "GET", &format!("/api/v1/post/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_lifecycle_updates_comment_count() {
    let app = test_app();
    let (author, _) = signup(&app, "poster").await;
    let (commenter, _) = signup(&app, "commenter").await;

    let post = create_post(&app, &author, "comment on me", 37.1, -122.5).await;
    let post_id = post["id"].as_str().unwrap().to_string();
    let comments_uri = format!("/api/v1/posts/{post_id}/comments");

    let (status, comment) = send(
        &app,
        "POST",
        &comments_uri,
        Some(&commenter),
        Some(json!({ "content": "nice spot" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["parent_post"], post_id.as_str());
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let (_, json) = send(&app, "GET", &format!("/api/v1/post/{post_id}"), Some(&author), None).await;
    assert_eq!(json["comment_count"], 1);

    let (status, json) = send(&app, "GET", &comments_uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comments"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["comments"][0]["content"], "nice spot");

    let comment_uri = format!("{comments_uri}/{comment_id}");
    let (status, json) = send(&app, "DELETE", &comment_uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&json, 401);

    let (status, json) = send(&app, "DELETE", &comment_uri, Some(&commenter), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (_, json) = send(&app, "GET", &format!("/api/v1/post/{post_id}"), Some(&author), None).await;
    assert_eq!(json["comment_count"], 0);

    let (_, json) = send(&app, "GET", &comments_uri, Some(&author), None).await;
    assert_eq!(json["comments"], json!([]));
}

#[tokio::test]
async fn cannot_comment_on_deleted_post() {
    let app = test_app();
    let (token, _) = signup(&app, "ghost").await;

    let post = create_post(&app, &token, "gone soon", 37.1, -122.5).await;
    let post_id = post["id"].as_str().unwrap().to_string();
    send(&app, "DELETE", &format!("/api/v1/post/{post_id}"), Some(&token), None).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/posts/{post_id}/comments"),
        Some(&token),
        Some(json!({ "content": "hello?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "The parent post doesn't exist");
}

#[tokio::test]
async fn rate_limiter_rejects_bursts() {
    let app = build_router(AppState::new(test_config(&[("RATE_LIMIT_PER_SECOND", "1")])));

    let (status, _) = send_text(&app, "/heartbeat").await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "GET", "/heartbeat", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_error(&json, 429);
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let app = test_app();

    for uri in ["/api/v1/nope", "/definitely/not/here"] {
        let (status, json) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_error(&json, 404);
    }
}

#[tokio::test]
async fn malformed_bodies_are_json_400() {
    let app = test_app();
    let (token, _) = signup(&app, "sloppy").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/posts",
        Some(&token),
        Some(json!({ "latitude": 37.1, "longitude": -122.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&json, 400);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, _, json) = send_request(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&json, 400);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/login")
        .body(Body::from("username=sloppy"))
        .unwrap();
    let (status, _, json) = send_request(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&json, 400);
}

#[tokio::test]
async fn unauthenticated_bad_body_is_401_not_400() {
    let app = test_app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/posts",
        None,
        Some(json!({ "latitude": 37.1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&json, 401);
}

fn insecure_request(method: &str, uri: &str, proto: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "feed.example.com");
    if let Some(proto) = proto {
        builder = builder.header("x-forwarded-proto", proto);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn plain_http_reads_redirect_to_https() {
    let app = build_router(AppState::new(test_config(&[("REDIRECT_HTTPS", "true")])));

    let request = insecure_request("GET", "/api/v1/posts_by_location?lat=1&long=2", Some("http"));
    let (status, headers, _) = send_request(&app, request).await;

    assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        headers[header::LOCATION],
        "https://feed.example.com/api/v1/posts_by_location?lat=1&long=2"
    );
}

#[tokio::test]
async fn plain_http_writes_are_refused() {
    let app = build_router(AppState::new(test_config(&[("REDIRECT_HTTPS", "true")])));

    let (status, _, json) = send_request(&app, insecure_request("POST", "/api/v1/posts", None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&json, 403);
    assert_eq!(json["error"]["message"], "Please use HTTPS when submitting data");
}

#[tokio::test]
async fn forwarded_https_and_disabled_redirect_pass_through() {
    let redirecting = build_router(AppState::new(test_config(&[("REDIRECT_HTTPS", "true")])));
    let request = insecure_request("GET", "/health", Some("https"));
    let (status, _, json) = send_request(&redirecting, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");

    let (status, _, _) = send_request(&test_app(), insecure_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
}
