#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use branchwatch_api::models::CreateBranchRequest;
use branchwatch_api::{ApiClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

async fn setup_authed() -> (MockServer, ApiClient) {
    let (server, client) = setup().await;
    client.set_token(Some(SecretString::from("tok-123".to_string())));
    (server, client)
}

fn branch_json(id: i64, name: &str, online: bool) -> serde_json::Value {
    let status = if online { "Online" } else { "Offline" };
    json!({
        "id": id,
        "restaurant": 1,
        "restaurant_name": "Kebapci",
        "name": name,
        "address": "Istiklal Cd. 5",
        "is_online": online,
        "yemeksepeti_url": "https://yemeksepeti.example/r/1",
        "yemeksepeti_status": online,
        "platform_statuses": {
            "yemeksepeti": { "url": "https://yemeksepeti.example/r/1", "status": status },
            "getir": { "url": null, "status": "URL Yok" },
            "migros": { "api_key": null, "restaurant_id": null, "status": "Bilgi Yok" },
            "trendyol": { "supplier_id": null, "api_key": null, "api_secret": null, "status": "Bilgi Yok" }
        }
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({ "email": "ops@example.com", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc",
            "user": { "email": "ops@example.com", "first_name": "Ada", "last_name": "Y", "role": "admin" }
        })))
        .mount(&server)
        .await;

    let secret = SecretString::from("hunter2".to_string());
    let session = client.login("ops@example.com", &secret).await.unwrap();

    assert_eq!(session.token.expose_secret(), "abc");
    assert_eq!(session.user.unwrap().role.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_login_wrong_password_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Şifre hatalı" })))
        .mount(&server)
        .await;

    let secret = SecretString::from("wrong".to_string());
    let result = client.login("ops@example.com", &secret).await;

    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "Şifre hatalı"),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_non_field_errors_surface_first_entry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "non_field_errors": ["Unable to log in with provided credentials."]
        })))
        .mount(&server)
        .await;

    let secret = SecretString::from("x".to_string());
    let err = client.login("ops@example.com", &secret).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Authentication failed: Unable to log in with provided credentials."
    );
}

#[tokio::test]
async fn test_login_without_token_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": {} })))
        .mount(&server)
        .await;

    let secret = SecretString::from("x".to_string());
    let result = client.login("ops@example.com", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_logout_sends_token() {
    let (server, client) = setup_authed().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(header("authorization", "Token tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "bye" })))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
}

#[tokio::test]
async fn test_register_returns_created_user() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9, "email": "new@example.com", "first_name": "New", "last_name": "User", "role": "branch_manager"
        })))
        .mount(&server)
        .await;

    let user = client
        .register(&branchwatch_api::models::RegisterRequest {
            email: "new@example.com".into(),
            password: "pw".into(),
            password2: "pw".into(),
            first_name: "New".into(),
            last_name: "User".into(),
            role: "branch_manager".into(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, Some(9));
}

// ── Restaurant tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_restaurants_sends_token_header() {
    let (server, client) = setup_authed().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/restaurants/"))
        .and(header("authorization", "Token tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "name": "Kebapci",
            "branches": [branch_json(10, "Besiktas", true)],
            "total_branches": 1,
            "online_branches": 1,
            "offline_branches": 0
        }])))
        .mount(&server)
        .await;

    let restaurants = client.list_restaurants().await.unwrap();

    assert_eq!(restaurants.len(), 1);
    assert_eq!(restaurants[0].name, "Kebapci");
    assert_eq!(restaurants[0].online_branches, 1);
    assert_eq!(restaurants[0].branches[0].name, "Besiktas");
}

#[tokio::test]
async fn test_unauthorized_is_session_expired() {
    let (server, client) = setup_authed().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/restaurants/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Invalid token."
        })))
        .mount(&server)
        .await;

    let result = client.list_restaurants().await;

    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_create_restaurant_validation_error_is_verbatim() {
    let (server, client) = setup_authed().await;

    Mock::given(method("POST"))
        .and(path("/api/restaurants/restaurants/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "name": ["This field may not be blank."]
        })))
        .mount(&server)
        .await;

    let err = client.create_restaurant("").await.unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "name: This field may not be blank.");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_restaurant_accepts_no_content() {
    let (server, client) = setup_authed().await;

    Mock::given(method("DELETE"))
        .and(path("/api/restaurants/restaurants/4/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_restaurant(4).await.unwrap();
}

// ── Branch tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_branches() {
    let (server, client) = setup_authed().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/branches/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            branch_json(10, "Besiktas", true),
            branch_json(11, "Kadikoy", false)
        ])))
        .mount(&server)
        .await;

    let branches = client.list_branches().await.unwrap();

    assert_eq!(branches.len(), 2);
    assert!(branches[0].is_online);
    assert_eq!(branches[1].platform_statuses["yemeksepeti"].status, "Offline");
    assert_eq!(branches[1].platform_statuses["migros"].status, "Bilgi Yok");
}

#[tokio::test]
async fn test_create_branch_posts_empty_optional_fields() {
    let (server, client) = setup_authed().await;

    Mock::given(method("POST"))
        .and(path("/api/restaurants/branches/"))
        .and(body_json(json!({
            "restaurant": 1,
            "name": "Moda",
            "address": "Moda Cd. 1",
            "notification_email": "ops@example.com",
            "telegram_username": "",
            "yemeksepeti_url": "",
            "getir_url": "",
            "migros_api_key": "",
            "migros_restaurant_id": "",
            "trendyol_supplier_id": "",
            "trendyol_api_key": "",
            "trendyol_api_secret": ""
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(branch_json(12, "Moda", false)))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_branch(&CreateBranchRequest {
            restaurant: 1,
            name: "Moda".into(),
            address: "Moda Cd. 1".into(),
            notification_email: "ops@example.com".into(),
            ..CreateBranchRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(created.id, 12);
}

#[tokio::test]
async fn test_check_branch_status() {
    let (server, client) = setup_authed().await;

    Mock::given(method("POST"))
        .and(path("/api/restaurants/branches/10/check_status/"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "yemeksepeti": { "status": "Online" },
            "getir": { "status": "Rate Limited" },
            "migros": { "status": "Auth Error", "message": "bad key" },
            "trendyol": { "status": "API Error" }
        })))
        .mount(&server)
        .await;

    let statuses = client.check_branch_status(10).await.unwrap();

    assert_eq!(statuses["getir"].status, "Rate Limited");
    assert_eq!(statuses["migros"].extra["message"], "bad key");
}

#[tokio::test]
async fn test_check_branch_status_server_error_message() {
    let (server, client) = setup_authed().await;

    Mock::given(method("POST"))
        .and(path("/api/restaurants/branches/10/check_status/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "message": "Error checking status: timeout",
            "traceback": "..."
        })))
        .mount(&server)
        .await;

    let err = client.check_branch_status(10).await.unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Error checking status: timeout");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_missing_branch_is_not_found() {
    let (server, client) = setup_authed().await;

    Mock::given(method("DELETE"))
        .and(path("/api/restaurants/branches/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;

    let err = client.delete_branch(99).await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup_authed().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/branches/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_branches().await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
