#![cfg(feature = "axum")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use rest_errors::web::{
    FormPayload, Params, Payload, Segments, error_mapping_middleware, method_not_allowed_fallback,
    not_found_fallback,
};
use rest_errors::{
    CommonErrorResponse, Error, ErrorCategory, ErrorMapper, Failure, MapperConfig,
    ValidationViolation,
};
use serde::Deserialize;
use tower::ServiceExt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum Currency {
    Usd,
    Eur,
    Gbp,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Payment {
    currency: Currency,
    amount: u32,
}

async fn create_payment(Payload(payment): Payload<Payment>) -> Result<&'static str, Failure> {
    match payment.currency {
        Currency::Usd | Currency::Eur | Currency::Gbp => Ok("created"),
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    page: u32,
}

async fn list_payments(Params(query): Params<Page>) -> String {
    format!("page {}", query.page)
}

#[derive(Debug, Deserialize)]
struct OrderPath {
    id: u32,
}

async fn get_order(Segments(order): Segments<OrderPath>) -> String {
    format!("order {}", order.id)
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Subscription {
    email: String,
    tier: u8,
}

async fn subscribe(FormPayload(form): FormPayload<Subscription>) -> &'static str {
    if form.tier > 3 { "premium" } else { "basic" }
}

async fn get_user() -> Result<&'static str, Failure> {
    Err(Failure::msg("user 7 is locked")
        .attach(ErrorCategory::Conflict, [Error::new("USER_LOCKED")]))
}

async fn register() -> Result<&'static str, Failure> {
    Err(Failure::violations(vec![ValidationViolation::new(
        "user.email",
        "must be a well-formed email address",
    )]))
}

async fn crash() -> Result<&'static str, Failure> {
    Err(Failure::msg("null pointer in billing"))
}

fn app() -> Router {
    let mapper = Arc::new(ErrorMapper::new(MapperConfig {
        correlation_header: "x-correlation-id".to_owned(),
        ..MapperConfig::default()
    }));
    Router::new()
        .route("/payments", post(create_payment).get(list_payments))
        .route("/orders/{id}", get(get_order))
        .route("/subscribe", post(subscribe))
        .route("/users/7", get(get_user))
        .route("/register", post(register))
        .route("/crash", get(crash))
        .fallback(not_found_fallback)
        .method_not_allowed_fallback(method_not_allowed_fallback)
        .layer(axum::middleware::from_fn_with_state(mapper, error_mapping_middleware))
}

async fn send(request: Request<Body>) -> (StatusCode, CommonErrorResponse) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(response.headers()["content-type"], "application/json");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-correlation-id", "req-123")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn bad_enum_value_in_body() {
    let request = json_post("/payments", r#"{"currency":"INVALID_VALUE","amount":5}"#);
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.correlation_id, "req-123");
    assert_eq!(body.errors[0].code, "VALIDATION");
    assert_eq!(body.errors[0].location.as_deref(), Some("currency"));
    assert_eq!(
        body.errors[0].message,
        "Invalid value for currency: INVALID_VALUE. Must be one of: USD, EUR, GBP"
    );
}

#[tokio::test]
async fn wrong_scalar_type_in_body() {
    let request = json_post("/payments", r#"{"currency":"USD","amount":"lots"}"#);
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].location.as_deref(), Some("amount"));
    assert_eq!(
        body.errors[0].message,
        "Invalid value 'lots' for field 'amount' of type u32"
    );
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let (status, body) = send(json_post("/payments", r#"{"currency":"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].code, "VALIDATION");
    assert!(body.errors[0].location.is_none());
}

#[tokio::test]
async fn missing_content_type_is_unsupported_media_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/payments")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].message, "Media Type Not Supported");
}

#[tokio::test]
async fn handler_metadata_sets_category() {
    let request = Request::builder().uri("/users/7").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.errors[0].code, "USER_LOCKED");
    assert_eq!(body.errors[0].message, "user 7 is locked");
    assert_eq!(body.http_status_code, 409);
}

#[tokio::test]
async fn violations_keep_field_paths() {
    let (status, body) = send(json_post("/register", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].location.as_deref(), Some("user.email"));
    assert_eq!(body.errors[0].message, "must be a well-formed email address");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.errors[0].code, "NOT_FOUND");
    assert_eq!(body.errors[0].message, "Resource Not Found");
    assert!(uuid_like(&body.correlation_id));
}

#[tokio::test]
async fn wrong_method_is_validation() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/users/7")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].message, "Method Not Allowed");
}

#[tokio::test]
async fn unexpected_failure_is_500() {
    let request = Request::builder().uri("/crash").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.errors[0].code, "UNEXPECTED");
    assert_eq!(body.errors[0].message, "null pointer in billing");
}

#[tokio::test]
async fn success_passes_through() {
    let request = json_post("/payments", r#"{"currency":"EUR","amount":5}"#);
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"created");
}

#[tokio::test]
async fn bad_query_parameter_is_located() {
    let request = Request::builder().uri("/payments?page=abc").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].code, "VALIDATION");
    assert_eq!(body.errors[0].location.as_deref(), Some("page"));
}

#[tokio::test]
async fn missing_query_parameter_is_validation() {
    let request = Request::builder().uri("/payments").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].code, "VALIDATION");
    assert!(body.errors[0].location.is_none());
}

#[tokio::test]
async fn good_query_passes_through() {
    let request = Request::builder().uri("/payments?page=2").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"page 2");
}

#[tokio::test]
async fn bad_path_segment_is_a_scalar_mismatch() {
    let request = Request::builder().uri("/orders/abc").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].code, "VALIDATION");
    assert_eq!(body.errors[0].location.as_deref(), Some("id"));
    assert_eq!(body.errors[0].message, "Invalid value 'abc' for field 'id' of type u32");
}

#[tokio::test]
async fn bad_form_field_is_located() {
    let request = Request::builder()
        .method("POST")
        .uri("/subscribe")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("email=a%40b.c&tier=many"))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].code, "VALIDATION");
    assert_eq!(body.errors[0].location.as_deref(), Some("tier"));
}

#[tokio::test]
async fn form_without_content_type_is_unsupported_media_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/subscribe")
        .header("content-type", "text/plain")
        .body(Body::from("email=a%40b.c&tier=1"))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.errors[0].message, "Media Type Not Supported");
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|&c| c == '-').count() == 4
}
