// tests/client_retry_test.rs

use edx_crawler::client::RobustClient;
use edx_crawler::config::AppConfig;
use edx_crawler::error::AppError;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn test_client_does_not_retry_by_default() {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;
    let server_url = server.url();

    // 默认配置不做自动重试，服务端错误只会被请求一次
    let mock_500 = server
        .mock("GET", "/flaky")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let config = Arc::new(AppConfig::default());
    let client = RobustClient::new(config).expect("Failed to create client");

    // --- 2. Act (执行阶段) ---
    let result = client.get(format!("{}/flaky", server_url)).await;

    // --- 3. Assert (断言阶段) ---
    assert!(matches!(result, Err(AppError::Network(_))));
    mock_500.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forbidden_maps_to_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let server_url = server.url();
    let _mock = server
        .mock("GET", "/courses/private/course")
        .with_status(403)
        .create_async()
        .await;

    let client = RobustClient::new(Arc::new(AppConfig::default())).unwrap();
    let err = client
        .get_text(format!("{}/courses/private/course", server_url))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthenticationFailed(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_authenticated_headers_are_sent() {
    use reqwest::header::{HeaderMap, HeaderValue};

    let mut server = mockito::Server::new_async().await;
    let server_url = server.url();
    let mock = server
        .mock("GET", "/dashboard")
        .match_header("x-csrftoken", "abc")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let mut headers = HeaderMap::new();
    headers.insert("x-csrftoken", HeaderValue::from_static("abc"));
    let client = RobustClient::new(Arc::new(AppConfig::default()))
        .unwrap()
        .with_headers(headers);

    let body = client
        .get_text(format!("{}/dashboard", server_url))
        .await
        .unwrap();
    assert_eq!(body, "ok");
    mock.assert_async().await;
}
