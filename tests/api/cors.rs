use anyhow::Result;
use reqwest::{header, Method, StatusCode};
use serde_json::json;

use crate::helpers::{spawn_test_app, ALLOWED_ORIGIN};

#[tokio::test]
async fn preflight_from_listed_origin_echoes_it() -> Result<()> {
    let app = spawn_test_app().await?;
    app.mock_provider_success(0).await;

    let res = app
        .http_client
        .request(Method::OPTIONS, app.subscribe_url())
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ALLOWED_ORIGIN)
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|v| v.to_str().ok()),
        Some("POST, OPTIONS")
    );
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
    // Pre-flight never reaches the rate limiter.
    assert!(!headers.contains_key("x-ratelimit-remaining"));
    assert!(res.text().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn unlisted_origin_gets_no_allow_origin_header() -> Result<()> {
    let app = spawn_test_app().await?;
    app.mock_provider_success(1).await;

    let preflight = app
        .http_client
        .request(Method::OPTIONS, app.subscribe_url())
        .header(header::ORIGIN, "https://evil.example")
        .send()
        .await?;
    assert!(!preflight
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let post = app
        .http_client
        .post(app.subscribe_url())
        .header(header::ORIGIN, "https://evil.example")
        .json(&json!({ "email": "user@example.com" }))
        .send()
        .await?;
    assert!(!post
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    Ok(())
}

#[tokio::test]
async fn error_responses_keep_cors_headers() -> Result<()> {
    let app = spawn_test_app().await?;
    app.mock_provider_success(0).await;

    let res = app
        .http_client
        .post(app.subscribe_url())
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .json(&json!({ "email": "nope" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ALLOWED_ORIGIN)
    );

    Ok(())
}
