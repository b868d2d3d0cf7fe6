use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use signup_guard::{config::Environment, csrf::CsrfToken};

use crate::helpers::{spawn_test_app_with, API_KEY, FORM_ID};

#[tokio::test]
async fn production_accepts_matching_double_submit() -> Result<()> {
    let app = spawn_test_app_with(Environment::Production, Some(API_KEY), Some(FORM_ID)).await?;
    app.mock_provider_success(1).await;

    let token = CsrfToken::generate();
    let res = app
        .post_with_csrf(
            Some(token.as_ref()),
            Some(token.as_ref()),
            &json!({ "email": "user@example.com" }),
        )
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn production_rejects_every_bad_combination_generically() -> Result<()> {
    let app = spawn_test_app_with(Environment::Production, Some(API_KEY), Some(FORM_ID)).await?;
    app.mock_provider_success(0).await;

    let token = CsrfToken::generate();
    let other = CsrfToken::generate();
    let short = "a".repeat(31);

    let cases: [(Option<&str>, Option<&str>, &str); 6] = [
        (None, None, "both missing"),
        (Some(token.as_ref()), None, "header missing"),
        (None, Some(token.as_ref()), "cookie missing"),
        (Some(token.as_ref()), Some(other.as_ref()), "mismatch"),
        (Some(short.as_str()), Some(short.as_str()), "too short"),
        (Some(token.as_ref()), Some(""), "empty header"),
    ];

    for (cookie, header, description) in cases {
        let res = app
            .post_with_csrf(cookie, header, &json!({ "email": "user@example.com" }))
            .await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{description}");
        // CSRF runs before the rate limiter.
        assert!(!res.headers().contains_key("x-ratelimit-remaining"));
        let body: Value = res.json().await?;
        assert_eq!(body, json!({ "error": "Invalid request" }), "{description}");
    }

    Ok(())
}

#[tokio::test]
async fn local_mode_skips_csrf() -> Result<()> {
    let app = spawn_test_app_with(Environment::Local, Some(API_KEY), Some(FORM_ID)).await?;
    app.mock_provider_success(1).await;

    let res = app
        .post_with_csrf(None, None, &json!({ "email": "user@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}
