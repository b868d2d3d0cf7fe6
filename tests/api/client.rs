//! The submission controller against a real running app.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use signup_guard::{
    client::{
        ClientError, FormView, MessageKind, StatusMessage, SubscribeController, Timings,
        SUBSCRIBED_LABEL,
    },
    config::Environment,
};
use tower_cookies::cookie::CookieJar;

use crate::helpers::{spawn_test_app_with, API_KEY, FORM_ID};

#[derive(Debug, Default)]
struct Page {
    desktop_input: String,
    mobile_input: String,
    website: String,
    message: Option<StatusMessage>,
    labels: Vec<String>,
    disabled: bool,
}

#[derive(Debug, Default)]
struct TestPage(Mutex<Page>);

impl TestPage {
    fn new(desktop: &str, mobile: &str) -> Self {
        Self(Mutex::new(Page {
            desktop_input: desktop.to_string(),
            mobile_input: mobile.to_string(),
            labels: vec!["Subscribe".to_string(), "Subscribe".to_string()],
            ..Default::default()
        }))
    }

    fn page(&self) -> std::sync::MutexGuard<'_, Page> {
        self.0.lock().unwrap()
    }
}

impl FormView for TestPage {
    fn email_inputs(&self) -> Vec<String> {
        let page = self.page();
        vec![page.desktop_input.clone(), page.mobile_input.clone()]
    }
    fn honeypot(&self) -> String {
        self.page().website.clone()
    }
    fn clear_inputs(&self) {
        let mut page = self.page();
        page.desktop_input.clear();
        page.mobile_input.clear();
    }
    fn show_message(&self, message: &StatusMessage) {
        self.page().message = Some(message.clone());
    }
    fn hide_message(&self) {
        self.page().message = None;
    }
    fn button_labels(&self) -> Vec<String> {
        self.page().labels.clone()
    }
    fn set_buttons(&self, labels: &[String], disabled: bool) {
        let mut page = self.page();
        page.labels = labels.to_vec();
        page.disabled = disabled;
    }
}

fn fast_timings() -> Timings {
    Timings {
        restore_buttons: Duration::from_millis(20),
        hide_message: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn controller_subscribes_through_production_guard() -> Result<()> {
    let app = spawn_test_app_with(Environment::Production, Some(API_KEY), Some(FORM_ID)).await?;
    app.mock_provider_success(1).await;

    let page = Arc::new(TestPage::new("", "Reader@Example.com"));
    let jar = Arc::new(Mutex::new(CookieJar::new()));
    let controller =
        SubscribeController::new(app.subscribe_url(), page.clone(), jar)?.with_timings(fast_timings());

    let submitted = controller.submit().await?;
    assert_eq!(submitted.message, "Subscribed successfully");
    {
        let page = page.page();
        assert_eq!(page.labels, vec![SUBSCRIBED_LABEL; 2]);
        assert_eq!(
            page.message.as_ref().map(|m| m.kind),
            Some(MessageKind::Success)
        );
        assert!(page.desktop_input.is_empty() && page.mobile_input.is_empty());
    }

    submitted.settle.await?;
    let page = page.page();
    assert_eq!(page.labels, vec!["Subscribe"; 2]);
    assert!(!page.disabled);
    assert!(page.message.is_none());

    Ok(())
}

#[tokio::test]
async fn controller_honeypot_gets_the_same_success() -> Result<()> {
    let app = spawn_test_app_with(Environment::Production, Some(API_KEY), Some(FORM_ID)).await?;
    app.mock_provider_success(0).await;

    let page = Arc::new(TestPage::new("bot@spam.example", ""));
    page.page().website = "http://spam.example".to_string();
    let jar = Arc::new(Mutex::new(CookieJar::new()));
    let controller =
        SubscribeController::new(app.subscribe_url(), page.clone(), jar)?.with_timings(fast_timings());

    let submitted = controller.submit().await?;
    assert_eq!(submitted.message, "Subscribed successfully");

    Ok(())
}

#[tokio::test]
async fn controller_shows_server_error_and_reenables() -> Result<()> {
    let app = spawn_test_app_with(Environment::Production, None, None).await?;
    app.mock_provider_success(0).await;

    let page = Arc::new(TestPage::new("reader@example.com", ""));
    let jar = Arc::new(Mutex::new(CookieJar::new()));
    let controller =
        SubscribeController::new(app.subscribe_url(), page.clone(), jar)?.with_timings(fast_timings());

    let out = controller.submit().await;
    assert!(matches!(out, Err(ClientError::Rejected { status: 500, .. })));

    let page = page.page();
    assert_eq!(
        page.message,
        Some(StatusMessage::error("Service temporarily unavailable"))
    );
    assert_eq!(page.labels, vec!["Subscribe"; 2]);
    assert!(!page.disabled);
    assert_eq!(page.desktop_input, "reader@example.com");

    Ok(())
}
