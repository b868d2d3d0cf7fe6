//! Spawns the app on a random port with a mock provider behind it.
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, OnceLock},
    time::Duration,
};

use anyhow::Result;
use reqwest::{header, Response};
use secrecy::SecretString;
use serde_json::{json, Value};
use signup_guard::{
    config::{Environment, GuardConfig},
    init_dbg_tracing,
    rate_limit::InMemoryRateLimiter,
    web::CorsPolicy,
    App, AppState, ProviderClient,
};
use tokio::net::TcpListener;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const FORM_ID: &str = "4242";
pub const API_KEY: &str = "test-api-key";
pub const ALLOWED_ORIGIN: &str = "https://bluebeaconshow.com";

pub struct TestApp {
    pub addr: SocketAddr,
    pub provider_server: MockServer,
    pub http_client: reqwest::Client,
}

impl TestApp {
    pub fn subscribe_url(&self) -> String {
        format!("http://{}/api/subscribe", self.addr)
    }

    pub async fn post_subscribe(&self, body: &Value) -> Result<Response> {
        let res = self
            .http_client
            .post(self.subscribe_url())
            .json(body)
            .send()
            .await?;
        Ok(res)
    }

    /// Posts from a given client address, so tests don't share one rate-limit bucket.
    pub async fn post_subscribe_from(&self, client_ip: &str, body: &Value) -> Result<Response> {
        let res = self
            .http_client
            .post(self.subscribe_url())
            .header("x-real-ip", client_ip)
            .json(body)
            .send()
            .await?;
        Ok(res)
    }

    pub async fn post_with_csrf(
        &self,
        cookie: Option<&str>,
        csrf_header: Option<&str>,
        body: &Value,
    ) -> Result<Response> {
        let mut req = self.http_client.post(self.subscribe_url()).json(body);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, format!("csrf_token={cookie}"));
        }
        if let Some(csrf_header) = csrf_header {
            req = req.header("x-csrf-token", csrf_header);
        }
        Ok(req.send().await?)
    }

    /// Provider answers every subscribe with success.
    pub async fn mock_provider_success(&self, expected_calls: u64) {
        Mock::given(path(format!("/v3/forms/{FORM_ID}/subscribe")))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscription": { "id": 1, "state": "inactive" }
            })))
            .expect(expected_calls)
            .mount(&self.provider_server)
            .await;
    }
}

/// Trying to bind port 0 will trigger an OS scan for an available port
/// which will then be bound to the application.
const TEST_SOCK_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0);

fn init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            init_dbg_tracing();
        }
    });
}

pub async fn spawn_test_app() -> Result<TestApp> {
    spawn_test_app_with(Environment::Local, Some(API_KEY), Some(FORM_ID)).await
}

/// A helper function that tries to spawn a separate task to serve our app
/// returning a `TestApp` with the address it is listening on and the mock provider.
pub async fn spawn_test_app_with(
    environment: Environment,
    api_key: Option<&str>,
    form_id: Option<&str>,
) -> Result<TestApp> {
    init_test_subscriber();

    let provider_server = MockServer::start().await;
    let provider = ProviderClient::new(
        provider_server.uri(),
        api_key.map(|key| SecretString::from(key.to_string())),
        form_id.map(str::to_string),
        Duration::from_millis(500),
    )?;

    let guard_config = GuardConfig::default();
    let rate_limiter = InMemoryRateLimiter::new(
        guard_config.rate_limit_max,
        guard_config.rate_limit_window(),
    );
    let app_state = AppState::new(
        environment,
        guard_config,
        CorsPolicy::new([ALLOWED_ORIGIN, "http://localhost:3000"]),
        Arc::new(rate_limiter),
        Arc::new(provider),
    );

    let listener = TcpListener::bind(&TEST_SOCK_ADDR).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(signup_guard::serve(App::new(app_state, listener)));

    Ok(TestApp {
        addr,
        provider_server,
        http_client: reqwest::Client::new(),
    })
}
