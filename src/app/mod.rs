use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::{AppConfig, Environment, GuardConfig},
    provider::{ProviderClient, SubscriptionProvider},
    rate_limit::{InMemoryRateLimiter, RateLimitStore},
    web::CorsPolicy,
    Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    /// Builds the production wiring: the HTTP provider client and the in-process rate limiter,
    /// whose stale entries get purged by a background task.
    pub async fn build_from_config(config: &AppConfig) -> Result<Self> {
        let provider_config = &config.provider_config;
        let provider = ProviderClient::new(
            &provider_config.url,
            provider_config.api_key.clone(),
            provider_config.form_id.clone(),
            provider_config.timeout(),
        )?;
        if provider_config.api_key.is_none() || provider_config.form_id.is_none() {
            tracing::warn!(
                "{:<20} - provider credentials are not configured, subscriptions will fail",
                "build_from_config"
            );
        }

        let guard_config = config.guard_config.clone();
        let rate_limiter = Arc::new(InMemoryRateLimiter::new(
            guard_config.rate_limit_max,
            guard_config.rate_limit_window(),
        ));
        rate_limiter.spawn_purge_task();

        let app_state = AppState::new(
            config.environment,
            guard_config,
            CorsPolicy::from_config(&config.cors_config, config.environment),
            rate_limiter,
            Arc::new(provider),
        );

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    pub environment: Environment,
    pub guard_config: GuardConfig,
    pub cors: CorsPolicy,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub provider: Arc<dyn SubscriptionProvider>,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(
        environment: Environment,
        guard_config: GuardConfig,
        cors: CorsPolicy,
        rate_limiter: Arc<dyn RateLimitStore>,
        provider: Arc<dyn SubscriptionProvider>,
    ) -> Self {
        AppState(Arc::new(InternalState {
            environment,
            guard_config,
            cors,
            rate_limiter,
            provider,
        }))
    }
}
