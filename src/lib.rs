//! A guarded newsletter-subscription endpoint.
//!
//! `POST /api/subscribe` runs every request through the checks in [`web::guard`]
//! (CORS, CSRF double-submit, rate limit, body size, email validation, honeypot)
//! before forwarding the email to the external [`provider`].
//! The [`client`] module drives the browser-side form against the same endpoint.

pub mod app;
pub mod client;
pub mod config;
pub mod csrf;
mod error;
pub mod provider;
pub mod rate_limit;
pub mod web;

pub use app::{App, AppState};
pub use error::{Error, Result};
pub use provider::{ProviderClient, SubscriptionProvider};
pub use web::serve::serve;

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

/// Verbose, human-oriented console output for local development.
/// Respects `RUST_LOG`, defaults to `debug`.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .compact()
        .init();
}

/// Compact output without colors. Respects `RUST_LOG`, defaults to `info`.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();
}
