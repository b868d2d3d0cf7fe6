//! Origin allow-listing for the subscribe endpoint.

use std::collections::HashSet;

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::{CorsConfig, Environment};

pub const ALLOW_METHODS: &str = "POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, X-CSRF-Token";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: HashSet<String>,
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// Development origins (localhost) are only added outside of production.
    pub fn from_config(config: &CorsConfig, environment: Environment) -> Self {
        let dev_origins = match environment {
            Environment::Production => &[][..],
            Environment::Local => &config.dev_origins[..],
        };

        Self::new(config.allowed_origins.iter().chain(dev_origins).cloned())
    }

    /// Returns the request's `Origin` back if, and only if, it is on the allow-list.
    pub fn allow_origin(&self, request_headers: &HeaderMap) -> Option<HeaderValue> {
        let origin = request_headers.get(header::ORIGIN)?;
        let origin_str = origin.to_str().ok()?;

        self.allowed_origins
            .contains(origin_str)
            .then(|| origin.clone())
    }

    pub fn apply(&self, allow_origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(origin) = allow_origin {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}
