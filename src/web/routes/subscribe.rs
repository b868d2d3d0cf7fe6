use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tower_cookies::Cookies;

use crate::{
    csrf::CSRF_COOKIE,
    web::{
        guard::{self, GuardRequest, Outcome},
        RATE_LIMIT_REMAINING_HEADER,
    },
    AppState,
};

const SUBSCRIBED_MESSAGE: &str = "Subscribed successfully";

/// Body of every successful subscribe, real or decoy.
#[derive(Debug, Serialize)]
struct SubscribeResponse {
    success: bool,
    message: String,
}

impl SubscribeResponse {
    fn subscribed() -> Self {
        Self {
            success: true,
            message: SUBSCRIBED_MESSAGE.to_string(),
        }
    }
}

/// Bodies over the transport cap still come through here as a rejection,
/// so the guard answers them after CORS, CSRF and the rate limiter ran.
#[tracing::instrument(name = "subscribe", skip_all, fields(method = %method))]
pub async fn subscribe(
    State(app_state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    cookies: Cookies,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request = GuardRequest {
        method,
        headers,
        csrf_cookie: cookies.get(CSRF_COOKIE).map(|c| c.value().to_string()),
        body,
    };

    let report = guard::run(&app_state, request).await;
    let last_stage = report.trail.last().copied();

    let mut resp = match report.result {
        Ok(Outcome::Preflight) => StatusCode::OK.into_response(),
        // Decoys get the exact same response as real subscriptions.
        Ok(Outcome::Subscribed | Outcome::Decoy) => {
            (StatusCode::OK, Json(SubscribeResponse::subscribed())).into_response()
        }
        Err(er) => er.into_response(),
    };

    app_state
        .cors
        .apply(report.allow_origin.as_ref(), resp.headers_mut());
    if let Some(remaining) = report.rate_remaining {
        resp.headers_mut()
            .insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(remaining));
    }
    // Picked up by the trace layer's `on_response`.
    if let Some(stage) = last_stage {
        resp.extensions_mut().insert(stage);
    }

    resp
}
