use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request, Response},
    middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::{rate_limit::ClientId, App, AppState, Result};

use super::{guard::Stage, midware, routes::routes, REQUEST_ID_HEADER};

/// The core async function returning a future that will serve this application.
///
/// Accepts an `App` (listener + state) and serves the router built by `app_router`.
///
/// Current implementation might return an IO error from `axum::serve`
pub async fn serve(app: App) -> Result<()> {
    let App {
        app_state,
        listener,
    } = app;

    axum::serve(listener, app_router(app_state)).await?;

    Ok(())
}

/// All routes wrapped in the request-id, tracing and response-mapping middleware.
pub fn app_router(app_state: AppState) -> Router {
    let x_request_id: HeaderName = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace_layer = build_trace_layer();

    Router::new().merge(routes(app_state)).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            .layer(trace_layer)
            // Responses travel bottom up: the id is propagated before the mapper reads it.
            .layer(middleware::map_response(midware::response_mapper))
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// Request span carries the request id and client id. The guard stage that ended
/// the request is recorded on it once the response is back.
fn build_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<Body> + Clone,
    impl OnRequest<Body> + Clone,
    impl OnResponse<Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|id| id.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let client = ClientId::from_headers(req.headers());

            tracing::error_span!(
                "request",
                id = request_id,
                client = %client,
                method = %req.method(),
                path = req.uri().path(),
                stage = tracing::field::Empty,
            )
        })
        .on_request(|_req: &Request<Body>, _s: &Span| tracing::debug!("{:<12} - started", "REQUEST"))
        .on_response(|res: &Response<Body>, latency: Duration, span: &Span| {
            if let Some(stage) = res.extensions().get::<Stage>() {
                span.record("stage", stage.as_ref());
            }

            let status = res.status();
            if status.is_server_error() {
                tracing::error!("{:<12} - {status} in {latency:?}", "RESPONSE")
            } else if status.is_client_error() {
                // Guard rejections are expected traffic.
                tracing::warn!("{:<12} - {status} in {latency:?}", "RESPONSE")
            } else {
                tracing::info!("{:<12} - {status} in {latency:?}", "RESPONSE")
            }
        })
}
