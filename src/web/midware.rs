use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::web::{log, Error, REQUEST_ID_HEADER};

/// Turns an `Error` stashed in the response extensions into the `{ "error": ... }` client body
/// and logs the request. Headers already set on the response (CORS, rate limit) are kept.
pub async fn response_mapper(
    req_method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    resp: Response,
) -> Response {
    let req_id = req_headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let web_error = resp.extensions().get::<Arc<Error>>().cloned();
    let client_status_and_error = web_error
        .as_deref()
        .map(Error::status_code_and_client_error);

    log::log_request(
        &req_id,
        &req_method,
        &uri,
        resp.status(),
        web_error.as_deref(),
        client_status_and_error.as_ref(),
    );

    match client_status_and_error {
        Some((status, client_error)) => {
            let (mut parts, _body) = resp.into_parts();
            parts.status = status;
            parts.headers.remove(header::CONTENT_TYPE);
            parts.headers.remove(header::CONTENT_LENGTH);

            let client_error_body = json!({ "error": client_error.to_string() });
            (parts, Json(client_error_body)).into_response()
        }
        None => resp,
    }
}
