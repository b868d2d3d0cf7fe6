use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use crate::{csrf::CsrfError, provider, rate_limit::ClientId, web::types::DataParsingError};

pub type WebResult<T> = core::result::Result<T, Error>;

/// Everything that can stop a subscribe request. Messages are for server logs,
/// the client only ever sees the matching `ClientError`.
#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),
    #[error("csrf validation failed: {0}")]
    Authenticity(#[from] CsrfError),
    #[error("rate limit exceeded for client: {0}")]
    RateLimited(ClientId),
    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),
    #[error("payload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("body exceeds the transport limit of {limit} bytes")]
    BodyOverTransportCap { limit: usize },
    #[error("provider error: {0}")]
    Provider(#[from] provider::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, MethodNotAllowed),
            Error::Authenticity(_) => (StatusCode::FORBIDDEN, InvalidRequest),
            Error::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, TooManyRequests),
            Error::DataParsing(data_er) => {
                let client_error = match data_er {
                    DataParsingError::EmailMissing => EmailRequired,
                    DataParsingError::EmailInvalid | DataParsingError::EmailTooLong => {
                        InvalidEmail
                    }
                    DataParsingError::MalformedBody(_) => InvalidBody,
                };
                (StatusCode::BAD_REQUEST, client_error)
            }
            Error::PayloadTooLarge { .. } | Error::BodyOverTransportCap { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, PayloadTooLarge)
            }
            Error::Provider(provider::Error::Rejected { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, SubscriptionFailed)
            }
            Error::Provider(_) => (StatusCode::INTERNAL_SERVER_ERROR, ServiceUnavailable),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// Short, generic, user-safe messages. Nothing here depends on request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Method not allowed")]
    MethodNotAllowed,
    #[display("Invalid request")]
    InvalidRequest,
    #[display("Too many requests. Please try again later.")]
    TooManyRequests,
    #[display("Invalid request body")]
    InvalidBody,
    #[display("Payload too large")]
    PayloadTooLarge,
    #[display("Email is required")]
    EmailRequired,
    #[display("Invalid email address")]
    InvalidEmail,
    #[display("Service temporarily unavailable")]
    ServiceUnavailable,
    #[display("Subscription failed. Please try again later.")]
    SubscriptionFailed,
}
