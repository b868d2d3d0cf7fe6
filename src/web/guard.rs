//! The subscribe request guard: an ordered list of independent checks in front of the provider.
//!
//! Every stage either lets the request through or ends it with a terminal result.
//! `STAGES` is the order they run in. Only the honeypot delay and the provider call suspend.

use std::{ops::ControlFlow, time::Duration};

use axum::{
    body::Bytes,
    extract::rejection::BytesRejection,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
};
use rand::Rng;
use serde_json::Value;
use strum_macros::AsRefStr;
use tracing::{debug, info, warn};

use crate::{
    config::Environment,
    csrf::{verify_double_submit, CSRF_HEADER},
    rate_limit::ClientId,
    web::{
        routes::OUTER_BODY_LIMIT,
        types::{DataParsingError, SubscribeRequest, ValidEmail},
        Error, WebResult,
    },
    AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Stage {
    Cors,
    Method,
    Csrf,
    RateLimit,
    ParseBody,
    BodySize,
    Validate,
    Honeypot,
    Downstream,
}

pub const STAGES: [Stage; 9] = [
    Stage::Cors,
    Stage::Method,
    Stage::Csrf,
    Stage::RateLimit,
    Stage::ParseBody,
    Stage::BodySize,
    Stage::Validate,
    Stage::Honeypot,
    Stage::Downstream,
];

/// Successful ends of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `OPTIONS` pre-flight, answered right after CORS.
    Preflight,
    /// The provider accepted the subscription.
    Subscribed,
    /// The honeypot was filled. Looks exactly like `Subscribed` to the caller.
    Decoy,
}

#[derive(Debug)]
pub struct GuardRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub csrf_cookie: Option<String>,
    /// The buffered body, or why axum refused to buffer it.
    pub body: Result<Bytes, BytesRejection>,
}

/// What the pipeline decided, plus the bits the response needs regardless of the decision.
#[derive(Debug)]
pub struct GuardReport {
    pub allow_origin: Option<HeaderValue>,
    pub rate_remaining: Option<usize>,
    /// Stages that ran, in order. The last one produced the result unless the pipeline ran through.
    pub trail: Vec<Stage>,
    pub result: WebResult<Outcome>,
}

type Flow = ControlFlow<WebResult<Outcome>>;

#[derive(Debug, Default)]
struct GuardCtx {
    allow_origin: Option<HeaderValue>,
    rate_remaining: Option<usize>,
    request: Option<SubscribeRequest>,
    body_value: Option<Value>,
    over_transport_cap: bool,
    email: Option<ValidEmail>,
}

fn reject(error: impl Into<Error>) -> Flow {
    ControlFlow::Break(Err(error.into()))
}

/// Runs the request through every stage in `STAGES` until one of them ends it.
/// Falling off the end means the provider accepted the subscription.
pub async fn run(app_state: &AppState, req: GuardRequest) -> GuardReport {
    let mut ctx = GuardCtx::default();
    let mut trail = Vec::with_capacity(STAGES.len());
    let mut result = Ok(Outcome::Subscribed);

    for stage in STAGES {
        trail.push(stage);
        let flow = match stage {
            Stage::Cors => cors(app_state, &req, &mut ctx),
            Stage::Method => method(&req),
            Stage::Csrf => csrf(app_state, &req),
            Stage::RateLimit => rate_limit(app_state, &req, &mut ctx).await,
            Stage::ParseBody => parse_body(&req, &mut ctx),
            Stage::BodySize => body_size(app_state, &ctx),
            Stage::Validate => validate(&mut ctx),
            Stage::Honeypot => honeypot(app_state, &ctx).await,
            Stage::Downstream => downstream(app_state, &ctx).await,
        };

        if let ControlFlow::Break(done) = flow {
            debug!("{:<12} - stopped at stage: {}", "GUARD", stage.as_ref());
            result = done;
            break;
        }
    }

    GuardReport {
        allow_origin: ctx.allow_origin,
        rate_remaining: ctx.rate_remaining,
        trail,
        result,
    }
}

// ###################################
// ->   STAGES
// ###################################
fn cors(app_state: &AppState, req: &GuardRequest, ctx: &mut GuardCtx) -> Flow {
    ctx.allow_origin = app_state.cors.allow_origin(&req.headers);

    if req.method == Method::OPTIONS {
        return ControlFlow::Break(Ok(Outcome::Preflight));
    }
    ControlFlow::Continue(())
}

fn method(req: &GuardRequest) -> Flow {
    if req.method != Method::POST {
        return reject(Error::MethodNotAllowed(req.method.clone()));
    }
    ControlFlow::Continue(())
}

fn csrf(app_state: &AppState, req: &GuardRequest) -> Flow {
    if app_state.environment != Environment::Production {
        return ControlFlow::Continue(());
    }

    let header = req
        .headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok());

    match verify_double_submit(req.csrf_cookie.as_deref(), header) {
        Ok(()) => ControlFlow::Continue(()),
        Err(er) => {
            warn!("{:<12} - {er}", "CSRF");
            reject(er)
        }
    }
}

async fn rate_limit(app_state: &AppState, req: &GuardRequest, ctx: &mut GuardCtx) -> Flow {
    let client = ClientId::from_headers(&req.headers);
    let decision = app_state.rate_limiter.check_and_increment(&client).await;
    ctx.rate_remaining = Some(decision.remaining);

    if !decision.allowed {
        warn!("{:<12} - limit reached for: {client}", "RATE_LIMIT");
        return reject(Error::RateLimited(client));
    }
    ControlFlow::Continue(())
}

fn parse_body(req: &GuardRequest, ctx: &mut GuardCtx) -> Flow {
    let body = match &req.body {
        Ok(body) => body,
        // Nothing to parse, the size stage reports it.
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            ctx.over_transport_cap = true;
            return ControlFlow::Continue(());
        }
        Err(rejection) => return reject(DataParsingError::MalformedBody(rejection.body_text())),
    };

    match SubscribeRequest::from_body(body) {
        Ok((request, value)) => {
            ctx.request = Some(request);
            ctx.body_value = Some(value);
            ControlFlow::Continue(())
        }
        Err(er) => reject(er),
    }
}

fn body_size(app_state: &AppState, ctx: &GuardCtx) -> Flow {
    if ctx.over_transport_cap {
        return reject(Error::BodyOverTransportCap {
            limit: OUTER_BODY_LIMIT,
        });
    }

    let limit = app_state.guard_config.max_body_bytes;
    let size = ctx
        .body_value
        .as_ref()
        .map(|value| value.to_string().len())
        .unwrap_or_default();

    if size > limit {
        return reject(Error::PayloadTooLarge { size, limit });
    }
    ControlFlow::Continue(())
}

fn validate(ctx: &mut GuardCtx) -> Flow {
    let Some(request) = ctx.request.as_ref() else {
        return reject(DataParsingError::MalformedBody("body was not parsed".to_string()));
    };

    match request.valid_email() {
        Ok(email) => {
            ctx.email = Some(email);
            ControlFlow::Continue(())
        }
        Err(er) => reject(er),
    }
}

async fn honeypot(app_state: &AppState, ctx: &GuardCtx) -> Flow {
    let filled = ctx
        .request
        .as_ref()
        .is_some_and(SubscribeRequest::honeypot_filled);
    if !filled {
        return ControlFlow::Continue(());
    }

    let config = &app_state.guard_config;
    let delay_millis = rand::rng()
        .random_range(config.honeypot_delay_min_millis..=config.honeypot_delay_max_millis);
    info!("{:<12} - honeypot filled, delaying {delay_millis}ms", "HONEYPOT");
    tokio::time::sleep(Duration::from_millis(delay_millis)).await;

    ControlFlow::Break(Ok(Outcome::Decoy))
}

async fn downstream(app_state: &AppState, ctx: &GuardCtx) -> Flow {
    let Some(email) = ctx.email.as_ref() else {
        return reject(DataParsingError::EmailMissing);
    };

    match app_state.provider.subscribe(email).await {
        Ok(()) => {
            info!("{:<12} - subscribed: {email}", "PROVIDER");
            ControlFlow::Continue(())
        }
        Err(er) => {
            tracing::error!("{:<12} - {er}", "PROVIDER");
            reject(er)
        }
    }
}
