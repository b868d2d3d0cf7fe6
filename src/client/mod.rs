//! Client submission controller: the browser side of the subscribe form.
//!
//! Validates the email locally, manages the `csrf_token` cookie and posts to `/api/subscribe`.
//! While a request is in flight every subscribe button is disabled and relabeled together,
//! and no path out of `submit` leaves them disabled.

mod view;

pub use view::{ButtonGroup, CookieStore, FormView, MessageKind, StatusMessage};

use std::{sync::Arc, time::Duration};

use reqwest::{header, Client, Url};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tower_cookies::cookie::{Cookie, SameSite};
use tracing::error;

use crate::{
    csrf::{CsrfToken, CSRF_COOKIE, CSRF_HEADER},
    web::types::ValidEmail,
};

pub const PROCESSING_LABEL: &str = "Processing...";
pub const SUBSCRIBED_LABEL: &str = "Subscribed!";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const SUCCESS_MESSAGE: &str = "Thanks for subscribing!";
pub const MAX_MESSAGE_LEN: usize = 200;

/// Delays after a successful subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Until the buttons get their original labels back.
    pub restore_buttons: Duration,
    /// Until the success message is hidden, counted from the restore.
    pub hide_message: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            restore_buttons: Duration::from_millis(3000),
            hide_message: Duration::from_millis(5000),
        }
    }
}

/// A successful submit. `settle` finishes once the buttons are restored and the message hidden.
#[derive(Debug)]
pub struct Submitted {
    pub message: String,
    pub settle: JoinHandle<()>,
}

pub struct SubscribeController<V, C> {
    http_client: Client,
    endpoint: Url,
    view: Arc<V>,
    cookies: Arc<C>,
    timings: Timings,
}

impl<V: FormView, C: CookieStore> SubscribeController<V, C> {
    pub fn new<S: AsRef<str>>(endpoint: S, view: Arc<V>, cookies: Arc<C>) -> ClientResult<Self> {
        let endpoint =
            Url::parse(endpoint.as_ref()).map_err(|e| ClientError::UrlParsing(e.to_string()))?;

        Ok(Self {
            http_client: Client::new(),
            endpoint,
            view,
            cookies,
            timings: Timings::default(),
        })
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Returns the token from the `csrf_token` cookie, creating and storing a fresh one if there is none.
    /// The token is not rotated per request.
    pub fn csrf_token(&self) -> String {
        if let Some(token) = self.cookies.get(CSRF_COOKIE).filter(|t| !t.is_empty()) {
            return token;
        }

        let token = CsrfToken::generate().into_inner();
        let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
            .path("/")
            .secure(true)
            .same_site(SameSite::Strict)
            .build();
        self.cookies.set(cookie);

        token
    }

    /// Handles one form submission.
    pub async fn submit(&self) -> ClientResult<Submitted> {
        let view = self.view.as_ref();

        let email = read_email(view.email_inputs());
        if !ValidEmail::has_valid_shape(&email) {
            view.show_message(&StatusMessage::error(INVALID_EMAIL_MESSAGE));
            return Err(ClientError::InvalidEmail);
        }

        let token = self.csrf_token();
        let buttons = ButtonGroup::capture(view);
        buttons.set_all(view, PROCESSING_LABEL, true);

        match self.send(&email, &token).await {
            Ok(message) => {
                view.clear_inputs();
                view.show_message(&StatusMessage::success(message.clone()));
                buttons.set_all(view, SUBSCRIBED_LABEL, true);

                let settle = self.spawn_settle(buttons);
                Ok(Submitted { message, settle })
            }
            Err(er) => {
                let message = match &er {
                    ClientError::Rejected { message, .. } => sanitize_message(message),
                    _ => GENERIC_ERROR_MESSAGE.to_string(),
                };
                view.show_message(&StatusMessage::error(message));
                buttons.restore(view);
                error!("{:<12} - subscribe failed: {er}", "CLIENT");

                Err(er)
            }
        }
    }

    async fn send(&self, email: &str, token: &str) -> ClientResult<String> {
        let body = json!({
            "email": email,
            "website": self.view.honeypot(),
        });

        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .header(CSRF_HEADER, token)
            // Stands in for `credentials: "include"`.
            .header(header::COOKIE, format!("{CSRF_COOKIE}={token}"))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let payload: Value = resp.json().await.unwrap_or(Value::Null);
        let success = payload.get("success").and_then(Value::as_bool) == Some(true);

        if !status.is_success() || !success {
            let message = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .map(sanitize_message)
            .unwrap_or_else(|| SUCCESS_MESSAGE.to_string());

        Ok(message)
    }

    fn spawn_settle(&self, buttons: ButtonGroup) -> JoinHandle<()> {
        let view = Arc::clone(&self.view);
        let timings = self.timings;

        tokio::spawn(async move {
            tokio::time::sleep(timings.restore_buttons).await;
            buttons.restore(view.as_ref());
            tokio::time::sleep(timings.hide_message).await;
            view.hide_message();
        })
    }
}

/// The first non-blank input wins, trimmed.
pub fn read_email(inputs: Vec<String>) -> String {
    inputs
        .into_iter()
        .map(|input| input.trim().to_string())
        .find(|input| !input.is_empty())
        .unwrap_or_default()
}

/// Makes a server-provided message safe to show: strips `<>&"'`, caps the length,
/// falls back to a generic message when nothing is left.
pub fn sanitize_message(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '&' | '"' | '\''))
        .take(MAX_MESSAGE_LEN)
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        cleaned.to_string()
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type ClientResult<T> = core::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("email failed local validation")]
    InvalidEmail,
    #[error("server rejected the subscription with {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid endpoint url: {0}")]
    UrlParsing(String),
    #[error("request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
}
