use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use strum_macros::AsRefStr;

use crate::web::types::ValidEmail;

/// The downstream email-marketing service that actually stores subscribers.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    /// Single attempt, never retried.
    async fn subscribe(&self, email: &ValidEmail) -> Result<()>;
}

/// Client for a ConvertKit style form-subscribe API.
#[derive(Debug)]
pub struct ProviderClient {
    pub http_client: Client,
    pub url: reqwest::Url,
    api_key: Option<SecretString>,
    form_id: Option<String>,
}

impl ProviderClient {
    pub fn new<S: AsRef<str>>(
        url: S,
        api_key: Option<SecretString>,
        form_id: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let url =
            reqwest::Url::parse(url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(ProviderClient {
            http_client,
            url,
            api_key,
            form_id,
        })
    }
}

#[async_trait]
impl SubscriptionProvider for ProviderClient {
    async fn subscribe(&self, email: &ValidEmail) -> Result<()> {
        // Checked per request: a misconfigured deployment still serves, it just can't subscribe.
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or(Error::MissingConfig(MissingVar::ApiKey))?;
        let form_id = self
            .form_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingConfig(MissingVar::FormId))?;

        let url = self
            .url
            .join(&format!("v3/forms/{form_id}/subscribe"))
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let body = SubscribeBody {
            api_key: api_key.expose_secret(),
            email: email.as_ref(),
        };

        let resp = self.http_client.post(url).json(&body).send().await?;
        let status = resp.status();
        let payload = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Rejected { status, payload });
        }

        let accepted = serde_json::from_str::<Value>(&payload)
            .ok()
            .and_then(|v| v.get("subscription").map(Value::is_object))
            .unwrap_or(false);
        if !accepted {
            return Err(Error::Rejected { status, payload });
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct SubscribeBody<'a> {
    pub api_key: &'a str,
    pub email: &'a str,
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

/// Names of the deployment variables the provider needs. Logged server-side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum MissingVar {
    #[strum(serialize = "APP_PROVIDER_CONFIG__API_KEY")]
    ApiKey,
    #[strum(serialize = "APP_PROVIDER_CONFIG__FORM_ID")]
    FormId,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("provider is not configured, missing: {}", .0.as_ref())]
    MissingConfig(MissingVar),
    #[error("failed to build the provider url: {0}")]
    UrlParsing(String),
    #[error("provider rejected the subscription with {status}: {payload}")]
    Rejected { status: StatusCode, payload: String },
    #[error("provider request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
}
