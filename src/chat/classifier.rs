//! Client for the remote legal-classification service.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::config::ChatConfig;
use super::error::{ChatError, ChatResult};
use super::types::{IncidentRequest, RemoteReply};

/// Boxed future type for classifier calls.
pub type ClassifierFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can turn an incident description into a legal classification.
pub trait LegalClassifier: Send + Sync {
    /// Classify one incident. Called exactly once per submitted query.
    fn classify<'a>(&'a self, incident: &'a str) -> ClassifierFuture<'a, ChatResult<RemoteReply>>;
}

/// HTTP implementation posting `{"incident": ...}` to a `/predict` endpoint.
#[derive(Clone, Debug)]
pub struct HttpClassifier {
    client: Client,
    endpoint: Url,
}

impl HttpClassifier {
    /// Build a classifier from configuration.
    ///
    /// # Errors
    /// Returns an error if the endpoint is invalid or the HTTP client cannot be built.
    pub fn new(config: &ChatConfig) -> ChatResult<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::HttpClient(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    /// Endpoint queries are posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post_incident(&self, incident: &str) -> ChatResult<RemoteReply> {
        let request = IncidentRequest {
            incident: incident.to_string(),
        };

        debug!(endpoint = %self.endpoint, "Posting incident");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        let value: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => return Err(ChatError::Status(status.as_u16())),
            Err(err) => return Err(ChatError::Decode(err)),
        };

        if let Some(message) = error_message(&value) {
            return Err(ChatError::Remote(message));
        }
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        Ok(serde_json::from_value(value)?)
    }
}

impl LegalClassifier for HttpClassifier {
    fn classify<'a>(&'a self, incident: &'a str) -> ClassifierFuture<'a, ChatResult<RemoteReply>> {
        Box::pin(self.post_incident(incident))
    }
}

/// Server-supplied error text, if the body carries an `error` field.
fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
