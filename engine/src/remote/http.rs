//! HTTP client for the budget server.

use super::RemoteStore;
use crate::{config::ClientConfig, error::RemoteError, BudgetPayload, RemoteBudget};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Error body returned by the budget server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

/// Remote store backed by the budget server's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemote {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RemoteError> {
        let remote = Self::new(config.remote_url.clone(), config.timeout)?;
        Ok(match &config.auth_token {
            Some(token) => remote.with_token(token.clone()),
            None => remote,
        })
    }

    /// Present `token` as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Map a non-success response to a [`RemoteError`].
fn status_error(status: StatusCode, body: &str) -> RemoteError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return RemoteError::Unauthorized;
    }

    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            details: Some(details),
        }) => format!("{}: {}", error, details),
        Ok(ErrorBody { error, .. }) => error,
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body.to_string(),
    };

    RemoteError::Rejected {
        status: status.as_u16(),
        message,
    }
}

fn decode_error(err: reqwest::Error) -> RemoteError {
    if err.is_decode() {
        RemoteError::Decode(err.to_string())
    } else {
        RemoteError::Network(err.to_string())
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn find_by_user(&self, user_id: &str) -> Result<Option<RemoteBudget>, RemoteError> {
        let request = self
            .client
            .get(self.url("/budgets"))
            .query(&[("userId", user_id)]);
        let response = self.send(request).await?;
        response.json().await.map_err(decode_error)
    }

    async fn insert(&self, payload: &BudgetPayload) -> Result<RemoteBudget, RemoteError> {
        let request = self.client.post(self.url("/budgets")).json(payload);
        let response = self.send(request).await?;
        response.json().await.map_err(decode_error)
    }

    async fn update(&self, id: &str, payload: &BudgetPayload) -> Result<RemoteBudget, RemoteError> {
        let request = self
            .client
            .put(self.url(&format!("/budgets/{}", id)))
            .json(payload);
        let response = self.send(request).await?;
        response.json().await.map_err(decode_error)
    }
}
