//! REST access to the hub.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use habridge_app::ports::HubClient;
use habridge_domain::command::ServiceCall;
use habridge_domain::error::RemoteError;
use habridge_domain::hub::{RawState, ServiceDomain};

use crate::config::HassConfig;
use crate::error::HassError;

/// HTTP client for the hub's REST API.
///
/// Authenticates every request with a bearer token. Failures are returned
/// as-is; nothing is retried here.
#[derive(Debug, Clone)]
pub struct HassClient {
    http: Client,
    base_url: String,
    token: String,
}

impl HassClient {
    /// Build a client from the hub configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HassError::Http`] if the underlying HTTP client cannot be
    /// built.
    pub fn new(config: &HassConfig) -> Result<Self, HassError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HassError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn post_service(&self, call: &ServiceCall) -> Result<Value, HassError> {
        let path = format!("/api/services/{}/{}", call.domain, call.service);
        let response = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.token)
            .json(&call.data)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(HassError::Frame)
    }
}

async fn check_status(response: Response) -> Result<Response, HassError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HassError::Status {
        status: status.as_u16(),
        body,
    })
}

impl HubClient for HassClient {
    async fn fetch_snapshot(&self) -> Result<Vec<RawState>, RemoteError> {
        // one odd entry must not cost the whole snapshot
        let entries: Vec<Value> = self.get_json("/api/states").await?;
        let total = entries.len();
        let states: Vec<RawState> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(state) => Some(state),
                Err(err) => {
                    tracing::debug!(%err, "skipping undecodable hub state");
                    None
                }
            })
            .collect();
        tracing::debug!(count = states.len(), skipped = total - states.len(), "fetched hub states");
        Ok(states)
    }

    async fn fetch_services(&self) -> Result<Vec<ServiceDomain>, RemoteError> {
        Ok(self.get_json("/api/services").await?)
    }

    async fn invoke(&self, call: &ServiceCall) -> Result<Value, RemoteError> {
        tracing::debug!(domain = %call.domain, service = %call.service, "calling hub service");
        Ok(self.post_service(call).await?)
    }
}
