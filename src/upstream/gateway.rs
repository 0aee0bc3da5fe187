use std::time::Duration;

use anyhow::Result;
use axum::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use crate::error::AnalysisError;
use crate::upstream::{ApiKey, ChatCompletionRequest, CompletionClient, UpstreamReply};

/// Talks to an OpenAI-compatible chat completions endpoint over HTTPS.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    http: Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl GatewayClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for GatewayClient {
    #[tracing::instrument(level = "info", skip_all, fields(endpoint = %self.endpoint, model = %request.model))]
    async fn complete(
        &self,
        api_key: &ApiKey,
        request: &ChatCompletionRequest,
    ) -> Result<UpstreamReply, AnalysisError> {
        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(api_key.expose())
            .header(CONTENT_TYPE, "application/json")
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| AnalysisError::UpstreamTransport(err.to_string()))?;
        let status = response.status();
        // A failed status is reported as such even when its body is cut short.
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) if !status.is_success() => {
                tracing::warn!(%status, error = %err, "Could not read upstream error body");
                String::new()
            }
            Err(err) => return Err(AnalysisError::UpstreamTransport(err.to_string())),
        };

        Ok(UpstreamReply::new(status, body))
    }
}
