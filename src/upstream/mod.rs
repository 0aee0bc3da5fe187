use std::fmt;

use axum::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub use gateway::GatewayClient;

mod gateway;

/// Bearer credential for the completion gateway. Never printed.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank values so an empty env var counts as missing.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.trim().to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            response_format: ResponseFormat::json_object(),
        }
    }
}

// Every level is optional: gateways drop fields freely and a missing one
// should read as "no content", not as a decoding failure.
#[derive(Deserialize, Debug, Default)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    pub fn first_content(self) -> Option<String> {
        self.choices?
            .into_iter()
            .next()?
            .message?
            .content
            .filter(|content| !content.is_empty())
    }
}

/// Raw status and body as received from the gateway.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamReply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Translates the gateway status into the client-facing taxonomy and
    /// extracts `choices[0].message.content` from a successful reply.
    pub fn into_content(self) -> Result<String, AnalysisError> {
        match self.status {
            StatusCode::TOO_MANY_REQUESTS => return Err(AnalysisError::UpstreamRateLimited),
            StatusCode::PAYMENT_REQUIRED => return Err(AnalysisError::UpstreamBillingRequired),
            status if !status.is_success() => {
                return Err(AnalysisError::UpstreamFailure {
                    status,
                    body: self.body,
                })
            }
            _ => {}
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&self.body)
            .map_err(|err| AnalysisError::MalformedUpstreamOutput(err.to_string()))?;
        completion
            .first_content()
            .ok_or(AnalysisError::EmptyUpstreamOutput)
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issues exactly one request. Non-2xx statuses are returned, not raised;
    /// only transport failures are errors here.
    async fn complete(
        &self,
        api_key: &ApiKey,
        request: &ChatCompletionRequest,
    ) -> Result<UpstreamReply, AnalysisError>;
}
