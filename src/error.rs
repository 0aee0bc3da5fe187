use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub const MISSING_JOB_DESCRIPTION: &str = "Job description is required";
pub const RATE_LIMITED: &str = "Rate limit exceeded. Please try again later.";
pub const PAYMENT_REQUIRED: &str = "AI service payment required. Please contact support.";
pub const UPSTREAM_FAILURE: &str = "AI service error";
pub const EMPTY_UPSTREAM_OUTPUT: &str = "No response from AI";
pub const ANALYSIS_FAILED: &str = "Failed to analyze job posting";

/// Everything that can go wrong while scoring a single job posting.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{}", MISSING_JOB_DESCRIPTION)]
    MissingJobDescription,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("AI gateway API key is not configured")]
    Configuration,

    #[error("{}", RATE_LIMITED)]
    UpstreamRateLimited,

    #[error("{}", PAYMENT_REQUIRED)]
    UpstreamBillingRequired,

    #[error("AI gateway returned {status}: {body}")]
    UpstreamFailure { status: StatusCode, body: String },

    #[error("AI gateway request failed: {0}")]
    UpstreamTransport(String),

    #[error("{}", EMPTY_UPSTREAM_OUTPUT)]
    EmptyUpstreamOutput,

    #[error("{0}")]
    MalformedUpstreamOutput(String),
}

impl AnalysisError {
    pub fn status(&self) -> StatusCode {
        match self {
            AnalysisError::MissingJobDescription | AnalysisError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            AnalysisError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::UpstreamBillingRequired => StatusCode::PAYMENT_REQUIRED,
            AnalysisError::Configuration
            | AnalysisError::UpstreamFailure { .. }
            | AnalysisError::UpstreamTransport(_)
            | AnalysisError::EmptyUpstreamOutput
            | AnalysisError::MalformedUpstreamOutput(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message handed back to the caller. Upstream bodies and deployment
    /// details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AnalysisError::Configuration => ANALYSIS_FAILED.to_string(),
            AnalysisError::UpstreamFailure { .. } | AnalysisError::UpstreamTransport(_) => {
                UPSTREAM_FAILURE.to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn log(&self) {
        match self {
            AnalysisError::MissingJobDescription | AnalysisError::InvalidBody(_) => {
                warn!(error = %self, "Rejected analysis request")
            }
            AnalysisError::UpstreamRateLimited | AnalysisError::UpstreamBillingRequired => {
                warn!(monotonic_counter.upstream_rejections = 1_u64, error = %self, "AI gateway refused request")
            }
            AnalysisError::UpstreamFailure { status, body } => {
                error!(monotonic_counter.upstream_failures = 1_u64, %status, %body, "AI gateway error")
            }
            _ => error!(error = %self, "Error in analyze-job handler"),
        }
    }
}

#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: HttpErrorResponse,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HttpErrorResponse {
    pub error: String,
}

impl From<String> for HttpErrorResponse {
    fn from(message: String) -> Self {
        HttpErrorResponse { error: message }
    }
}

impl From<&str> for HttpErrorResponse {
    fn from(message: &str) -> Self {
        HttpErrorResponse {
            error: message.to_string(),
        }
    }
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<HttpErrorResponse>) -> Self {
        HttpError {
            status,
            message: message.into(),
        }
    }
}

impl From<AnalysisError> for HttpError {
    fn from(err: AnalysisError) -> Self {
        HttpError::new(err.status(), err.public_message())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.message)).into_response()
    }
}

pub type HttpResult<T, E = HttpError> = Result<T, E>;
