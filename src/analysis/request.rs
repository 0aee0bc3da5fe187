use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AnalysisRequest {
    #[serde(rename = "jobDescription", default)]
    pub job_description: Option<String>,
}

impl AnalysisRequest {
    pub fn new(job_description: impl Into<String>) -> Self {
        Self {
            job_description: Some(job_description.into()),
        }
    }

    /// Returns the posting exactly as submitted, as long as it holds
    /// something other than whitespace.
    pub fn validate(&self) -> Result<&str, AnalysisError> {
        match self.job_description.as_deref() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AnalysisError::MissingJobDescription),
        }
    }
}
