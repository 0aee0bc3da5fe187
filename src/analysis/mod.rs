use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisError;
use crate::upstream::{ApiKey, ChatCompletionRequest, CompletionClient};

pub use normalize::parse_analysis;
pub use request::AnalysisRequest;

pub mod normalize;
pub mod prompt;
pub mod request;

pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Legitimacy from 0 (scam) to 100 (trustworthy)
    pub score: u8,

    pub explanation: String,

    /// Key factors behind the score, most relevant first
    pub factors: Vec<String>,
}

impl AnalysisResult {
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// The rubric bands the model is asked to score against.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    VeryLikelyScam,
    Suspicious,
    PossiblyLegitimate,
    LikelyLegitimate,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => ScoreBand::VeryLikelyScam,
            31..=50 => ScoreBand::Suspicious,
            51..=70 => ScoreBand::PossiblyLegitimate,
            _ => ScoreBand::LikelyLegitimate,
        }
    }
}

impl Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreBand::VeryLikelyScam => write!(f, "Very likely a scam"),
            ScoreBand::Suspicious => write!(f, "Suspicious, proceed with caution"),
            ScoreBand::PossiblyLegitimate => write!(f, "Possibly legitimate, verify details"),
            ScoreBand::LikelyLegitimate => write!(f, "Likely legitimate"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AnalyzerSettings {
    pub api_key: Option<ApiKey>,
    pub model: String,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Runs one posting through validate, configuration guard, prompt,
/// upstream call and normalization. Holds no per-request state.
#[derive(Clone)]
pub struct Analyzer {
    client: Arc<dyn CompletionClient>,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(client: Arc<dyn CompletionClient>, settings: AnalyzerSettings) -> Self {
        Self { client, settings }
    }

    pub fn has_api_key(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn api_key(&self) -> Result<&ApiKey, AnalysisError> {
        self.settings
            .api_key
            .as_ref()
            .ok_or(AnalysisError::Configuration)
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let job_description = request.validate()?;
        let api_key = self.api_key()?;

        let chat = ChatCompletionRequest::new(
            self.settings.model.clone(),
            prompt::build_messages(job_description),
        );
        let content = self.client.complete(api_key, &chat).await?.into_content()?;
        let result = parse_analysis(&content)?;

        debug!(score = result.score, factors = result.factors.len(), "Analyzed job posting");
        Ok(result)
    }
}
