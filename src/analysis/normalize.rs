use serde_json::{Map, Value};

use crate::analysis::AnalysisResult;
use crate::error::AnalysisError;

pub const DEFAULT_EXPLANATION: &str = "No explanation provided.";

/// Parses the model's reply and forces it into the `AnalysisResult` shape.
///
/// The model is asked for a specific structure but nothing guarantees it:
/// `score` is rounded and clamped to 0..=100, a blank `explanation` is
/// replaced and `factors` is coerced to a list of strings. Only a reply
/// without a usable score is rejected.
pub fn parse_analysis(content: &str) -> Result<AnalysisResult, AnalysisError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|err| AnalysisError::MalformedUpstreamOutput(err.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(AnalysisError::MalformedUpstreamOutput(
            "AI response is not a JSON object".into(),
        ));
    };

    let score = fields.get("score").and_then(score_from).ok_or_else(|| {
        AnalysisError::MalformedUpstreamOutput("AI response has no numeric score".into())
    })?;

    Ok(AnalysisResult {
        score,
        explanation: explanation_from(&fields),
        factors: fields.get("factors").map(factors_from).unwrap_or_default(),
    })
}

fn score_from(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn explanation_from(fields: &Map<String, Value>) -> String {
    match fields.get("explanation") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        _ => DEFAULT_EXPLANATION.to_string(),
    }
}

fn factors_from(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(factor_from).collect(),
        Value::String(text) if !text.trim().is_empty() => vec![text.clone()],
        _ => Vec::new(),
    }
}

fn factor_from(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
