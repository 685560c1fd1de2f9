//! Turns raw model output into a validated [`Assessment`].
//!
//! The rubric is enforced: the final recommendation is always derived from the
//! match percentage. A disagreeing model label is kept in
//! `model_recommendation` for audit.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::candidate::{Assessment, Recommendation};

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("field '{field}' has an invalid value: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Wire shape of the model's answer. Every field is optional here; required
/// ones are checked in [`parse`].
#[derive(Debug, Deserialize)]
struct RawAssessment {
    applicant_name: Option<Value>,
    match_percentage: Option<Value>,
    final_recommendation: Option<Value>,
    years_experience: Option<Value>,
    education_level: Option<Value>,
    strengths: Option<Value>,
    missing_skills: Option<Value>,
    skills_gap: Option<Value>,
    summary: Option<Value>,
}

/// Parses and validates one model response.
pub fn parse(raw_text: &str) -> Result<Assessment, ParseError> {
    let trimmed = raw_text.trim();
    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) if trimmed.starts_with('{') => value,
        _ => serde_json::from_str(strip_code_fence(raw_text))?,
    };
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let raw: RawAssessment = serde_json::from_value(value)?;

    let applicant_name = raw
        .applicant_name
        .filter(|v| !v.is_null())
        .ok_or(ParseError::MissingField("applicant_name"))?;
    let match_percentage = raw
        .match_percentage
        .filter(|v| !v.is_null())
        .ok_or(ParseError::MissingField("match_percentage"))?;
    let model_label = raw
        .final_recommendation
        .filter(|v| !v.is_null())
        .ok_or(ParseError::MissingField("final_recommendation"))?;

    let match_percentage = parse_score(&match_percentage)?;
    let final_recommendation = Recommendation::from_score(match_percentage);

    let model_label = text_field(Some(model_label));
    let model_recommendation = match Recommendation::from_label(&model_label) {
        Some(label) if label == final_recommendation => None,
        _ => {
            warn!(
                "Model label '{model_label}' disagrees with score {match_percentage}; using {final_recommendation}"
            );
            Some(model_label)
        }
    };

    let applicant_name = text_field(Some(applicant_name));
    let applicant_name = if applicant_name.trim().is_empty() {
        "Unknown".to_string()
    } else {
        applicant_name.trim().to_string()
    };

    Ok(Assessment {
        applicant_name,
        years_experience: text_field(raw.years_experience),
        education_level: text_field(raw.education_level),
        match_percentage,
        final_recommendation,
        model_recommendation,
        strengths: list_field(raw.strengths),
        missing_skills: list_field(raw.missing_skills),
        skills_gap: text_field(raw.skills_gap),
        summary: text_field(raw.summary),
    })
}

/// Returns the contents of the first fenced block, or the whole input when
/// there is no fence. Fences only open at the start of a line and close at
/// the start or end of one, so backticks inside JSON strings are left alone.
/// An optional language tag after the opening fence is skipped; an unclosed
/// fence runs to the end of the input.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(open) = fence_positions(text).find(|&i| at_line_start(text, i)) else {
        return text.trim();
    };
    let after_open = text[open + FENCE.len()..].trim_start_matches([' ', '\t']);
    let tag_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];

    let close = fence_positions(body)
        .find(|&i| at_line_start(body, i) || at_line_end(body, i + FENCE.len()));
    match close {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn fence_positions(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.match_indices(FENCE).map(|(i, _)| i)
}

fn at_line_start(text: &str, index: usize) -> bool {
    text[..index]
        .rsplit('\n')
        .next()
        .unwrap_or("")
        .trim()
        .is_empty()
}

fn at_line_end(text: &str, index: usize) -> bool {
    text[index..]
        .split('\n')
        .next()
        .unwrap_or("")
        .trim()
        .is_empty()
}

/// Accepts 85, 85.4, "85" and "85%"; clamps to 0..=100.
fn parse_score(value: &Value) -> Result<u8, ParseError> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    match score {
        Some(score) if score.is_finite() => Ok(score.round().clamp(0.0, 100.0) as u8),
        _ => Err(ParseError::InvalidField {
            field: "match_percentage",
            value: value.to_string(),
        }),
    }
}

fn text_field(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

fn list_field(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| text_field(Some(item)))
            .filter(|item| !item.trim().is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => vec![],
    }
}
