use std::fmt;

use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// Lower bound (inclusive) of the `Maybe` tier.
pub const MAYBE_THRESHOLD: u8 = 60;
/// Lower bound (inclusive) of the `Recommended` tier.
pub const RECOMMENDED_THRESHOLD: u8 = 85;

/// Three-way verdict derived from the match percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    Rejected,
    Maybe,
    Recommended,
}

impl Recommendation {
    /// Rubric: <60 Rejected, 60–84 Maybe, ≥85 Recommended.
    pub fn from_score(match_percentage: u8) -> Self {
        if match_percentage >= RECOMMENDED_THRESHOLD {
            Recommendation::Recommended
        } else if match_percentage >= MAYBE_THRESHOLD {
            Recommendation::Maybe
        } else {
            Recommendation::Rejected
        }
    }

    /// Case-insensitive lookup of a model-supplied label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "rejected" => Some(Recommendation::Rejected),
            "maybe" => Some(Recommendation::Maybe),
            "recommended" => Some(Recommendation::Recommended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Rejected => "Rejected",
            Recommendation::Maybe => "Maybe",
            Recommendation::Recommended => "Recommended",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The model-derived half of a candidate record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub applicant_name: String,
    pub years_experience: String,
    pub education_level: String,
    pub match_percentage: u8,
    pub final_recommendation: Recommendation,
    /// The model's own label, kept only when it disagreed with the rubric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_recommendation: Option<String>,
    pub strengths: Vec<String>,
    pub missing_skills: Vec<String>,
    pub skills_gap: String,
    pub summary: String,
}

impl Assessment {
    /// Stand-in verdict for a candidate whose evaluation call failed.
    pub fn transport_failure(error: &dyn fmt::Display) -> Self {
        Self {
            applicant_name: "Error".to_string(),
            years_experience: String::new(),
            education_level: String::new(),
            match_percentage: 0,
            final_recommendation: Recommendation::Rejected,
            model_recommendation: None,
            strengths: vec![],
            missing_skills: vec![],
            skills_gap: "Analysis failed due to technical error.".to_string(),
            summary: format!("API Error: {error}"),
        }
    }
}

/// One analysed resume. Built once by the batch orchestrator, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub assessment: Assessment,
    pub source_file_name: String,
    /// Original upload, kept for preview only.
    #[serde(skip)]
    pub source_file_bytes: Bytes,
    pub source_mime_type: String,
    pub analyzed_by: String,
    pub analyzed_at: NaiveDateTime,
}

impl CandidateRecord {
    pub fn match_percentage(&self) -> u8 {
        self.assessment.match_percentage
    }

    pub fn recommendation(&self) -> Recommendation {
        self.assessment.final_recommendation
    }
}
