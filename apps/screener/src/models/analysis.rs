use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::candidate::CandidateRecord;

/// Flattened persistence row, one per analysed candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub analyzed_at: NaiveDateTime,
    pub analyzed_by: String,
    pub applicant_name: String,
    pub source_file_name: String,
    pub match_percentage: i32,
    pub final_recommendation: String,
    pub strengths: String,
    pub missing_skills: String,
    pub summary: String,
    pub years_experience: String,
    pub education_level: String,
}

impl From<&CandidateRecord> for AnalysisRow {
    fn from(record: &CandidateRecord) -> Self {
        let assessment = &record.assessment;
        Self {
            analyzed_at: record.analyzed_at,
            analyzed_by: record.analyzed_by.clone(),
            applicant_name: assessment.applicant_name.clone(),
            source_file_name: record.source_file_name.clone(),
            match_percentage: i32::from(assessment.match_percentage),
            final_recommendation: assessment.final_recommendation.to_string(),
            strengths: assessment.strengths.join(", "),
            missing_skills: assessment.missing_skills.join(", "),
            summary: assessment.summary.clone(),
            years_experience: assessment.years_experience.clone(),
            education_level: assessment.education_level.clone(),
        }
    }
}
