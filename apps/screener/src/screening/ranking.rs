//! Derived views over a batch's records. Never mutates input.

use serde::Serialize;

use crate::models::candidate::{CandidateRecord, Recommendation};

/// Colour band used by the comparison view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// 85 and above
    Strong,
    /// 50–84
    Moderate,
    /// below 50
    Weak,
}

impl ScoreBand {
    pub fn from_score(match_percentage: u8) -> Self {
        match match_percentage {
            85..=u8::MAX => ScoreBand::Strong,
            50..=84 => ScoreBand::Moderate,
            _ => ScoreBand::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub candidates: usize,
    pub top_match: Option<u8>,
    pub recommended: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub band: ScoreBand,
    #[serde(flatten)]
    pub record: CandidateRecord,
}

/// Sorts by match percentage, highest first. Ties keep their input order.
pub fn rank(records: &[CandidateRecord]) -> Vec<CandidateRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| b.match_percentage().cmp(&a.match_percentage()));
    ranked
}

pub fn summarize(records: &[CandidateRecord]) -> BatchSummary {
    BatchSummary {
        candidates: records.len(),
        top_match: records.iter().map(|r| r.match_percentage()).max(),
        recommended: records
            .iter()
            .filter(|r| r.recommendation() == Recommendation::Recommended)
            .count(),
    }
}

/// Ranked records annotated with their position and score band.
pub fn ranked_view(records: &[CandidateRecord]) -> Vec<RankedCandidate> {
    rank(records)
        .into_iter()
        .enumerate()
        .map(|(i, record)| RankedCandidate {
            rank: i + 1,
            band: ScoreBand::from_score(record.match_percentage()),
            record,
        })
        .collect()
}
