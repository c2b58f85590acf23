use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary verdict returned by the classification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Prediction {
    Real,
    Fake,
}

impl Prediction {
    pub fn is_fake(self) -> bool {
        matches!(self, Prediction::Fake)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Real => write!(f, "REAL"),
            Prediction::Fake => write!(f, "FAKE"),
        }
    }
}

/// Optional per-review analysis detail attached to a verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub malaysian_terms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_time: Option<f64>,
}

/// One classified review: verdict, confidence in 0..=1, optional detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub prediction: Prediction,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl ClassificationResult {
    /// Confidence as a whole percentage, clamped to 0..=100.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// The service's response envelope: `{"predictions": {"review 1": {...}}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionsResponse {
    pub predictions: BTreeMap<String, ClassificationResult>,
}

impl PredictionsResponse {
    /// Re-key predictions by numeric review index.
    ///
    /// Keys that don't parse as `review {i}` are returned separately so the
    /// caller can log them; they are never applied to badges.
    pub fn into_indexed(self) -> (BTreeMap<u32, ClassificationResult>, Vec<String>) {
        let mut indexed = BTreeMap::new();
        let mut rejected = Vec::new();
        for (key, result) in self.predictions {
            match parse_review_key(&key) {
                Some(index) => {
                    indexed.insert(index, result);
                }
                None => rejected.push(key),
            }
        }
        (indexed, rejected)
    }
}

/// Parse a correlation key like `review 3` into its index.
pub fn parse_review_key(key: &str) -> Option<u32> {
    key.strip_prefix("review ")?.trim().parse().ok()
}
