//! Encoding of a finished run for the results screen.
//!
//! The encoded form is percent-encoded JSON, safe to carry in a query string.
//! The diagnosis label and allergy list are stored already normalized; the
//! consumer only decodes them.

use serde::{Deserialize, Serialize};

use crate::allergy::AllergyList;
use crate::error::HandoffError;
use crate::poller::AnalysisResult;
use crate::recommendation::RecommendationResult;

/// Everything the results screen shows for one successful run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultsHandoff {
    pub analysis: AnalysisResult,
    pub allergies: AllergyList,
    pub recommendations: RecommendationResult,
}

impl ResultsHandoff {
    /// Bundles the outputs of a successful run.
    pub fn new(
        analysis: AnalysisResult,
        allergies: AllergyList,
        recommendations: RecommendationResult,
    ) -> Self {
        Self {
            analysis,
            allergies,
            recommendations,
        }
    }

    /// Condition to show as the heading: the service's own name for it, else the diagnosis.
    pub fn condition(&self) -> &str {
        self.recommendations
            .condition
            .as_deref()
            .filter(|condition| !condition.is_empty())
            .unwrap_or(&self.analysis.diagnosis)
    }

    /// Serializes to JSON and percent-encodes it.
    pub fn encode(&self) -> Result<String, HandoffError> {
        let json = serde_json::to_string(self)?;
        Ok(urlencoding::encode(&json).into_owned())
    }

    /// Reverses [`encode`](Self::encode) without re-deriving any field.
    pub fn decode(encoded: &str) -> Result<Self, HandoffError> {
        let json = urlencoding::decode(encoded)
            .map_err(|e| HandoffError::Encoding(e.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
