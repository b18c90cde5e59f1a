use serde::{Deserialize, Serialize};

use crate::allergy::AllergyList;
use crate::error::RecommendationError;
use crate::messages::RecommendRequest;
use crate::transport::{Request, Transport};

/// Endpoint answering diet and supplement advice.
pub const RECOMMEND_PATH: &str = "/recommend";

/// The condition to advise on and the allergies the advice must respect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub skin_disease: String,
    pub allergies: AllergyList,
}

/// A food worth eating, with what it provides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
}

/// A supplement with its suggested dosage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
}

/// Diet and supplement advice for one condition. Every field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub healthy_foods: Vec<Food>,
    #[serde(default)]
    pub foods_to_avoid: Vec<String>,
    #[serde(default)]
    pub supplements: Vec<Supplement>,
}

/// Raw `/recommend` payload; the service may answer 2xx with only an `error`.
///
/// Fields stay optional here so that a present-but-empty list is told apart
/// from a missing one.
#[derive(Deserialize)]
struct RecommendPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    healthy_foods: Option<Vec<Food>>,
    #[serde(default)]
    foods_to_avoid: Option<Vec<String>>,
    #[serde(default)]
    supplements: Option<Vec<Supplement>>,
}

impl RecommendPayload {
    fn has_content(&self) -> bool {
        self.condition.is_some()
            || self.healthy_foods.is_some()
            || self.foods_to_avoid.is_some()
            || self.supplements.is_some()
    }

    fn into_result(self) -> Result<RecommendationResult, RecommendationError> {
        let has_content = self.has_content();
        match self.error {
            Some(error) if !has_content => return Err(RecommendationError::Reported(error)),
            _ => {}
        }
        Ok(RecommendationResult {
            condition: self.condition,
            healthy_foods: self.healthy_foods.unwrap_or_default(),
            foods_to_avoid: self.foods_to_avoid.unwrap_or_default(),
            supplements: self.supplements.unwrap_or_default(),
        })
    }
}

/// Requests recommendations for a diagnosed condition and the user's allergies.
pub async fn fetch_recommendations<T>(
    transport: &T,
    request: &RecommendationRequest,
) -> Result<RecommendationResult, RecommendationError>
where
    T: Transport + ?Sized,
{
    log::debug!(
        "Requesting recommendations for {} (allergies: {})",
        request.skin_disease,
        request.allergies
    );

    let body = RecommendRequest {
        skin_disease: request.skin_disease.clone(),
        allergies: request.allergies.as_slice().to_vec(),
    };
    let response = transport.send(Request::post_json(RECOMMEND_PATH, &body)?).await?;

    if !response.is_success() {
        let text = response.text_lossy();
        let message = if text.trim().is_empty() {
            response.status_text()
        } else {
            text
        };
        log::warn!(
            "Recommendation request rejected with status {}: {}",
            response.status,
            message
        );
        return Err(RecommendationError::Rejected(message));
    }

    let payload: RecommendPayload = response.json()?;
    let result = payload.into_result().inspect_err(|err| {
        log::warn!("Recommendation service reported an error: {}", err);
    })?;

    log::info!(
        "Received {} healthy foods, {} foods to avoid, {} supplements",
        result.healthy_foods.len(),
        result.foods_to_avoid.len(),
        result.supplements.len()
    );

    Ok(result)
}
