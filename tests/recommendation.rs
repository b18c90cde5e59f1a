mod common;

use common::{ScriptedTransport, text_response};
use dermalens::transport::Method;
use dermalens::{
    AllergyList, NetworkError, RawResponse, RecommendationError, RecommendationRequest,
    RecommendationResult, RequestBody, fetch_recommendations,
};
use serde_json::json;

fn request(allergies: &str) -> RecommendationRequest {
    RecommendationRequest {
        skin_disease: "Psoriasis".to_string(),
        allergies: AllergyList::parse(allergies),
    }
}

#[tokio::test]
async fn posts_disease_and_allergies_as_json() {
    let transport = ScriptedTransport::new().on_json(
        Method::POST,
        "/recommend",
        200,
        json!({
            "condition": "Psoriasis",
            "healthy_foods": [{"name": "Salmon", "benefit": "Anti-inflammatory"}],
            "foods_to_avoid": ["gluten"],
            "supplements": [{"name": "Vitamin D", "dosage": "1000 IU"}]
        }),
    );

    let result = fetch_recommendations(&transport, &request("gluten, dairy"))
        .await
        .unwrap();

    assert_eq!(result.condition.as_deref(), Some("Psoriasis"));
    assert_eq!(result.healthy_foods[0].name, "Salmon");
    assert_eq!(result.supplements[0].dosage.as_deref(), Some("1000 IU"));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].body,
        RequestBody::Json(json!({
            "skin_disease": "Psoriasis",
            "allergies": ["gluten", "dairy"]
        }))
    );
}

#[tokio::test]
async fn rejection_uses_body_text() {
    let transport = ScriptedTransport::new().on(
        Method::POST,
        "/recommend",
        Ok(text_response(400, "allergies cannot be empty")),
    );

    let err = fetch_recommendations(&transport, &request(""))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RecommendationError::Rejected("allergies cannot be empty".to_string())
    );
}

#[tokio::test]
async fn rejection_without_body_uses_status_text() {
    let transport = ScriptedTransport::new().on(
        Method::POST,
        "/recommend",
        Ok(text_response(500, "")),
    );

    let err = fetch_recommendations(&transport, &request("gluten"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RecommendationError::Rejected("Internal Server Error".to_string())
    );
}

#[tokio::test]
async fn in_band_error_is_reported() {
    let transport = ScriptedTransport::new().on_json(
        Method::POST,
        "/recommend",
        200,
        json!({"error": "Failed to parse AI response"}),
    );

    let err = fetch_recommendations(&transport, &request("gluten"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RecommendationError::Reported("Failed to parse AI response".to_string())
    );
}

#[tokio::test]
async fn sparse_payload_defaults_to_empty_lists() {
    let transport =
        ScriptedTransport::new().on_json(Method::POST, "/recommend", 200, json!({}));

    let result = fetch_recommendations(&transport, &request("gluten"))
        .await
        .unwrap();
    assert!(result.condition.is_none());
    assert!(result.healthy_foods.is_empty());
    assert!(result.foods_to_avoid.is_empty());
    assert!(result.supplements.is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_network_error() {
    let transport = ScriptedTransport::new().on(
        Method::POST,
        "/recommend",
        Ok(text_response(200, "<html>not json</html>")),
    );

    let err = fetch_recommendations(&transport, &request("gluten"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, RecommendationError::Network(NetworkError::Decode(_))),
        "unexpected error {err:?}"
    );
}

#[tokio::test]
async fn error_with_empty_list_is_not_reported() {
    let transport = ScriptedTransport::new().on_json(
        Method::POST,
        "/recommend",
        200,
        json!({"error": "partial", "healthy_foods": []}),
    );

    let result = fetch_recommendations(&transport, &request("gluten"))
        .await
        .unwrap();
    assert_eq!(result, RecommendationResult::default());
}

#[tokio::test]
async fn rejection_with_invalid_utf8_keeps_the_text() {
    let transport = ScriptedTransport::new().on(
        Method::POST,
        "/recommend",
        Ok(RawResponse::new(502, &b"Bad \xFFgateway"[..])),
    );

    let err = fetch_recommendations(&transport, &request("gluten"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RecommendationError::Rejected("Bad \u{FFFD}gateway".to_string())
    );
}
