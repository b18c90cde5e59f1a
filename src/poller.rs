use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{ClientConfig, DEFAULT_OBSERVATION_DELAY};
use crate::error::{DEFAULT_FAILURE_MESSAGE, PollError};
use crate::messages::StatusResponse;
use crate::submission::JobHandle;
use crate::transport::{Request, Transport};

/// Label used when a prediction does not name a class.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// The `prediction` field as sent by the service: a bare label or a structured object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prediction {
    Label(String),
    Structured(StructuredPrediction),
    Other(Value),
}

/// Object-shaped prediction; fields other than `predicted_class` are kept as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructuredPrediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_class: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Prediction {
    /// The class name this prediction carries, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Prediction::Label(label) => Some(label.as_str()),
            Prediction::Structured(structured) => structured
                .predicted_class
                .as_deref()
                .filter(|class| !class.is_empty()),
            Prediction::Other(_) => None,
        }
    }
}

/// Maps any prediction shape to the single diagnosis label used downstream.
pub fn normalize_label(prediction: Option<&Prediction>) -> String {
    prediction
        .and_then(Prediction::label)
        .unwrap_or(UNKNOWN_LABEL)
        .to_string()
}

/// A completed analysis.
///
/// `diagnosis` is always the normalized label; the raw prediction is kept alongside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub diagnosis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_output: Option<Value>,
}

impl AnalysisResult {
    /// Builds a result, deriving `diagnosis` from `prediction`.
    pub fn new(
        prediction: Option<Prediction>,
        confidence: Option<f64>,
        full_output: Option<Value>,
    ) -> Self {
        Self {
            diagnosis: normalize_label(prediction.as_ref()),
            prediction,
            confidence,
            full_output,
        }
    }
}

/// Status of a remote job as reported by one status read.
#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed(AnalysisResult),
    Failed(String),
    /// Any status string the client does not know, including `not_found`.
    Unrecognized(String),
}

impl JobStatus {
    /// Classifies one status answer.
    pub fn from_response(response: StatusResponse) -> Self {
        match response.status.as_deref() {
            Some("pending") => JobStatus::Pending,
            Some("processing") => JobStatus::Processing,
            Some("completed") => {
                let confidence = response.confidence();
                let prediction = response
                    .prediction
                    .and_then(|value| serde_json::from_value(value).ok());
                JobStatus::Completed(AnalysisResult::new(
                    prediction,
                    confidence,
                    response.full_output,
                ))
            }
            Some("failed") => JobStatus::Failed(
                response
                    .error_message()
                    .filter(|error| !error.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            ),
            Some(other) => JobStatus::Unrecognized(other.to_string()),
            None => JobStatus::Unrecognized("missing".to_string()),
        }
    }

    /// Whether the job has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }

    /// The status string as the service spells it.
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed(_) => "completed",
            JobStatus::Failed(_) => "failed",
            JobStatus::Unrecognized(status) => status.as_str(),
        }
    }
}

/// How many status reads to make after the observation delay.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PollPolicy {
    /// One read; a non-terminal status fails as inconclusive.
    #[default]
    SingleShot,
    /// Re-read non-terminal jobs with doubling intervals, up to `max_attempts` reads.
    Backoff {
        max_attempts: u32,
        initial_interval: Duration,
        max_interval: Duration,
    },
}

impl PollPolicy {
    /// Total number of status reads allowed, at least one.
    pub fn max_attempts(&self) -> u32 {
        match self {
            PollPolicy::SingleShot => 1,
            PollPolicy::Backoff { max_attempts, .. } => (*max_attempts).max(1),
        }
    }

    /// Wait inserted after the `attempt`-th read (1-based) before the next one.
    pub fn interval_after(&self, attempt: u32) -> Duration {
        match self {
            PollPolicy::SingleShot => Duration::ZERO,
            PollPolicy::Backoff {
                initial_interval,
                max_interval,
                ..
            } => {
                let factor = 1u32
                    .checked_shl(attempt.saturating_sub(1))
                    .unwrap_or(u32::MAX);
                initial_interval.saturating_mul(factor).min(*max_interval)
            }
        }
    }
}

/// Waits for a submitted job to reach a terminal state.
#[derive(Clone, Debug, PartialEq)]
pub struct Poller {
    observation_delay: Duration,
    policy: PollPolicy,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVATION_DELAY, PollPolicy::SingleShot)
    }
}

impl Poller {
    /// A poller that waits `observation_delay` before its first read.
    pub fn new(observation_delay: Duration, policy: PollPolicy) -> Self {
        Self {
            observation_delay,
            policy,
        }
    }

    /// A poller using the delay and policy from `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.observation_delay, config.poll_policy.clone())
    }

    /// Sleeps for the observation delay, then reads the job status.
    ///
    /// Reads never overlap: each query resolves before the next wait starts.
    pub async fn await_result<T>(
        &self,
        transport: &T,
        handle: JobHandle,
    ) -> Result<AnalysisResult, PollError>
    where
        T: Transport + ?Sized,
    {
        log::debug!(
            "Waiting {:?} before reading {}",
            self.observation_delay,
            handle.status_path()
        );
        tokio::time::sleep(self.observation_delay).await;

        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;
        loop {
            match query_status(transport, &handle).await? {
                JobStatus::Completed(result) => {
                    log::info!("Analysis complete: {}", result.diagnosis);
                    return Ok(result);
                }
                JobStatus::Failed(message) => {
                    log::warn!("Analysis failed: {}", message);
                    return Err(PollError::Failed(message));
                }
                status if attempt >= max_attempts => {
                    log::warn!(
                        "Job {} still {} after {} read(s)",
                        handle.status_path(),
                        status.as_str(),
                        attempt
                    );
                    return Err(PollError::Inconclusive(status.as_str().to_string()));
                }
                status => {
                    let interval = self.policy.interval_after(attempt);
                    log::debug!(
                        "Job {} is {}, reading again in {:?}",
                        handle.status_path(),
                        status.as_str(),
                        interval
                    );
                    tokio::time::sleep(interval).await;
                    attempt += 1;
                }
            }
        }
    }
}

async fn query_status<T>(transport: &T, handle: &JobHandle) -> Result<JobStatus, PollError>
where
    T: Transport + ?Sized,
{
    let response = transport.send(Request::get(handle.status_path())).await?;
    if !response.is_success() {
        log::warn!(
            "Status read for {} answered {}",
            handle.status_path(),
            response.status
        );
    }
    let status: StatusResponse = response.json()?;
    Ok(JobStatus::from_response(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prediction(value: Value) -> Prediction {
        serde_json::from_value(value).unwrap()
    }

    fn status(value: Value) -> JobStatus {
        JobStatus::from_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn bare_label_is_used_verbatim() {
        assert_eq!(normalize_label(Some(&prediction(json!("Eczema")))), "Eczema");
    }

    #[test]
    fn structured_prediction_uses_predicted_class() {
        let p = prediction(json!({"predicted_class": "Acne", "confidence": 0.4}));
        assert!(matches!(p, Prediction::Structured(_)));
        assert_eq!(normalize_label(Some(&p)), "Acne");
    }

    #[test]
    fn other_shapes_normalize_to_unknown() {
        assert_eq!(normalize_label(Some(&prediction(json!(42)))), UNKNOWN_LABEL);
        assert_eq!(normalize_label(Some(&prediction(json!({})))), UNKNOWN_LABEL);
        assert_eq!(
            normalize_label(Some(&prediction(json!({"predicted_class": 7})))),
            UNKNOWN_LABEL
        );
        assert_eq!(
            normalize_label(Some(&prediction(json!({"predicted_class": ""})))),
            UNKNOWN_LABEL
        );
        assert_eq!(normalize_label(None), UNKNOWN_LABEL);
    }

    #[test]
    fn structured_prediction_keeps_extra_fields() {
        let p = prediction(json!({"predicted_class": "Acne", "top_k": ["Acne", "Rosacea"]}));
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({"predicted_class": "Acne", "top_k": ["Acne", "Rosacea"]})
        );
    }

    #[test]
    fn completed_status_builds_analysis_result() {
        let result = match status(json!({
            "status": "completed",
            "prediction": "Psoriasis",
            "confidence": 0.87,
            "full_output": {"predicted_class": "Psoriasis"}
        })) {
            JobStatus::Completed(result) => result,
            other => panic!("unexpected status {other:?}"),
        };
        assert_eq!(result.diagnosis, "Psoriasis");
        assert_eq!(result.confidence, Some(0.87));
        assert_eq!(result.full_output, Some(json!({"predicted_class": "Psoriasis"})));
    }

    #[test]
    fn completed_without_prediction_is_unknown() {
        match status(json!({"status": "completed"})) {
            JobStatus::Completed(result) => {
                assert_eq!(result.diagnosis, UNKNOWN_LABEL);
                assert_eq!(result.prediction, None);
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn failed_status_message_defaults() {
        assert_eq!(
            status(json!({"status": "failed", "error": "bad image"})),
            JobStatus::Failed("bad image".to_string())
        );
        assert_eq!(
            status(json!({"status": "failed"})),
            JobStatus::Failed(DEFAULT_FAILURE_MESSAGE.to_string())
        );
    }

    #[test]
    fn loosely_typed_fields_do_not_break_the_read() {
        match status(json!({"status": "completed", "prediction": "Acne", "confidence": "high"})) {
            JobStatus::Completed(result) => {
                assert_eq!(result.diagnosis, "Acne");
                assert_eq!(result.confidence, None);
            }
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(
            status(json!({"status": "failed", "error": 500})),
            JobStatus::Failed("500".to_string())
        );
    }

    #[test]
    fn non_terminal_statuses() {
        assert_eq!(status(json!({"status": "pending"})), JobStatus::Pending);
        assert_eq!(status(json!({"status": "processing"})), JobStatus::Processing);
        let unknown = status(json!({"status": "not_found"}));
        assert_eq!(unknown.as_str(), "not_found");
        assert!(!unknown.is_terminal());
        assert_eq!(status(json!({})).as_str(), "missing");
    }

    #[test]
    fn backoff_intervals_double_and_cap() {
        let policy = PollPolicy::Backoff {
            max_attempts: 10,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
        };
        assert_eq!(policy.interval_after(1), Duration::from_secs(1));
        assert_eq!(policy.interval_after(2), Duration::from_secs(2));
        assert_eq!(policy.interval_after(3), Duration::from_secs(4));
        assert_eq!(policy.interval_after(4), Duration::from_secs(5));
        assert_eq!(policy.interval_after(40), Duration::from_secs(5));
        assert_eq!(PollPolicy::SingleShot.max_attempts(), 1);
    }
}
