use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::allergy::AllergyList;
use crate::config::ClientConfig;
use crate::error::WorkflowError;
use crate::image::ImageResource;
use crate::poller::{AnalysisResult, Poller};
use crate::recommendation::{RecommendationRequest, RecommendationResult, fetch_recommendations};
use crate::submission::submit;
use crate::transport::Transport;

/// The step of a workflow run that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Submission,
    Polling,
    Recommendation,
}

impl Stage {
    /// Lowercase stage name used in logs and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Submission => "submission",
            Stage::Polling => "polling",
            Stage::Recommendation => "recommendation",
        }
    }
}

/// Result of one end-to-end run.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowOutcome {
    Success {
        analysis: AnalysisResult,
        recommendations: RecommendationResult,
    },
    Failure {
        stage: Stage,
        error: WorkflowError,
    },
}

impl WorkflowOutcome {
    /// Whether every stage succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success { .. })
    }

    /// Drops the stage tag, keeping only the result or the error.
    pub fn into_result(self) -> Result<(AnalysisResult, RecommendationResult), WorkflowError> {
        match self {
            WorkflowOutcome::Success {
                analysis,
                recommendations,
            } => Ok((analysis, recommendations)),
            WorkflowOutcome::Failure { error, .. } => Err(error),
        }
    }
}

/// Runs submit, wait, and recommend in sequence for one image.
///
/// A `Workflow` holds no per-run state, so one instance may drive many
/// concurrent runs.
pub struct Workflow<T> {
    transport: T,
    poller: Poller,
}

impl<T: Transport> Workflow<T> {
    /// A workflow over `transport` with the poller described by `config`.
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            poller: Poller::from_config(config),
        }
    }

    /// A workflow with an explicitly built poller.
    pub fn with_poller(transport: T, poller: Poller) -> Self {
        Self { transport, poller }
    }

    /// The transport every stage sends through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs upload, wait and recommendation once, stopping at the first failure.
    pub async fn run(&self, image: &ImageResource, allergy_input: &str) -> WorkflowOutcome {
        self.run_until_cancelled(image, allergy_input, &CancellationToken::new())
            .await
    }

    /// Like [`Workflow::run`], but gives up as soon as `cancel` fires.
    ///
    /// Cancelling drops the pending delay or request; later stages are not started.
    pub async fn run_until_cancelled(
        &self,
        image: &ImageResource,
        allergy_input: &str,
        cancel: &CancellationToken,
    ) -> WorkflowOutcome {
        match self.execute(image, allergy_input, cancel).await {
            Ok((analysis, recommendations)) => WorkflowOutcome::Success {
                analysis,
                recommendations,
            },
            Err((stage, error)) => {
                log::warn!("Workflow failed during {}: {}", stage.as_str(), error);
                WorkflowOutcome::Failure { stage, error }
            }
        }
    }

    async fn execute(
        &self,
        image: &ImageResource,
        allergy_input: &str,
        cancel: &CancellationToken,
    ) -> Result<(AnalysisResult, RecommendationResult), (Stage, WorkflowError)> {
        let handle = guarded(Stage::Submission, cancel, submit(&self.transport, image)).await?;

        let analysis = guarded(
            Stage::Polling,
            cancel,
            self.poller.await_result(&self.transport, handle),
        )
        .await?;

        let request = RecommendationRequest {
            skin_disease: analysis.diagnosis.clone(),
            allergies: AllergyList::parse(allergy_input),
        };
        let recommendations = guarded(
            Stage::Recommendation,
            cancel,
            fetch_recommendations(&self.transport, &request),
        )
        .await?;

        Ok((analysis, recommendations))
    }
}

/// Awaits one stage, tagging its error and stopping early on cancellation.
async fn guarded<F, V, E>(
    stage: Stage,
    cancel: &CancellationToken,
    fut: F,
) -> Result<V, (Stage, WorkflowError)>
where
    F: Future<Output = Result<V, E>>,
    E: Into<WorkflowError>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err((stage, WorkflowError::Cancelled)),
        result = fut => result.map_err(|e| (stage, e.into())),
    }
}
