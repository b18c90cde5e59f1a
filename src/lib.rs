//! Client-side orchestration for remote skin image analysis.
//!
//! A [`Workflow`] uploads an image, waits for the analysis job it starts,
//! and then asks for diet and supplement recommendations for the diagnosed
//! condition, taking the user's allergies into account. Each step talks to
//! the service through a [`Transport`], so the whole sequence can run
//! against [`HttpTransport`] or an in-memory implementation.

pub mod allergy;
pub mod config;
pub mod error;
pub mod handoff;
pub mod health;
pub mod image;
pub mod messages;
pub mod poller;
pub mod recommendation;
pub mod submission;
pub mod transport;
pub mod workflow;

pub use allergy::AllergyList;
pub use config::ClientConfig;
pub use error::{
    HandoffError, ImageError, NetworkError, PollError, RecommendationError, SubmissionError,
    WorkflowError,
};
pub use handoff::ResultsHandoff;
pub use image::ImageResource;
pub use poller::{AnalysisResult, JobStatus, PollPolicy, Poller, Prediction, normalize_label};
pub use recommendation::{
    Food, RecommendationRequest, RecommendationResult, Supplement, fetch_recommendations,
};
pub use submission::{JobHandle, submit};
pub use transport::{HttpTransport, RawResponse, Request, RequestBody, Transport};
pub use workflow::{Stage, Workflow, WorkflowOutcome};
pub use tokio_util::sync::CancellationToken;
