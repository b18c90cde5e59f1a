use thiserror::Error;

/// Message used when the server reports a failed job without an explanation.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Analysis failed on the server.";

/// Transport-level failures. Non-2xx responses are never reported here.
///
/// Only strings are carried so that every error in the crate stays `Clone + PartialEq`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),
    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout(err.to_string())
        } else if err.is_connect() {
            NetworkError::Connect(err.to_string())
        } else if err.is_decode() {
            NetworkError::Decode(err.to_string())
        } else {
            NetworkError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::Decode(err.to_string())
    }
}

/// Failures while uploading an image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// The server rejected the upload with a non-2xx status.
    #[error("upload failed: {0}")]
    Rejected(String),
    /// The server accepted the upload but did not return a usable job handle.
    #[error("invalid server response")]
    InvalidResponse,
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Failures while waiting for an analysis job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    /// The server reported a terminal failure.
    #[error("{0}")]
    Failed(String),
    /// The job was still not in a terminal state after the observation window.
    #[error("task status: {0}. Try again later.")]
    Inconclusive(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Failures while fetching recommendations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendationError {
    /// The server rejected the request with a non-2xx status.
    #[error("failed to get recommendations: {0}")]
    Rejected(String),
    /// The server answered 2xx but the payload only carried an error.
    #[error("failed to get recommendations: {0}")]
    Reported(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// The error that terminated a workflow run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Recommendation(#[from] RecommendationError),
    /// The run was cancelled before it could finish.
    #[error("analysis cancelled")]
    Cancelled,
}

/// Failures while loading a local image.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("image is empty")]
    Empty,
}

/// Failures while decoding a results hand-off string.
#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("invalid hand-off encoding: {0}")]
    Encoding(String),
    #[error("invalid hand-off payload: {0}")]
    Json(#[from] serde_json::Error),
}
