use crate::error::SubmissionError;
use crate::image::ImageResource;
use crate::messages::UploadResponse;
use crate::transport::{Request, Transport};

/// Endpoint accepting multipart image uploads.
pub const UPLOAD_PATH: &str = "/upload";

/// Opaque token for a submitted analysis job.
///
/// Not `Clone`: a handle is consumed by exactly one wait on its result.
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle {
    status_path: String,
}

impl JobHandle {
    /// Wraps the status path the service answered with.
    pub fn new(status_path: impl Into<String>) -> Self {
        Self {
            status_path: status_path.into(),
        }
    }

    /// Path to read the job status from.
    pub fn status_path(&self) -> &str {
        &self.status_path
    }
}

/// Uploads `image` and returns the handle of the analysis job it started.
pub async fn submit<T>(transport: &T, image: &ImageResource) -> Result<JobHandle, SubmissionError>
where
    T: Transport + ?Sized,
{
    log::debug!("Submitting {} for analysis", image.filename());

    let response = transport
        .send(Request::post_image(UPLOAD_PATH, image.clone()))
        .await?;

    if !response.is_success() {
        let message = response.text_lossy();
        log::warn!("Upload rejected with status {}: {}", response.status, message);
        return Err(SubmissionError::Rejected(message));
    }

    let upload: UploadResponse = response.json()?;
    let status_path = upload.accepted_status_url().ok_or_else(|| {
        log::warn!("Upload answered without a usable status URL");
        SubmissionError::InvalidResponse
    })?;

    log::info!("Upload accepted, status URL: {}", status_path);

    Ok(JobHandle::new(status_path))
}
