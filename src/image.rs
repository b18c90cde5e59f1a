use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::ImageError;

/// Binary image data together with the filename and MIME type sent on upload.
///
/// The payload is reference counted, so cloning does not copy the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageResource {
    data: Bytes,
    filename: String,
    mime_type: String,
}

impl ImageResource {
    /// Wraps in-memory image bytes with their filename and MIME type.
    pub fn new(
        data: impl Into<Bytes>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Reads an image from disk, inferring its filename and MIME type from the path.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let mime_type = mime_type_for(path)?;
        let data = tokio::fs::read(path).await?;
        if data.is_empty() {
            return Err(ImageError::Empty);
        }

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(fallback_filename);

        log::debug!("Loaded image {} ({} bytes, {})", filename, data.len(), mime_type);

        Ok(Self::new(data, filename, mime_type))
    }

    /// Raw image bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Filename sent with the upload.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// MIME type sent with the upload.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

fn mime_type_for(path: &Path) -> Result<&'static str, ImageError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| ImageError::UnsupportedFormat(path.display().to_string()))?;

    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        _ => Err(ImageError::UnsupportedFormat(extension.to_string())),
    }
}

fn fallback_filename() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("image-{millis}.jpg")
}
