//! Minimal HTTP request/response layer used by every workflow stage.
//!
//! A non-2xx status is returned to the caller as data. Only failures to reach
//! the server, timeouts and undecodable bodies are reported as [`NetworkError`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::NetworkError;
use crate::image::ImageResource;

pub use reqwest::Method;

/// Multipart field that carries the uploaded image.
pub const IMAGE_FIELD: &str = "image";

/// Body of an outgoing request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// A multipart form with a single binary file field.
    Multipart {
        field: String,
        image: ImageResource,
    },
}

/// A request relative to the transport's base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A `GET` with no body.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: RequestBody::Empty,
            headers: Vec::new(),
        }
    }

    /// A `POST` whose body is `body` serialized as JSON.
    pub fn post_json<T: serde::Serialize>(
        path: impl Into<String>,
        body: &T,
    ) -> Result<Self, NetworkError> {
        let value = serde_json::to_value(body)
            .map_err(|e| NetworkError::Request(format!("failed to encode body: {e}")))?;
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Json(value),
            headers: Vec::new(),
        })
    }

    /// A multipart `POST` carrying `image` under [`IMAGE_FIELD`].
    pub fn post_image(path: impl Into<String>, image: ImageResource) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Multipart {
                field: IMAGE_FIELD.to_string(),
                image,
            },
            headers: Vec::new(),
        }
    }

    /// Adds an extra header to the request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A response whose body is decoded only when asked for.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    /// A response with the given status and raw body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Canonical reason phrase for the status code, e.g. `"Not Found"`.
    pub fn status_text(&self) -> String {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String, NetworkError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| NetworkError::Decode(format!("response body is not UTF-8: {e}")))
    }

    /// Body as text with invalid UTF-8 replaced, for error messages.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body decoded as JSON; malformed JSON is a [`NetworkError::Decode`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NetworkError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends one request to the analysis service.
///
/// Implementations resolve `Request::path` against their own base URL and
/// return every HTTP answer, whatever its status, as a [`RawResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<RawResponse, NetworkError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn send(&self, request: Request) -> Result<RawResponse, NetworkError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: Request) -> Result<RawResponse, NetworkError> {
        (**self).send(request).await
    }
}

/// [`Transport`] backed by a `reqwest` client bound to one base URL.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Builds the client with the timeouts and base URL from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, NetworkError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            http,
        })
    }

    /// The base URL every request path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves `path` against the base URL.
    ///
    /// An absolute URL only contributes its path and query: requests never
    /// leave the configured host.
    fn url(&self, path: &str) -> String {
        let path = match reqwest::Url::parse(path) {
            Ok(absolute) if absolute.has_host() => match absolute.query() {
                Some(query) => format!("{}?{}", absolute.path(), query),
                None => absolute.path().to_string(),
            },
            _ => path.to_string(),
        };
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<RawResponse, NetworkError> {
        let url = self.url(&request.path);
        log::debug!("{} {}", request.method, url);

        let mut builder = self
            .http
            .request(request.method, url.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { field, image } => {
                let part = Part::bytes(image.data().to_vec())
                    .file_name(image.filename().to_string())
                    .mime_str(image.mime_type())?;
                builder.multipart(Form::new().part(field, part))
            }
        };

        let response = builder.send().await.map_err(|e| {
            log::error!("Request to {} failed: {}", url, e);
            NetworkError::from(e)
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        log::debug!("{} answered {} ({} bytes)", url, status, body.len());

        Ok(RawResponse { status, body })
    }
}
