use serde::Deserialize;

use crate::error::NetworkError;
use crate::transport::{Request, Transport};

/// Liveness endpoint of the analysis service.
pub const HEALTH_PATH: &str = "/health";

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Asks the service whether it is up and returns the status line it reports.
pub async fn check<T>(transport: &T) -> Result<String, NetworkError>
where
    T: Transport + ?Sized,
{
    let response = transport.send(Request::get(HEALTH_PATH)).await?;
    if !response.is_success() {
        return Err(NetworkError::Request(format!(
            "health check answered {}",
            response.status_text()
        )));
    }
    let health: HealthResponse = response.json()?;
    log::debug!("Service health: {}", health.status);
    Ok(health.status)
}
