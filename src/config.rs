use std::time::Duration;

use crate::poller::PollPolicy;

/// Delay between submitting a job and reading its status.
pub const DEFAULT_OBSERVATION_DELAY: Duration = Duration::from_millis(10_000);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(8);

/// Client-side settings for talking to the analysis service.
///
/// The base URL is shared by the upload, status and recommendation endpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub observation_delay: Duration,
    pub poll_policy: PollPolicy,
}

impl ClientConfig {
    /// Settings for `base_url` with the default timeouts and a single status read.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            observation_delay: DEFAULT_OBSERVATION_DELAY,
            poll_policy: PollPolicy::SingleShot,
        }
    }

    /// Caps the total time of one request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Caps the time spent establishing a connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the wait between upload and the first status read.
    pub fn with_observation_delay(mut self, delay: Duration) -> Self {
        self.observation_delay = delay;
        self
    }

    /// Opts into re-reading a job that is still running.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }
}
