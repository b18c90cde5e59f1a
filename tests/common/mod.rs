#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use dermalens::transport::Method;
use dermalens::{ImageResource, NetworkError, RawResponse, Request, Transport};
use serde_json::Value;
use tokio::time::Instant;

type Reply = Result<RawResponse, NetworkError>;

/// In-memory transport answering from per-route scripts.
///
/// Each route replays its replies in order; the last reply repeats forever.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    log: Mutex<Vec<(Instant, Request)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn on_json(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.on(method, path, Ok(json_response(status, body)))
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub fn request_times(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<RawResponse, NetworkError> {
        let key = (request.method.clone(), request.path.clone());
        self.log.lock().unwrap().push((Instant::now(), request));

        let mut routes = self.routes.lock().unwrap();
        let Some(replies) = routes.get_mut(&key) else {
            return Err(NetworkError::Connect(format!("no route for {} {}", key.0, key.1)));
        };
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap()
        }
    }
}

pub fn json_response(status: u16, body: Value) -> RawResponse {
    RawResponse::new(status, serde_json::to_vec(&body).unwrap())
}

pub fn text_response(status: u16, body: &'static str) -> RawResponse {
    RawResponse::new(status, body)
}

pub fn sample_image() -> ImageResource {
    ImageResource::new(&b"fake-jpeg-bytes"[..], "rash.jpg", "image/jpeg")
}
