//! Scripted transport and recording delay for tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use edge_core::EdgeResponse;

use crate::client::{FetchError, FetchRequest, Transport};
use crate::delay::Delay;

type Scripted = VecDeque<Result<EdgeResponse, String>>;

/// Transport answering from scripted queues and recording every request.
///
/// Requests whose path has a dedicated queue (see [`MockTransport::respond_to`])
/// are served from it; all others from the default queue. A request with no
/// scripted answer left fails with a transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    default: RefCell<Scripted>,
    by_path: RefCell<HashMap<String, Scripted>>,
    requests: RefCell<Vec<FetchRequest>>,
}

impl MockTransport {
    /// Create a transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response on the default queue.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.default
            .borrow_mut()
            .push_back(Ok(EdgeResponse::new(status, Vec::new(), body.as_bytes().to_vec())));
        self
    }

    /// Queue a transport failure on the default queue.
    pub fn fail(self, message: &str) -> Self {
        self.default.borrow_mut().push_back(Err(message.to_string()));
        self
    }

    /// Queue a response for requests to `path`.
    pub fn respond_to(self, path: &str, status: u16, body: &str) -> Self {
        self.by_path
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(Ok(EdgeResponse::new(status, Vec::new(), body.as_bytes().to_vec())));
        self
    }

    /// Queue a transport failure for requests to `path`.
    pub fn fail_to(self, path: &str, message: &str) -> Self {
        self.by_path
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.borrow().clone()
    }

    /// Requests sent to `path`.
    pub fn requests_to(&self, path: &str) -> Vec<FetchRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.url.path() == path)
            .cloned()
            .collect()
    }

    /// Requests not sent to `path`.
    pub fn requests_except(&self, path: &str) -> Vec<FetchRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.url.path() != path)
            .cloned()
            .collect()
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: FetchRequest) -> Result<EdgeResponse, FetchError> {
        let url = request.url.to_string();
        let path = request.url.path().to_string();
        self.requests.borrow_mut().push(request);

        let next = {
            let mut by_path = self.by_path.borrow_mut();
            match by_path.get_mut(&path) {
                Some(queue) => queue.pop_front(),
                None => self.default.borrow_mut().pop_front(),
            }
        };

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(FetchError::Transport { url, message }),
            None => Err(FetchError::Transport {
                url,
                message: "no scripted response".to_string(),
            }),
        }
    }
}

/// Delay that records requested durations without waiting.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    waits: RefCell<Vec<Duration>>,
}

impl RecordingDelay {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far.
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}
