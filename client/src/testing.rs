//! Scripted transport used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use stepin_protocol::{ApiRequest, Method};
use tokio::time::Instant;

use crate::api::{ApiError, ApiResponse, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Status(u16, Value),
    Network(String),
}

type Route = (Method, String);

/// Answers requests from per-route queues of canned replies.
///
/// The last queued reply for a route keeps being served once the queue is
/// down to one entry. Unscripted routes answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<Route, VecDeque<Reply>>>,
    latency: Mutex<HashMap<Route, Duration>>,
    log: Mutex<Vec<(Instant, ApiRequest)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) -> &Self {
        self.push(method, path, Reply::Json(body))
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, Reply::Status(status, body))
    }

    pub fn disconnect(&self, method: Method, path: &str) -> &Self {
        self.push(method, path, Reply::Network("connection refused".to_string()))
    }

    /// Delay every reply on this route
    pub fn latency(&self, method: Method, path: &str, delay: Duration) -> &Self {
        self.latency
            .lock()
            .unwrap()
            .insert((method, path.to_string()), delay);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// When each matching request was issued
    pub fn issued_at(&self, method: Method, path: &str) -> Vec<Instant> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.method == method && r.path == path)
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.issued_at(method, path).len()
    }

    fn next_reply(&self, route: &Route) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::Status(404, json!({ "detail": "Not Found" })),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let route = (request.method, request.path.clone());
        self.log.lock().unwrap().push((Instant::now(), request));

        let delay = self.latency.lock().unwrap().get(&route).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply(&route) {
            Reply::Json(body) => Ok(ApiResponse { status: 200, body }),
            Reply::Status(status, body) => Err(ApiError::Status { status, body }),
            Reply::Network(message) => Err(ApiError::Network(message)),
        }
    }
}

pub(crate) fn meeting_json(id: &str) -> Value {
    json!({
        "meeting_id": id,
        "title": format!("Meeting {id}"),
        "description": null,
        "t1": "2025-03-01T09:00:00",
        "t2": "2025-03-01T10:00:00",
        "lat": 40.44,
        "long": -79.94,
        "participants": ["ana@example.com"],
    })
}
