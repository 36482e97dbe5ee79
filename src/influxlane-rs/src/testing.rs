//! In-memory transport that records requests and replays scripted responses.

use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::transport::{Transport, TransportResponse, WriteRequest};
use crate::{Result, WriteError};

enum Scripted {
    Response(TransportResponse),
    Error(String),
}

#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    requests: Arc<Mutex<Vec<WriteRequest>>>,
    responses: Arc<Mutex<VecDeque<Scripted>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; once the queue is empty every request gets a 204.
    pub fn respond_with(&self, response: TransportResponse) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Response(response));
    }

    pub fn respond_with_status(&self, status: u16, body: &str) {
        self.respond_with(TransportResponse {
            status,
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        });
    }

    pub fn respond_with_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Error(message.to_string()));
    }

    /// Non-destructive snapshot of the requests received so far.
    pub fn requests(&self) -> Vec<WriteRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.body).collect()
    }

    /// Poll until at least `count` requests arrived or `timeout` elapsed.
    pub async fn wait_for_requests(&self, count: usize, timeout: Duration) -> Vec<WriteRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let requests = self.requests();
            if requests.len() >= count || tokio::time::Instant::now() >= deadline {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: WriteRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request);

        let scripted = self.responses.lock().unwrap().pop_front();
        match scripted {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Error(message)) => Err(WriteError::Transport(message.into())),
            None => Ok(TransportResponse {
                status: 204,
                headers: HeaderMap::new(),
                body: Vec::new(),
            }),
        }
    }
}
