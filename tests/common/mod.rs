use _formcraft_core::config::ApiConfig;
use _formcraft_core::editor;
use _formcraft_core::gateway::{ApiRequest, ApiResponse, FormsApi, HttpTransport};
use _formcraft_core::ids::SequentialIds;
use _formcraft_core::model::{Document, NodeId};
use _formcraft_core::RequestError;
use anyhow::{anyhow, Result};
use futures::channel::oneshot;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Transport that replays queued responses and records every request.
///
/// With a gate installed, the next request waits until the gate's sender
/// fires or is dropped.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<Result<ApiResponse, RequestError>>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.push(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(self, error: RequestError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn gated(self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut gate) = self.gate.lock() {
            *gate = Some(rx);
        }
        (self, tx)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, response: Result<ApiResponse, RequestError>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, RequestError>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let gate = self.gate.lock().ok().and_then(|mut g| g.take());
        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(RequestError::network("no response queued")));
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            response
        })
    }
}

#[allow(dead_code)]
pub fn setup_api(transport: MockTransport) -> Result<FormsApi<MockTransport>> {
    let config = ApiConfig::from_uri("http://api.test/")?;
    Ok(FormsApi::new(config, transport))
}

/// A fresh document and the generator that built it.
#[allow(dead_code)]
pub fn setup_document() -> (Document, SequentialIds) {
    let mut ids = SequentialIds::new();
    let doc = editor::new_document(&mut ids);
    (doc, ids)
}

/// Ids of the first row and its first column in the first section.
#[allow(dead_code)]
pub fn first_slot(doc: &Document) -> Result<(NodeId, NodeId)> {
    let row = doc
        .form
        .sections
        .first()
        .and_then(|s| s.rows.first())
        .ok_or_else(|| anyhow!("document has no row"))?;
    let column = row
        .columns
        .first()
        .ok_or_else(|| anyhow!("row has no column"))?;
    Ok((row.id.clone(), column.id.clone()))
}
