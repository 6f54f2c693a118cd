#![allow(dead_code)]

use async_trait::async_trait;
use lot_watch::api::OccupancySource;
use lot_watch::fetch::{FetchFailure, HttpClient};
use lot_watch::model::{AggregateState, DetailState};
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Lets spawned poll tasks run without reaching the next 5s tick.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// [`HttpClient`] that answers from a queue of canned responses.
#[derive(Default)]
pub struct StubClient {
    responses: Mutex<VecDeque<(u16, String)>>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl StubClient {
    pub fn with(responses: &[(u16, &str)]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|(s, b)| (*s, b.to_string())).collect()),
            requests: Arc::default(),
        }
    }
}

#[async_trait]
impl HttpClient for StubClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.requests.lock().unwrap().push(req.url().to_string());
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((404, String::new()));
        let resp = http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        Ok(reqwest::Response::from(resp))
    }
}

/// [`OccupancySource`] with scripted answers. A lot without a scripted
/// payload (or a `None` summary) fails; a lot with a gate blocks until the
/// gate gets a permit.
#[derive(Default)]
pub struct ScriptedSource {
    pub summary: Mutex<Option<AggregateState>>,
    pub details: Mutex<HashMap<String, DetailState>>,
    pub gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    pub calls: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn set_summary(&self, summary: Option<AggregateState>) {
        *self.summary.lock().unwrap() = summary;
    }

    pub fn set_details(&self, lot_id: &str, detail: DetailState) {
        self.details
            .lock()
            .unwrap()
            .insert(lot_id.to_string(), detail);
    }

    pub fn gate(&self, lot_id: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(lot_id.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

fn unavailable() -> FetchFailure {
    FetchFailure::Status(StatusCode::SERVICE_UNAVAILABLE)
}

#[async_trait]
impl OccupancySource for ScriptedSource {
    async fn parking_data(&self) -> Result<AggregateState, FetchFailure> {
        self.calls.lock().unwrap().push("summary".to_string());
        let summary = self.summary.lock().unwrap().clone();
        summary.ok_or_else(unavailable)
    }

    async fn parking_details(&self, lot_id: &str) -> Result<DetailState, FetchFailure> {
        self.calls.lock().unwrap().push(lot_id.to_string());
        let gate = self.gates.lock().unwrap().get(lot_id).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.map_err(|_| unavailable())?;
        }
        self.completed.lock().unwrap().push(lot_id.to_string());
        let detail = self.details.lock().unwrap().get(lot_id).cloned();
        detail.ok_or_else(unavailable)
    }
}
