//! Testing utilities for the Transaction Hub workspace
//!
//! In-memory webhook, fixtures and session setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use txhub_core::{
    FetchedRecords, FormConfig, NetworkError, RecordingNotifier, TransactionPayload,
    TransactionSession, WebhookTransport,
};

#[derive(Debug, Default)]
struct FakeState {
    records: FetchedRecords,
    fetch_failures: VecDeque<NetworkError>,
    submit_failures: VecDeque<NetworkError>,
    fetched: Vec<String>,
    submitted: Vec<Value>,
    store_submissions: bool,
}

/// In-memory webhook. Clones share state, so a test can keep a handle
/// after moving one into a session.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` on every fetch
    pub fn with_records(records: FetchedRecords) -> Self {
        let fake = Self::new();
        fake.state.lock().records = records;
        fake
    }

    /// Make accepted submissions replace the served records
    pub fn storing(self) -> Self {
        self.state.lock().store_submissions = true;
        self
    }

    /// Fail the next fetch
    pub fn fail_next_fetch(&self, error: NetworkError) {
        self.state.lock().fetch_failures.push_back(error);
    }

    /// Fail the next submit
    pub fn fail_next_submit(&self, error: NetworkError) {
        self.state.lock().submit_failures.push_back(error);
    }

    /// Identifiers fetched so far
    pub fn fetched(&self) -> Vec<String> {
        self.state.lock().fetched.clone()
    }

    /// Bodies submitted so far, as sent on the wire
    pub fn submitted(&self) -> Vec<Value> {
        self.state.lock().submitted.clone()
    }
}

#[async_trait]
impl WebhookTransport for FakeTransport {
    async fn fetch(&self, transaction_id: &str) -> Result<FetchedRecords, NetworkError> {
        let mut state = self.state.lock();
        state.fetched.push(transaction_id.to_string());
        if let Some(error) = state.fetch_failures.pop_front() {
            return Err(error);
        }
        Ok(state.records.clone())
    }

    async fn submit(&self, payload: &TransactionPayload) -> Result<(), NetworkError> {
        let mut state = self.state.lock();
        if let Some(error) = state.submit_failures.pop_front() {
            return Err(error);
        }
        let body = payload.to_json();
        if state.store_submissions {
            state.records = FetchedRecords {
                transaction: Some(body["transaction"].clone()),
                webcheckout: Some(body["webcheckout"].clone()),
            };
        }
        state.submitted.push(body);
        Ok(())
    }
}

/// Records for transaction `T1`, one with Extended JSON wrappers
pub fn sample_records() -> FetchedRecords {
    FetchedRecords {
        transaction: Some(json!({
            "id": "T1",
            "amount": 500,
            "currency": "COP",
            "approved": false
        })),
        webcheckout: Some(json!({
            "_id": {"$oid": "65a0f1c2e4b0a1b2c3d4e5f6"},
            "transaction_id": "T1",
            "created": {"$date": "2024-01-01T00:00:00Z"}
        })),
    }
}

/// Configuration with the refresh disabled and a local endpoint
pub fn test_config() -> FormConfig {
    FormConfig::new()
        .with_endpoint("http://127.0.0.1:1/webhook")
        .with_refresh_delay(std::time::Duration::ZERO)
}

/// Session on a fake webhook serving [`sample_records`]
pub fn setup_session(
    transaction_id: &str,
) -> (
    TransactionSession<FakeTransport, RecordingNotifier>,
    FakeTransport,
    RecordingNotifier,
) {
    let transport = FakeTransport::with_records(sample_records());
    let notifier = RecordingNotifier::new();
    let session = TransactionSession::new(
        test_config(),
        transport.clone(),
        notifier.clone(),
        transaction_id,
    );
    (session, transport, notifier)
}
