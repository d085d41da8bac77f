//! Shared wiring for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clausewise_client::{
    ApiClient, ClientConfig, LoginRedirect, MemorySessionStorage, PersistedSession,
    RecordingNotifier, SessionToken,
};
use serde_json::{json, Value};
use wiremock::MockServer;

/// Redirect hook that counts how often it fired.
#[derive(Debug, Default)]
pub struct CountingRedirect {
    fired: AtomicUsize,
}

impl CountingRedirect {
    pub fn count(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

impl LoginRedirect for CountingRedirect {
    fn redirect_to_login(&self) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub api: ApiClient,
    pub token: SessionToken,
    pub storage: Arc<MemorySessionStorage>,
    pub redirect: Arc<CountingRedirect>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(server: &MockServer) -> Harness {
    harness_with(server, MemorySessionStorage::new(), 0)
}

pub fn harness_with(server: &MockServer, storage: MemorySessionStorage, retries: u32) -> Harness {
    let token = SessionToken::new();
    let storage = Arc::new(storage);
    let redirect = Arc::new(CountingRedirect::default());
    let config = ClientConfig::default()
        .with_url(server.uri())
        .with_timeout_secs(5)
        .with_max_retries(retries);

    let api = ApiClient::new(&config, token.clone(), storage.clone(), redirect.clone())
        .expect("failed to create client");

    Harness {
        api,
        token,
        storage,
        redirect,
        notifier: Arc::new(RecordingNotifier::new()),
    }
}

pub fn stored_session(token: &str) -> MemorySessionStorage {
    MemorySessionStorage::with_session(PersistedSession::authenticated(
        serde_json::from_value(profile_json()).ok(),
        token,
    ))
}

pub fn profile_json() -> Value {
    json!({
        "id": "u1",
        "email": "a@b.com",
        "is_active": true,
        "created_at": "2024-03-01T12:00:00"
    })
}

pub fn document_json(id: &str, name: &str, status: &str) -> Value {
    json!({
        "id": id,
        "filename": format!("{id}_{name}"),
        "original_filename": name,
        "status": status,
        "file_size": 2048,
        "created_at": "2024-03-01T12:30:00",
        "processing_completed_at": null,
        "total_clauses_found": 0,
        "error_message": null
    })
}

pub fn analysis_json(document_id: &str) -> Value {
    json!({
        "document": document_json(document_id, "msa.pdf", "complete"),
        "clauses": [
            {
                "id": "c1",
                "text": "Either party may terminate this Agreement upon thirty days notice.",
                "category": "termination",
                "subcategory": null,
                "risk_score": 0.72,
                "risk_level": "critical",
                "confidence_score": 0.9,
                "start_position": 120,
                "end_position": 188,
                "page_number": 2,
                "recommendations": "Negotiate a cure period"
            }
        ],
        "analysis_summary": {
            "document_id": document_id,
            "total_clauses": 1,
            "risk_distribution": {"critical": 1},
            "category_breakdown": {"termination": 1},
            "recommendations": ["Negotiate a cure period"],
            "overall_risk_score": 0.72,
            "analysis_metadata": {}
        }
    })
}
