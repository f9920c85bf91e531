//! Shared fixtures for app integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use consent_lens_analysis::AnalysisCoordinator;
use consent_lens_client::{AnalyzeRequest, AnalyzerEndpoints, AnalyzerTransport, ClientError};
use consent_lens_store::MemoryStore;

/// Korean consent page body that passes the keyword gate.
#[allow(dead_code)]
pub const CONSENT_PAGE: &str =
    "서비스 이용을 위해 개인정보 수집 및 이용에 동의해 주세요. 수집 항목: 이메일, 연락처.";

/// Deterministic transport answering with a fixed response or HTTP failure.
pub struct ScriptedTransport {
    response: Result<serde_json::Value, u16>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    /// Transport that always succeeds with `response`.
    #[allow(dead_code)]
    pub fn success(response: serde_json::Value) -> Self {
        Self {
            response: Ok(response),
            calls: AtomicUsize::new(0),
        }
    }

    /// Transport that always fails with `status`.
    #[allow(dead_code)]
    pub fn failure(status: u16) -> Self {
        Self {
            response: Err(status),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of outbound calls made so far.
    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalyzerTransport for ScriptedTransport {
    fn analyze(
        &self,
        _endpoint: &str,
        _request: &AnalyzeRequest,
    ) -> Result<serde_json::Value, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(value) => Ok(value.clone()),
            Err(status) => Err(ClientError::Http {
                status: *status,
                body_snippet: "scripted failure body".to_string(),
            }),
        }
    }
}

/// Builds a coordinator over a fresh in-memory store.
#[allow(dead_code)]
pub fn coordinator_with(
    transport: Arc<ScriptedTransport>,
) -> (AnalysisCoordinator, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let coordinator =
        AnalysisCoordinator::new(transport, store.clone(), AnalyzerEndpoints::defaults());
    (coordinator, store)
}
