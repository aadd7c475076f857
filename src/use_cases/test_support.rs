use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ports::{Clock, MatchStore};

pub(crate) type DocumentTable = Arc<Mutex<HashMap<String, Value>>>;

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub save: bool,
    pub load: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    documents: DocumentTable,
    failures: Arc<Mutex<FailureFlags>>,
    saves: Arc<Mutex<usize>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(FailureFlags::default())),
            saves: Arc::new(Mutex::new(0)),
        }
    }

    // Failures can be flipped mid-test; clones share the same flags.
    pub(crate) fn set_failures(&self, failures: FailureFlags) {
        *self.failures.lock().expect("failures mutex poisoned") = failures;
    }

    pub(crate) fn insert_test_document(&self, match_id: impl Into<String>, document: Value) {
        let mut guard = self.documents.lock().expect("documents mutex poisoned");
        guard.insert(match_id.into(), document);
    }

    pub(crate) fn get_test_document(&self, match_id: &str) -> Option<Value> {
        let guard = self.documents.lock().expect("documents mutex poisoned");
        guard.get(match_id).cloned()
    }

    pub(crate) fn save_count(&self) -> usize {
        *self.saves.lock().expect("saves mutex poisoned")
    }
}

#[async_trait]
impl MatchStore for RecordingStore {
    async fn save(&self, match_id: &str, document: Value) -> Result<(), String> {
        if self.failures.lock().expect("failures mutex poisoned").save {
            return Err("save failed".to_string());
        }

        let mut guard = self.documents.lock().expect("documents mutex poisoned");
        guard.insert(match_id.to_string(), document);
        *self.saves.lock().expect("saves mutex poisoned") += 1;
        Ok(())
    }

    async fn load(&self, match_id: &str) -> Result<Option<Value>, String> {
        if self.failures.lock().expect("failures mutex poisoned").load {
            return Err("load failed".to_string());
        }

        let guard = self.documents.lock().expect("documents mutex poisoned");
        Ok(guard.get(match_id).cloned())
    }
}
