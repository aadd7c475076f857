use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::domain::ports::{Clock, MatchStore};
use crate::interface_adapters::clients::auth::TokenVerifier;
use crate::use_cases::MatchRegistry;

// Application state shared by every route.
#[derive(Clone)]
pub struct AppState {
    // Owns every live match session.
    pub registry: Arc<MatchRegistry>,
    // Resolves bearer and join tokens into player ids.
    pub verifier: Arc<dyn TokenVerifier>,
}

// In-memory match document store adapter.
#[derive(Clone, Default)]
pub struct InMemoryMatchStore {
    pub documents: Arc<Mutex<HashMap<String, Value>>>,
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn save(&self, match_id: &str, document: Value) -> Result<(), String> {
        let mut documents = self.documents.lock().await;
        documents.insert(match_id.to_string(), document);
        Ok(())
    }

    async fn load(&self, match_id: &str) -> Result<Option<Value>, String> {
        let documents = self.documents.lock().await;
        Ok(documents.get(match_id).cloned())
    }
}

// System clock adapter used by match use cases.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
