use async_trait::async_trait;
use serde_json::Value;

// Port for the per-match document store. Documents are opaque JSON; the codec
// owns their shape.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn save(&self, match_id: &str, document: Value) -> Result<(), String>;
    async fn load(&self, match_id: &str) -> Result<Option<Value>, String>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}
