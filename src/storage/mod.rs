//! Prediction repository
//!
//! One insert operation and two lookups (by prediction id, by parent event
//! id). Backends are swapped without touching the orchestration layer:
//! - `InMemoryPredictionStore`: process-local, lost on restart
//! - `SledPredictionStore`: durable, embedded sled database

pub mod memory;
pub mod sled_store;

pub use memory::InMemoryPredictionStore;
pub use sled_store::SledPredictionStore;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::Prediction;

/// Trait for pluggable prediction stores.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across request handlers. A record becomes visible to readers only once
/// it is fully written.
pub trait PredictionStore: Send + Sync {
    /// Store a new prediction. Rejects an id that is already present.
    fn insert(&self, prediction: &Prediction) -> Result<(), StoreError>;

    /// Look up a prediction by its id.
    fn get(&self, prediction_id: &str) -> Result<Option<Prediction>, StoreError>;

    /// All predictions for an event, in insertion order.
    fn list_by_event(&self, event_id: &str) -> Result<Vec<Prediction>, StoreError>;

    /// Number of stored predictions.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Push buffered writes to durable storage. No-op for volatile backends.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Backend name for logging and health output
    fn backend_name(&self) -> &'static str;
}

/// Prediction store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("prediction {0} already exists")]
    Duplicate(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Build the configured backend.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn PredictionStore>, StoreError> {
    let store: Arc<dyn PredictionStore> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryPredictionStore::with_capacity_limit(
            config.max_predictions,
        )),
        StorageBackend::Sled => Arc::new(SledPredictionStore::open(&config.path)?),
    };
    tracing::info!(backend = store.backend_name(), "Prediction store ready");
    Ok(store)
}
