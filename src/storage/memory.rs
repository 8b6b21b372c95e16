//! In-memory prediction store
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart.
//! Unbounded by default; a positive capacity limit evicts the oldest
//! record first.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::RwLock;

use super::{PredictionStore, StoreError};
use crate::types::Prediction;

#[derive(Default)]
struct Inner {
    next_seq: u64,
    /// Insertion sequence → record. Iteration order is insertion order.
    records: BTreeMap<u64, Prediction>,
    by_id: HashMap<String, u64>,
    by_event: HashMap<String, VecDeque<u64>>,
}

impl Inner {
    fn evict_oldest(&mut self) {
        let Some((seq, evicted)) = self.records.pop_first() else {
            return;
        };
        self.by_id.remove(&evicted.prediction_id);
        if let Some(seqs) = self.by_event.get_mut(&evicted.event_id) {
            seqs.retain(|s| *s != seq);
            if seqs.is_empty() {
                self.by_event.remove(&evicted.event_id);
            }
        }
        tracing::debug!(prediction_id = %evicted.prediction_id, "Evicted oldest prediction");
    }
}

pub struct InMemoryPredictionStore {
    inner: RwLock<Inner>,
    /// 0 = unbounded
    max_predictions: usize,
}

impl InMemoryPredictionStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::with_capacity_limit(0)
    }

    /// Store holding at most `max_predictions` records (0 = unbounded).
    pub fn with_capacity_limit(max_predictions: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            max_predictions,
        }
    }
}

impl Default for InMemoryPredictionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionStore for InMemoryPredictionStore {
    fn insert(&self, prediction: &Prediction) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        if inner.by_id.contains_key(&prediction.prediction_id) {
            return Err(StoreError::Duplicate(prediction.prediction_id.clone()));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.insert(seq, prediction.clone());
        inner.by_id.insert(prediction.prediction_id.clone(), seq);
        inner
            .by_event
            .entry(prediction.event_id.clone())
            .or_default()
            .push_back(seq);

        if self.max_predictions > 0 {
            while inner.records.len() > self.max_predictions {
                inner.evict_oldest();
            }
        }

        Ok(())
    }

    fn get(&self, prediction_id: &str) -> Result<Option<Prediction>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(inner
            .by_id
            .get(prediction_id)
            .and_then(|seq| inner.records.get(seq))
            .cloned())
    }

    fn list_by_event(&self, event_id: &str) -> Result<Vec<Prediction>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(inner
            .by_event
            .get(event_id)
            .map(|seqs| {
                seqs.iter()
                    .filter_map(|seq| inner.records.get(seq))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(inner.records.len())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
