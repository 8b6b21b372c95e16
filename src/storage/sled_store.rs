//! Durable prediction store backed by sled
//!
//! Two named trees in one database:
//! - `predictions`: prediction id → JSON record
//! - `predictions_by_event`: `len (u32 BE) ‖ event_id ‖ seq (u64 BE)` → prediction id
//!
//! Sequence numbers come from `Db::generate_id`, which is monotonic across
//! restarts, so a prefix scan of the event index yields insertion order.

use std::path::Path;
use std::sync::Arc;

use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::Tree;

use super::{PredictionStore, StoreError};
use crate::types::Prediction;

const RECORDS_TREE: &str = "predictions";
const EVENT_INDEX_TREE: &str = "predictions_by_event";

#[derive(Clone)]
pub struct SledPredictionStore {
    db: Arc<sled::Db>,
    records: Tree,
    by_event: Tree,
}

impl SledPredictionStore {
    /// Open or create the prediction database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let store = Self::from_db(db)?;
        tracing::info!(path = ?path_ref, records = store.records.len(), "Prediction storage opened");
        Ok(store)
    }

    /// Temporary database, removed when dropped.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let records = db.open_tree(RECORDS_TREE)?;
        let by_event = db.open_tree(EVENT_INDEX_TREE)?;
        Ok(Self {
            db: Arc::new(db),
            records,
            by_event,
        })
    }
}

/// Length-prefixed so no event id's prefix is another event id's prefix.
fn event_prefix(event_id: &str) -> Result<Vec<u8>, StoreError> {
    let len = u32::try_from(event_id.len())
        .map_err(|_| StoreError::Storage(format!("event id too long: {} bytes", event_id.len())))?;
    let mut key = Vec::with_capacity(4 + event_id.len() + 8);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(event_id.as_bytes());
    Ok(key)
}

fn event_index_key(event_id: &str, seq: u64) -> Result<Vec<u8>, StoreError> {
    let mut key = event_prefix(event_id)?;
    key.extend_from_slice(&seq.to_be_bytes());
    Ok(key)
}

impl PredictionStore for SledPredictionStore {
    fn insert(&self, prediction: &Prediction) -> Result<(), StoreError> {
        let id = prediction.prediction_id.as_bytes();
        let bytes = serde_json::to_vec(prediction)?;
        let seq = self.db.generate_id()?;
        let index_key = event_index_key(&prediction.event_id, seq)?;

        (&self.records, &self.by_event)
            .transaction(|(records, by_event)| {
                if records.get(id)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(StoreError::Duplicate(
                        prediction.prediction_id.clone(),
                    )));
                }
                records.insert(id, bytes.as_slice())?;
                by_event.insert(index_key.as_slice(), id)?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => StoreError::from(e),
            })
    }

    fn get(&self, prediction_id: &str) -> Result<Option<Prediction>, StoreError> {
        match self.records.get(prediction_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_by_event(&self, event_id: &str) -> Result<Vec<Prediction>, StoreError> {
        let mut out = Vec::new();
        for item in self.by_event.scan_prefix(event_prefix(event_id)?) {
            let (_, id) = item?;
            match self.records.get(&id)? {
                Some(bytes) => out.push(serde_json::from_slice(&bytes)?),
                None => tracing::warn!(
                    event_id,
                    prediction_id = %String::from_utf8_lossy(&id),
                    "Event index points at a missing prediction"
                ),
            }
        }
        Ok(out)
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.len())
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
