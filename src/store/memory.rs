use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Collection, Fields, OrderBy, RecordStore};
use crate::error::StoreError;

/// An in-process [`RecordStore`].
///
/// Several table sessions can share one store through an `Arc` to play out
/// multi-client scenarios.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Records per collection, in insertion order.
    collections: RwLock<HashMap<Collection, Vec<Fields>>>,
    /// When set, every call fails as if the backend were unreachable.
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Returns every record of a collection in insertion order.
    pub async fn records(&self, collection: Collection) -> Vec<Fields> {
        self.collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable(String::from("memory store offline")));
        }
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.total_cmp(&b)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, collection: Collection, mut fields: Fields) -> Result<Fields, StoreError> {
        self.ensure_available()?;

        fields.insert(String::from("id"), Value::from(Uuid::new_v4().to_string()));
        fields.insert(
            String::from("created_date"),
            Value::from(chrono::Utc::now().timestamp_millis()),
        );

        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(fields.clone());

        Ok(fields)
    }

    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.ensure_available()?;

        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(&collection)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|record| record.get("id").and_then(Value::as_str) == Some(id))
            })
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.name(),
                id: id.to_owned(),
            })?;

        for (key, value) in fields {
            if key != "id" {
                record.insert(key, value);
            }
        }

        Ok(())
    }

    async fn list(
        &self,
        collection: Collection,
        order: &OrderBy,
        limit: usize,
    ) -> Result<Vec<Fields>, StoreError> {
        self.ensure_available()?;

        let mut records = self.records(collection).await;
        // Later inserts win ties when sorting newest first.
        if order.descending {
            records.reverse();
        }
        records.sort_by(|a, b| {
            let ordering = compare_values(a.get(&order.field), b.get(&order.field));
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        records.truncate(limit);

        Ok(records)
    }

    async fn filter(&self, collection: Collection, predicate: &Fields) -> Result<Vec<Fields>, StoreError> {
        self.ensure_available()?;

        let records = self.records(collection).await;
        Ok(records
            .into_iter()
            .filter(|record| {
                predicate
                    .iter()
                    .all(|(key, expected)| record.get(key) == Some(expected))
            })
            .collect())
    }
}
