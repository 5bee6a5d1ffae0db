//! Shared record store contract.
//!
//! Clients never talk to each other; they read and write documents in a
//! shared store and poll for changes. Writes are last-writer-wins.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

mod memory;

pub use memory::MemoryStore;

/// A record document: a JSON object of field name to value.
pub type Fields = serde_json::Map<String, Value>;

/// Record collections used by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// One record per table.
    Games,
    /// One record per seated user per table session.
    Players,
    /// Audit entries for manual interventions.
    AdminLogs,
}

impl Collection {
    /// Collection name as seen by the backing store.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Games => "games",
            Self::Players => "players",
            Self::AdminLogs => "adminLogs",
        }
    }
}

/// Sort order for [`RecordStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to sort on.
    pub field: String,
    /// Largest first when set.
    pub descending: bool,
}

impl OrderBy {
    /// Parses `"field"` (ascending) or `"-field"` (descending).
    ///
    /// # Example
    ///
    /// ```
    /// use bjtable::store::OrderBy;
    ///
    /// let order = OrderBy::parse("-created_date");
    /// assert_eq!(order.field, "created_date");
    /// assert!(order.descending);
    /// ```
    #[must_use]
    pub fn parse(order: &str) -> Self {
        order.strip_prefix('-').map_or_else(
            || Self {
                field: order.to_owned(),
                descending: false,
            },
            |field| Self {
                field: field.to_owned(),
                descending: true,
            },
        )
    }

    /// Most recently created first.
    #[must_use]
    pub fn newest_first() -> Self {
        Self::parse("-created_date")
    }
}

/// Record persistence consumed by the table.
///
/// Implementations assign `id` and `created_date` on create and merge fields
/// on update. No versioning is assumed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores a new record and returns it with `id` and `created_date` set.
    async fn create(&self, collection: Collection, fields: Fields) -> Result<Fields, StoreError>;

    /// Merges `fields` into the record with the given id.
    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Returns up to `limit` records sorted by `order`.
    async fn list(
        &self,
        collection: Collection,
        order: &OrderBy,
        limit: usize,
    ) -> Result<Vec<Fields>, StoreError>;

    /// Returns every record whose fields equal all of `predicate`.
    async fn filter(&self, collection: Collection, predicate: &Fields) -> Result<Vec<Fields>, StoreError>;
}

#[async_trait]
impl<T> RecordStore for Arc<T>
where
    T: RecordStore + ?Sized,
{
    async fn create(&self, collection: Collection, fields: Fields) -> Result<Fields, StoreError> {
        (**self).create(collection, fields).await
    }

    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<(), StoreError> {
        (**self).update(collection, id, fields).await
    }

    async fn list(
        &self,
        collection: Collection,
        order: &OrderBy,
        limit: usize,
    ) -> Result<Vec<Fields>, StoreError> {
        (**self).list(collection, order, limit).await
    }

    async fn filter(&self, collection: Collection, predicate: &Fields) -> Result<Vec<Fields>, StoreError> {
        (**self).filter(collection, predicate).await
    }
}

/// Builds an equality predicate for [`RecordStore::filter`].
pub(crate) fn predicate<const N: usize>(pairs: [(&str, Value); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

/// Decodes a stored document into a typed record.
pub(crate) fn decode<T: DeserializeOwned>(fields: Fields) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Encodes a typed value into a document.
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Malformed(format!("expected an object, got {other}"))),
    }
}
