//! Sled-backed store of supported query records.
//!
//! One named tree holds every record as JSON bytes under a big-endian id key,
//! so iteration yields ascending id order. Records are the unit of dispatch:
//! the category names the logic adapter that owns the query, the text is what
//! users see in the supported-query listing.

use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;

const DEFAULT_PATH: &str = "./data/dubot_queries";

/// Sled tree holding the query records.
const QUERY_TREE: &str = "queries";

/// One supported question: a unique id, the category naming the owning
/// adapter, and the display text shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: u64,
    pub category: String,
    pub text: String,
}

impl QueryRecord {
    pub fn new(id: u64, category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            category: category.into(),
            text: text.into(),
        }
    }

    /// Serializes to JSON bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Deserializes from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// Errors from the query record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Db(#[from] sled::Error),
    #[error("no query record with id {0}")]
    MissingRecord(u64),
}

/// Store of the supported query set. All mutations are logged; there is no
/// caching layer, reads go straight to the tree.
pub struct QueryStore {
    db: Db,
}

impl QueryStore {
    /// Opens or creates the query DB at `./data/dubot_queries`.
    pub fn new() -> Result<Self, StoreError> {
        Self::open_path(DEFAULT_PATH)
    }

    /// Opens or creates the query DB at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    fn tree(&self) -> Result<sled::Tree, StoreError> {
        Ok(self.db.open_tree(QUERY_TREE)?)
    }

    /// Inserts or replaces the record under its id.
    pub fn insert(&self, record: &QueryRecord) -> Result<(), StoreError> {
        let tree = self.tree()?;
        let prev = tree.insert(record.id.to_be_bytes(), record.to_bytes())?;
        tracing::info!(
            target: "dubot::store",
            id = record.id,
            category = %record.category,
            action = if prev.is_some() { "UPDATE" } else { "INSERT" },
            "query {} ({}) stored",
            record.id,
            record.category
        );
        Ok(())
    }

    /// Returns the record for `id`, or `None` when absent.
    pub fn get_by_id(&self, id: u64) -> Result<Option<QueryRecord>, StoreError> {
        let tree = self.tree()?;
        Ok(tree
            .get(id.to_be_bytes())?
            .as_deref()
            .and_then(QueryRecord::from_bytes))
    }

    /// Removes the record for `id`, returning the previous value if present.
    /// Absent ids are tolerated.
    pub fn remove(&self, id: u64) -> Result<Option<QueryRecord>, StoreError> {
        let tree = self.tree()?;
        let prev = tree.remove(id.to_be_bytes())?;
        if prev.is_some() {
            tracing::info!(target: "dubot::store", id, action = "REMOVE", "query {} removed", id);
        }
        Ok(prev.as_deref().and_then(QueryRecord::from_bytes))
    }

    /// Rewrites the category of an existing record. Fails with
    /// [`StoreError::MissingRecord`] when `id` is unknown.
    pub fn update_category(&self, id: u64, category: &str) -> Result<(), StoreError> {
        let mut record = self.get_by_id(id)?.ok_or(StoreError::MissingRecord(id))?;
        record.category = category.to_string();
        self.insert(&record)
    }

    /// Rewrites the display text of an existing record. Fails with
    /// [`StoreError::MissingRecord`] when `id` is unknown.
    pub fn update_text(&self, id: u64, text: &str) -> Result<(), StoreError> {
        let mut record = self.get_by_id(id)?.ok_or(StoreError::MissingRecord(id))?;
        record.text = text.to_string();
        self.insert(&record)
    }

    /// Drops every record.
    pub fn remove_all(&self) -> Result<(), StoreError> {
        let tree = self.tree()?;
        tree.clear()?;
        tracing::info!(target: "dubot::store", action = "CLEAR", "all query records removed");
        Ok(())
    }

    /// Display texts of every supported query, ascending by id.
    pub fn all_texts(&self) -> Result<Vec<String>, StoreError> {
        let tree = self.tree()?;
        let mut texts = Vec::new();
        for item in tree.iter() {
            let (_, value) = item?;
            if let Some(record) = QueryRecord::from_bytes(&value) {
                texts.push(record.text);
            }
        }
        Ok(texts)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.tree()?.len())
    }
}
