// libs/shared/database/src/store.rs
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Result of a conditional atomic update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UpdateOutcome {
    #[serde(rename = "matchedCount")]
    pub matched: u64,
    #[serde(rename = "modifiedCount")]
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn modified_any(&self) -> bool {
        self.modified > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeleteOutcome {
    #[serde(rename = "deletedCount")]
    pub deleted: u64,
}

/// The document store collaborator contract.
///
/// Filters are a Mongo-style subset: top-level field equality, plus
/// `$elemMatch` against embedded arrays. Updates support `$set` (including
/// the positional `array.$.field` path resolving to the element selected by
/// the filter's `$elemMatch`), `$push` and `$pull`.
///
/// `update_one` is atomic per call. It is the only concurrency primitive the
/// system relies on: of N concurrent calls whose filters select the same
/// document state, exactly one reports `modified == 1`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: &str, filter: Value) -> Result<Option<Value>>;

    async fn find_many(
        &self,
        collection: &str,
        filter: Value,
        projection: Option<Value>,
    ) -> Result<Vec<Value>>;

    /// Inserts a document and returns the store-assigned id.
    async fn insert_one(&self, collection: &str, document: Value) -> Result<String>;

    async fn update_one(&self, collection: &str, filter: Value, update: Value)
        -> Result<UpdateOutcome>;

    async fn delete_one(&self, collection: &str, filter: Value) -> Result<DeleteOutcome>;
}
