use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use shared::{ProductStock, ProductUpdate};
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("could not encode document: {0}")]
    Encode(#[from] bson::ser::Error),
    #[error("malformed document in '{collection}': {reason}")]
    Malformed { collection: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Untyped access to any collection by name.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn count(&self, collection: &str) -> StoreResult<u64>;

    async fn find_by_object_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> StoreResult<Option<Document>>;

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> StoreResult<Vec<Document>>;

    /// Inserts a document and returns the id the database assigned to it.
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<Bson>;
}

/// Products, addressed by their application-assigned numeric `id`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_stock(&self, product_id: i64) -> StoreResult<Option<ProductStock>>;

    /// Adds `delta` to `availableInventory`. Returns whether a product matched.
    async fn adjust_inventory(&self, product_id: i64, delta: i64) -> StoreResult<bool>;

    /// Applies `update` to the product with database id `id`. Returns whether a product matched.
    async fn update_by_object_id(&self, id: ObjectId, update: ProductUpdate) -> StoreResult<bool>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Every order whose `productsIDs` contains `product_id`.
    async fn orders_referencing(&self, product_id: i64) -> StoreResult<Vec<Document>>;
}
