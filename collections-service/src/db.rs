use anyhow::{Context, Result};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures::TryStreamExt;
use mongodb::{Client, Collection, Database};
use shared::{ProductStock, ProductUpdate};
use tracing::{debug, info};

use crate::repository::{DocumentStore, OrderRepository, ProductRepository, StoreError, StoreResult};
use crate::settings::DbSettings;

/// Opens the client and verifies the deployment answers a ping.
pub async fn connect(settings: &DbSettings) -> Result<Database> {
    let client = Client::with_uri_str(settings.connection_uri())
        .await
        .with_context(|| format!("failed to create MongoDB client for host {}", settings.host))?;

    let database = client.database(&settings.name);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .with_context(|| format!("failed to reach MongoDB database {}", settings.name))?;

    info!("MongoDB connected successfully to database: {}", database.name());
    Ok(database)
}

#[derive(Clone)]
pub struct MongoStore {
    database: Database,
    products_collection: String,
    orders_collection: String,
}

impl MongoStore {
    pub fn new(database: Database, products_collection: String, orders_collection: String) -> Self {
        Self {
            database,
            products_collection,
            orders_collection,
        }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    fn products(&self) -> Collection<Document> {
        self.collection(&self.products_collection)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, collection: &str) -> StoreResult<u64> {
        Ok(self.collection(collection).count_documents(doc! {}).await?)
    }

    async fn find_by_object_id(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> StoreResult<Option<Document>> {
        Ok(self.collection(collection).find_one(doc! { "_id": id }).await?)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> StoreResult<Vec<Document>> {
        let cursor = self.collection(collection).aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<Bson> {
        let result = self.collection(collection).insert_one(document).await?;
        debug!("Inserted document {} into {}", result.inserted_id, collection);
        Ok(result.inserted_id)
    }
}

#[async_trait]
impl ProductRepository for MongoStore {
    async fn find_stock(&self, product_id: i64) -> StoreResult<Option<ProductStock>> {
        let Some(product) = self.products().find_one(doc! { "id": product_id }).await? else {
            return Ok(None);
        };

        ProductStock::from_document(&product)
            .map(Some)
            .ok_or_else(|| StoreError::Malformed {
                collection: self.products_collection.clone(),
                reason: format!("product {product_id} has no numeric availableInventory"),
            })
    }

    async fn adjust_inventory(&self, product_id: i64, delta: i64) -> StoreResult<bool> {
        let result = self
            .products()
            .update_one(
                doc! { "id": product_id },
                doc! { "$inc": { "availableInventory": delta } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn update_by_object_id(&self, id: ObjectId, update: ProductUpdate) -> StoreResult<bool> {
        let result = self
            .products()
            .update_one(doc! { "_id": id }, update.to_update_document())
            .await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl OrderRepository for MongoStore {
    async fn orders_referencing(&self, product_id: i64) -> StoreResult<Vec<Document>> {
        let cursor = self
            .collection(&self.orders_collection)
            .find(doc! { "productsIDs": product_id })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
