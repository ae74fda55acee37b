//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Gated behind the `mongodb_backend` feature flag.
//!
//! # Storage model
//!
//! One collection per aggregate, named by [`Entity::resource_name`]:
//! `products`, `carts`, `orders` and `order_comments`. Documents are the
//! camelCase JSON form of the entity with `id` mapped to `_id`; UUIDs and
//! timestamps are stored as strings.
//!
//! Timestamps stored as strings do not sort reliably, so "newest first"
//! ordering is applied after loading.

use crate::core::entity::Entity;
use crate::core::repository::{
    CartRepository, OrderCommentRepository, OrderRepository, ProductRepository,
};
use crate::entities::{Cart, Order, OrderComment, OrderStatus, Product};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Database};
use std::marker::PhantomData;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id`.
fn json_to_document(json: serde_json::Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn uuid_list(ids: &[Uuid]) -> Vec<Bson> {
    ids.iter().map(uuid_bson).collect()
}

// ---------------------------------------------------------------------------
// Typed collection
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct MongoCollection<T> {
    database: Database,
    _marker: PhantomData<T>,
}

impl<T: Entity> MongoCollection<T> {
    fn new(database: Database) -> Self {
        Self {
            database,
            _marker: PhantomData,
        }
    }

    fn collection(&self) -> mongodb::Collection<Document> {
        self.database.collection(T::resource_name())
    }

    fn to_document(entity: &T) -> Result<Document> {
        let json = serde_json::to_value(entity)
            .map_err(|e| anyhow!("Failed to serialize {}: {}", T::resource_name(), e))?;
        json_to_document(json)
    }

    fn from_document(doc: Document) -> Result<T> {
        serde_json::from_value(document_to_json(doc))
            .map_err(|e| anyhow!("Failed to deserialize {}: {}", T::resource_name(), e))
    }

    async fn insert(&self, entity: T) -> Result<T> {
        self.collection()
            .insert_one(Self::to_document(&entity)?)
            .await
            .map_err(|e| anyhow!("Failed to insert into {}: {}", T::resource_name(), e))?;
        Ok(entity)
    }

    async fn upsert(&self, entity: T) -> Result<T> {
        self.collection()
            .replace_one(doc! { "_id": uuid_bson(&entity.id()) }, Self::to_document(&entity)?)
            .upsert(true)
            .await
            .map_err(|e| anyhow!("Failed to save into {}: {}", T::resource_name(), e))?;
        Ok(entity)
    }

    /// Replace an existing document; fails when nothing matched
    async fn replace(&self, entity: T) -> Result<T> {
        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(&entity.id()) }, Self::to_document(&entity)?)
            .await
            .map_err(|e| anyhow!("Failed to update {}: {}", T::resource_name(), e))?;

        if result.matched_count == 0 {
            return Err(anyhow!("{} not found: {}", T::resource_name(), entity.id()));
        }
        Ok(entity)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<T>> {
        self.collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get from {}: {}", T::resource_name(), e))?
            .map(Self::from_document)
            .transpose()
    }

    /// Matching documents, newest first
    async fn find(&self, filter: Document) -> Result<Vec<T>> {
        let cursor = self
            .collection()
            .find(filter)
            .await
            .map_err(|e| anyhow!("Failed to query {}: {}", T::resource_name(), e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", T::resource_name(), e))?;

        let mut rows = docs
            .into_iter()
            .map(Self::from_document)
            .collect::<Result<Vec<T>>>()?;
        rows.sort_by_key(|row| std::cmp::Reverse(row.created_at()));
        Ok(rows)
    }

    async fn delete_many(&self, filter: Document) -> Result<u64> {
        let result = self
            .collection()
            .delete_many(filter)
            .await
            .map_err(|e| anyhow!("Failed to delete from {}: {}", T::resource_name(), e))?;
        Ok(result.deleted_count)
    }
}

// ---------------------------------------------------------------------------
// MongoStore
// ---------------------------------------------------------------------------

/// MongoDB store implementing all repository traits
///
/// # Example
///
/// ```rust,ignore
/// let store = MongoStore::connect("mongodb://localhost:27017", "marketplace").await?;
/// let repositories = Repositories::from_store(store);
/// ```
#[derive(Clone, Debug)]
pub struct MongoStore {
    products: MongoCollection<Product>,
    carts: MongoCollection<Cart>,
    orders: MongoCollection<Order>,
    comments: MongoCollection<OrderComment>,
}

impl MongoStore {
    pub fn new(database: Database) -> Self {
        Self {
            products: MongoCollection::new(database.clone()),
            carts: MongoCollection::new(database.clone()),
            orders: MongoCollection::new(database.clone()),
            comments: MongoCollection::new(database),
        }
    }

    /// Connect and ping the server
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| anyhow!("Failed to connect to MongoDB: {}", e))?;
        let database = client.database(database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| anyhow!("MongoDB ping failed: {}", e))?;
        Ok(Self::new(database))
    }
}

#[async_trait]
impl ProductRepository for MongoStore {
    async fn save(&self, product: Product) -> Result<Product> {
        self.products.upsert(product).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Product>> {
        self.products.get(id).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        self.products
            .find(doc! { "_id": { "$in": uuid_list(ids) } })
            .await
    }

    async fn find_by_seller(&self, seller: &Uuid) -> Result<Vec<Product>> {
        self.products.find(doc! { "seller": uuid_bson(seller) }).await
    }
}

#[async_trait]
impl CartRepository for MongoStore {
    async fn find_by_owner(&self, owner: &Uuid) -> Result<Option<Cart>> {
        Ok(self
            .carts
            .find(doc! { "owner": uuid_bson(owner) })
            .await?
            .into_iter()
            .next())
    }

    async fn save(&self, cart: Cart) -> Result<Cart> {
        self.carts
            .delete_many(doc! {
                "owner": uuid_bson(&cart.owner),
                "_id": { "$ne": uuid_bson(&cart.id) },
            })
            .await?;
        self.carts.upsert(cart).await
    }

    async fn delete_by_owner(&self, owner: &Uuid) -> Result<bool> {
        Ok(self.carts.delete_many(doc! { "owner": uuid_bson(owner) }).await? > 0)
    }
}

fn status_filter(filter: &mut Document, status: Option<OrderStatus>) {
    if let Some(status) = status {
        filter.insert("status", status.as_str());
    }
}

#[async_trait]
impl OrderRepository for MongoStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        self.orders.insert(order).await
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>> {
        self.orders.get(id).await
    }

    async fn update(&self, order: Order) -> Result<Order> {
        self.orders.replace(order).await
    }

    async fn find_by_buyer(&self, buyer: &Uuid) -> Result<Vec<Order>> {
        self.orders.find(doc! { "buyer": uuid_bson(buyer) }).await
    }

    async fn find_containing_products(
        &self,
        product_ids: &[Uuid],
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let mut filter = doc! { "items.product": { "$in": uuid_list(product_ids) } };
        status_filter(&mut filter, status);
        self.orders.find(filter).await
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let mut filter = doc! {};
        status_filter(&mut filter, status);
        self.orders.find(filter).await
    }
}

#[async_trait]
impl OrderCommentRepository for MongoStore {
    async fn insert(&self, comment: OrderComment) -> Result<OrderComment> {
        self.comments.insert(comment).await
    }

    async fn find_by_order(&self, order_id: &Uuid) -> Result<Vec<OrderComment>> {
        let mut comments = self
            .comments
            .find(doc! { "order": uuid_bson(order_id) })
            .await?;
        comments.reverse();
        Ok(comments)
    }
}
