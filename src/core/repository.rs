//! Repository traits the services depend on
//!
//! Implementations provide persistence for one aggregate each. The services
//! are agnostic to the underlying storage mechanism; see
//! [`crate::storage`] for the bundled backends.

use crate::entities::{Cart, Order, OrderComment, OrderStatus, Product};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Read access to the product catalog (plus inserts for seeding)
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert or replace a product
    async fn save(&self, product: Product) -> Result<Product>;

    /// Get a product by ID
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Product>>;

    /// Get every product whose ID is in `ids`; unknown IDs are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>>;

    /// List the products listed by `seller`
    async fn find_by_seller(&self, seller: &Uuid) -> Result<Vec<Product>>;
}

/// Per-buyer cart storage. At most one cart exists per owner.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Get the cart owned by `owner`
    async fn find_by_owner(&self, owner: &Uuid) -> Result<Option<Cart>>;

    /// Insert or replace the owner's cart
    async fn save(&self, cart: Cart) -> Result<Cart>;

    /// Delete the owner's cart. Returns whether a cart existed.
    async fn delete_by_owner(&self, owner: &Uuid) -> Result<bool>;
}

/// Order storage
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order
    async fn insert(&self, order: Order) -> Result<Order>;

    /// Get an order by ID
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>>;

    /// Replace an existing order
    async fn update(&self, order: Order) -> Result<Order>;

    /// Orders placed by `buyer`, newest first
    async fn find_by_buyer(&self, buyer: &Uuid) -> Result<Vec<Order>>;

    /// Orders with at least one line referencing one of `product_ids`,
    /// optionally restricted to `status`, newest first
    async fn find_containing_products(
        &self,
        product_ids: &[Uuid],
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>>;

    /// Every order, optionally restricted to `status`, newest first
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>>;
}

/// Order comment storage
#[async_trait]
pub trait OrderCommentRepository: Send + Sync {
    async fn insert(&self, comment: OrderComment) -> Result<OrderComment>;

    /// Comments on `order_id`, oldest first
    async fn find_by_order(&self, order_id: &Uuid) -> Result<Vec<OrderComment>>;
}

/// The set of repositories the services are constructed from.
///
/// Built once at process start and shared; every field is cheap to clone.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub comments: Arc<dyn OrderCommentRepository>,
}

impl Repositories {
    /// Use one backend value for all four repositories
    pub fn from_store<S>(store: S) -> Self
    where
        S: ProductRepository
            + CartRepository
            + OrderRepository
            + OrderCommentRepository
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            products: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
            comments: store,
        }
    }
}
