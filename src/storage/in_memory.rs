//! In-memory implementation of every repository for testing and development

use crate::core::entity::Entity;
use crate::core::repository::{
    CartRepository, OrderCommentRepository, OrderRepository, ProductRepository,
};
use crate::entities::{Cart, Order, OrderComment, OrderStatus, Product};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Thread-safe map of entities keyed by their ID
#[derive(Clone)]
struct Table<T> {
    rows: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Entity> Table<T> {
    fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn upsert(&self, entity: T) -> Result<T> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        rows.insert(entity.id(), entity.clone());

        Ok(entity)
    }

    fn get(&self, id: &Uuid) -> Result<Option<T>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(rows.get(id).cloned())
    }

    /// Matching rows, newest first
    fn select(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let mut selected: Vec<T> = rows.values().filter(|row| predicate(row)).cloned().collect();
        selected.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(selected)
    }

    /// Remove matching rows, returning how many were removed
    fn remove_where(&self, predicate: impl Fn(&T) -> bool) -> Result<usize> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let before = rows.len();
        rows.retain(|_, row| !predicate(row));

        Ok(before - rows.len())
    }

    /// Write `entity` after dropping every other row matching `conflicts`,
    /// all under one write guard
    fn replace_where(&self, entity: T, conflicts: impl Fn(&T) -> bool) -> Result<T> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let id = entity.id();
        rows.retain(|row_id, row| row_id == &id || !conflicts(row));
        rows.insert(id, entity.clone());

        Ok(entity)
    }
}

/// In-memory store implementing all repository traits
///
/// Useful for testing and development. Each table uses an `RwLock`, so every
/// single read or write is atomic, but nothing serializes a read-modify-write
/// sequence across calls.
#[derive(Clone)]
pub struct InMemoryStore {
    products: Table<Product>,
    carts: Table<Cart>,
    orders: Table<Order>,
    comments: Table<OrderComment>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            products: Table::new(),
            carts: Table::new(),
            orders: Table::new(),
            comments: Table::new(),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn save(&self, product: Product) -> Result<Product> {
        self.products.upsert(product)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Product>> {
        self.products.get(id)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>> {
        self.products.select(|p| ids.contains(&p.id))
    }

    async fn find_by_seller(&self, seller: &Uuid) -> Result<Vec<Product>> {
        self.products.select(|p| &p.seller == seller)
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn find_by_owner(&self, owner: &Uuid) -> Result<Option<Cart>> {
        Ok(self.carts.select(|c| &c.owner == owner)?.into_iter().next())
    }

    async fn save(&self, cart: Cart) -> Result<Cart> {
        // One cart per owner
        let owner = cart.owner;
        self.carts.replace_where(cart, |c| c.owner == owner)
    }

    async fn delete_by_owner(&self, owner: &Uuid) -> Result<bool> {
        Ok(self.carts.remove_where(|c| &c.owner == owner)? > 0)
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn insert(&self, order: Order) -> Result<Order> {
        if self.orders.get(&order.id)?.is_some() {
            return Err(anyhow!("Order already exists: {}", order.id));
        }
        self.orders.upsert(order)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Order>> {
        self.orders.get(id)
    }

    async fn update(&self, order: Order) -> Result<Order> {
        self.orders
            .get(&order.id)?
            .ok_or_else(|| anyhow!("Order not found: {}", order.id))?;
        self.orders.upsert(order)
    }

    async fn find_by_buyer(&self, buyer: &Uuid) -> Result<Vec<Order>> {
        self.orders.select(|o| &o.buyer == buyer)
    }

    async fn find_containing_products(
        &self,
        product_ids: &[Uuid],
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        self.orders.select(|o| {
            status.is_none_or(|s| o.status == s)
                && product_ids.iter().any(|id| o.contains_product(id))
        })
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        self.orders.select(|o| status.is_none_or(|s| o.status == s))
    }
}

#[async_trait]
impl OrderCommentRepository for InMemoryStore {
    async fn insert(&self, comment: OrderComment) -> Result<OrderComment> {
        self.comments.upsert(comment)
    }

    async fn find_by_order(&self, order_id: &Uuid) -> Result<Vec<OrderComment>> {
        let mut comments = self.comments.select(|c| &c.order == order_id)?;
        comments.reverse();
        Ok(comments)
    }
}
