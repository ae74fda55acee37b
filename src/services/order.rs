//! Order service: checkout, order queries and the status state machine
//!
//! Checkout writes the order and then deletes the buyer's cart. The two
//! writes are sequential with no transaction around them; if the cart delete
//! fails the order stands and the error is reported.

use super::{load_products, positive_quantity};
use crate::core::auth::{AuthPolicy, Principal};
use crate::core::error::{MarketError, MarketResult, OrderError, ValidationError};
use crate::core::events::{EventBus, OrderEvent};
use crate::core::repository::{
    CartRepository, OrderCommentRepository, OrderRepository, ProductRepository, Repositories,
};
use crate::entities::{Order, OrderComment, OrderItem, OrderStatus, OrderView, Product};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A requested order line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: Uuid, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    comments: Arc<dyn OrderCommentRepository>,
    events: EventBus,
}

impl OrderService {
    pub fn new(repositories: &Repositories, events: EventBus) -> Self {
        Self {
            products: repositories.products.clone(),
            carts: repositories.carts.clone(),
            orders: repositories.orders.clone(),
            comments: repositories.comments.clone(),
            events,
        }
    }

    /// Place an order.
    ///
    /// With no explicit `lines` the buyer's cart is checked out. Prices are
    /// snapshotted from the catalog now; the total never changes afterwards.
    pub async fn create_order(
        &self,
        principal: &Principal,
        lines: Vec<OrderLine>,
    ) -> MarketResult<OrderView> {
        let lines = if lines.is_empty() {
            self.cart_lines(principal).await?
        } else {
            lines
        };

        let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        let products = load_products(self.products.as_ref(), &ids).await?;

        if let Some(missing) = ids.iter().find(|id| !products.contains_key(id)) {
            return Err(OrderError::ProductNotFound {
                product_id: *missing,
            }
            .into());
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = products.get(&line.product_id).ok_or(OrderError::ProductNotFound {
                product_id: line.product_id,
            })?;
            let quantity = positive_quantity(line.quantity)?;
            if product.seller == principal.id {
                tracing::warn!(user = %principal.id, product = %product.id, "buyer tried to order own product");
                return Err(OrderError::OwnProduct {
                    product_id: product.id,
                }
                .into());
            }
            items.push(OrderItem {
                product: product.id,
                quantity,
                unit_price: product.price,
            });
        }

        let order = self.orders.insert(Order::new(principal.id, items)?).await?;
        tracing::info!(order = %order.id, buyer = %principal.id, total = %order.total, "order created");

        if self.carts.delete_by_owner(&principal.id).await? {
            tracing::debug!(buyer = %principal.id, "cart deleted after checkout");
        }

        self.events.publish(OrderEvent::Created {
            order_id: order.id,
            buyer: order.buyer,
            sellers: sellers_of(&order, &products),
            total: order.total,
        });

        Ok(populate(&order, &products))
    }

    /// The caller's orders, newest first
    pub async fn list_buyer_orders(&self, principal: &Principal) -> MarketResult<Vec<OrderView>> {
        let orders = self.orders.find_by_buyer(&principal.id).await?;
        self.populate_all(&orders).await
    }

    /// One order, visible to its buyer, admins and sellers with a product in it
    pub async fn get_order(&self, principal: &Principal, order_id: Uuid) -> MarketResult<OrderView> {
        let order = self.find_order(order_id).await?;
        let products = load_products(self.products.as_ref(), &order.product_ids()).await?;
        ensure_can_read(principal, &order, &products)?;
        Ok(populate(&order, &products))
    }

    /// Orders containing at least one of the caller's products.
    ///
    /// `status` filters only when it names a valid status; anything else is
    /// ignored.
    pub async fn list_seller_orders(
        &self,
        principal: &Principal,
        status: Option<&str>,
    ) -> MarketResult<Vec<OrderView>> {
        let own: Vec<Uuid> = self
            .products
            .find_by_seller(&principal.id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        if own.is_empty() {
            return Ok(Vec::new());
        }

        let orders = self
            .orders
            .find_containing_products(&own, lenient_status(status))
            .await?;
        self.populate_all(&orders).await
    }

    /// Every order, for admins. Same status filter rule as
    /// [`list_seller_orders`](Self::list_seller_orders).
    pub async fn list_all_orders(
        &self,
        principal: &Principal,
        status: Option<&str>,
    ) -> MarketResult<Vec<OrderView>> {
        principal.require(&AuthPolicy::AdminOnly)?;
        let orders = self.orders.list(lenient_status(status)).await?;
        self.populate_all(&orders).await
    }

    /// Move an order along the state machine.
    ///
    /// Admins may update any order; sellers only orders containing one of
    /// their products. Setting the current status again succeeds without a
    /// write.
    pub async fn update_order_status(
        &self,
        principal: &Principal,
        order_id: Uuid,
        status: &str,
    ) -> MarketResult<OrderView> {
        let next: OrderStatus = status.parse()?;
        let mut order = self.find_order(order_id).await?;
        let products = load_products(self.products.as_ref(), &order.product_ids()).await?;

        if !principal.is_admin() && !sells_in(principal, &order, &products) {
            tracing::warn!(user = %principal.id, order = %order_id, "status update by non-owning seller");
            return Err(MarketError::forbidden("not authorized to update this order"));
        }

        let previous = order.transition_to(next).inspect_err(|e| {
            tracing::warn!(order = %order_id, error = %e, "rejected status transition");
        })?;

        let Some(previous) = previous else {
            return Ok(populate(&order, &products));
        };

        let order = self.orders.update(order).await?;
        tracing::info!(order = %order.id, from = %previous, to = %next, by = %principal.id, "order status changed");

        self.events.publish(OrderEvent::StatusChanged {
            order_id: order.id,
            buyer: order.buyer,
            sellers: sellers_of(&order, &products),
            from: previous,
            to: next,
        });

        Ok(populate(&order, &products))
    }

    /// Attach a comment to an order. Only the buyer may comment.
    pub async fn add_order_comment(
        &self,
        principal: &Principal,
        order_id: Uuid,
        comment: &str,
    ) -> MarketResult<OrderComment> {
        let order = self.find_order(order_id).await?;
        if order.buyer != principal.id {
            return Err(MarketError::forbidden("only the buyer can comment on an order"));
        }

        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ValidationError::MissingArgument {
                argument: "comment".to_string(),
            }
            .into());
        }

        let comment = self
            .comments
            .insert(OrderComment::new(order.id, principal.id, comment))
            .await?;
        tracing::debug!(order = %order.id, comment = %comment.id, "order comment added");
        Ok(comment)
    }

    /// Comments on an order, oldest first, for anyone who may read the order
    pub async fn list_order_comments(
        &self,
        principal: &Principal,
        order_id: Uuid,
    ) -> MarketResult<Vec<OrderComment>> {
        let order = self.find_order(order_id).await?;
        let products = load_products(self.products.as_ref(), &order.product_ids()).await?;
        ensure_can_read(principal, &order, &products)?;
        Ok(self.comments.find_by_order(&order.id).await?)
    }

    async fn find_order(&self, order_id: Uuid) -> MarketResult<Order> {
        Ok(self
            .orders
            .find_by_id(&order_id)
            .await?
            .ok_or(OrderError::NotFound { order_id })?)
    }

    async fn cart_lines(&self, principal: &Principal) -> MarketResult<Vec<OrderLine>> {
        let cart = self
            .carts
            .find_by_owner(&principal.id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(OrderError::NothingToOrder)?;

        Ok(cart
            .items
            .iter()
            .map(|item| OrderLine::new(item.product, i64::from(item.quantity)))
            .collect())
    }

    async fn populate_all(&self, orders: &[Order]) -> MarketResult<Vec<OrderView>> {
        let ids: Vec<Uuid> = orders.iter().flat_map(Order::product_ids).collect();
        let products = load_products(self.products.as_ref(), &ids).await?;
        Ok(orders.iter().map(|o| populate(o, &products)).collect())
    }
}

fn populate(order: &Order, products: &HashMap<Uuid, Product>) -> OrderView {
    OrderView::populate(order, |id| products.get(id).map(Product::summary))
}

fn lenient_status(status: Option<&str>) -> Option<OrderStatus> {
    status.and_then(|s| s.parse().ok())
}

/// Whether the principal sells at least one product in the order
fn sells_in(principal: &Principal, order: &Order, products: &HashMap<Uuid, Product>) -> bool {
    order
        .items
        .iter()
        .filter_map(|item| products.get(&item.product))
        .any(|p| p.seller == principal.id)
}

fn ensure_can_read(
    principal: &Principal,
    order: &Order,
    products: &HashMap<Uuid, Product>,
) -> MarketResult<()> {
    if order.buyer == principal.id || principal.is_admin() || sells_in(principal, order, products) {
        Ok(())
    } else {
        Err(MarketError::forbidden("not authorized to view this order"))
    }
}

/// Distinct sellers of the order's products, in line order
fn sellers_of(order: &Order, products: &HashMap<Uuid, Product>) -> Vec<Uuid> {
    let mut sellers = Vec::new();
    for seller in order
        .items
        .iter()
        .filter_map(|item| products.get(&item.product))
        .map(|p| p.seller)
    {
        if !sellers.contains(&seller) {
            sellers.push(seller);
        }
    }
    sellers
}
