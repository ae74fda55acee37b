//! Cart service: one pending, single-seller cart per buyer

use super::{load_products, positive_quantity};
use crate::core::auth::Principal;
use crate::core::error::{CartError, MarketResult};
use crate::core::repository::{CartRepository, ProductRepository, Repositories};
use crate::entities::{Cart, CartView};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of removing a line from a cart
#[derive(Debug, Clone, PartialEq)]
pub enum CartRemoval {
    /// Lines remain; the updated cart
    Updated(CartView),
    /// The last line was removed and the cart deleted
    Cleared,
}

#[derive(Clone)]
pub struct CartService {
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
}

impl CartService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            products: repositories.products.clone(),
            carts: repositories.carts.clone(),
        }
    }

    /// Add `quantity` of a product to the caller's cart, creating the cart
    /// if needed.
    ///
    /// A cart only holds products of one seller; adding another seller's
    /// product is a conflict and leaves the cart untouched.
    pub async fn add_item(
        &self,
        principal: &Principal,
        product_id: Uuid,
        quantity: i64,
    ) -> MarketResult<CartView> {
        let quantity = positive_quantity(quantity)?;

        let product = self
            .products
            .find_by_id(&product_id)
            .await?
            .ok_or(CartError::ProductNotFound { product_id })?;

        if product.seller == principal.id {
            tracing::warn!(user = %principal.id, product = %product_id, "seller tried to buy own product");
            return Err(CartError::OwnProduct { product_id }.into());
        }

        let mut cart = self
            .carts
            .find_by_owner(&principal.id)
            .await?
            .unwrap_or_else(|| Cart::new(principal.id));

        let cart_seller = self.cart_seller(&cart).await?;
        if let Some(cart_seller) = cart_seller.filter(|seller| seller != &product.seller) {
            tracing::debug!(
                user = %principal.id,
                cart_seller = %cart_seller,
                product_seller = %product.seller,
                "rejected product from another seller"
            );
            return Err(CartError::MixedSeller {
                cart_seller,
                product_seller: product.seller,
            }
            .into());
        }

        cart.add_product(&product, quantity)?;
        let cart = self.carts.save(cart).await?;

        tracing::debug!(user = %principal.id, product = %product_id, quantity, "added to cart");
        self.populate(&cart).await
    }

    /// The caller's cart, or the empty shape when they have none
    pub async fn get_cart(&self, principal: &Principal) -> MarketResult<CartView> {
        match self.carts.find_by_owner(&principal.id).await? {
            Some(cart) => self.populate(&cart).await,
            None => Ok(CartView::empty()),
        }
    }

    /// Replace the quantity of an existing line
    pub async fn update_item_quantity(
        &self,
        principal: &Principal,
        product_id: Uuid,
        quantity: i64,
    ) -> MarketResult<CartView> {
        let quantity = positive_quantity(quantity)?;

        let mut cart = self.owned_cart(principal).await?;
        if !cart.set_quantity(&product_id, quantity)? {
            return Err(CartError::ItemNotInCart { product_id }.into());
        }
        let cart = self.carts.save(cart).await?;

        tracing::debug!(user = %principal.id, product = %product_id, quantity, "updated cart line");
        self.populate(&cart).await
    }

    /// Remove a line. Removing the last line deletes the cart.
    pub async fn remove_item(
        &self,
        principal: &Principal,
        product_id: Uuid,
    ) -> MarketResult<CartRemoval> {
        let mut cart = self.owned_cart(principal).await?;

        if !cart.remove_product(&product_id)? {
            return Ok(CartRemoval::Updated(self.populate(&cart).await?));
        }

        if cart.is_empty() {
            self.carts.delete_by_owner(&principal.id).await?;
            tracing::info!(user = %principal.id, "cart emptied and deleted");
            return Ok(CartRemoval::Cleared);
        }

        let cart = self.carts.save(cart).await?;
        tracing::debug!(user = %principal.id, product = %product_id, "removed cart line");
        Ok(CartRemoval::Updated(self.populate(&cart).await?))
    }

    /// Delete the caller's cart, if any
    pub async fn clear_cart(&self, principal: &Principal) -> MarketResult<()> {
        if self.carts.delete_by_owner(&principal.id).await? {
            tracing::info!(user = %principal.id, "cart cleared");
        }
        Ok(())
    }

    async fn owned_cart(&self, principal: &Principal) -> MarketResult<Cart> {
        Ok(self
            .carts
            .find_by_owner(&principal.id)
            .await?
            .ok_or(CartError::CartNotFound)?)
    }

    /// Seller of the first line whose product still resolves
    async fn cart_seller(&self, cart: &Cart) -> MarketResult<Option<Uuid>> {
        if cart.is_empty() {
            return Ok(None);
        }
        let products = load_products(self.products.as_ref(), &cart.product_ids()).await?;
        Ok(cart
            .items
            .iter()
            .find_map(|item| products.get(&item.product))
            .map(|p| p.seller))
    }

    async fn populate(&self, cart: &Cart) -> MarketResult<CartView> {
        let products = load_products(self.products.as_ref(), &cart.product_ids()).await?;
        Ok(CartView::populate(cart, |id| {
            products.get(id).map(|p| p.summary())
        }))
    }
}
