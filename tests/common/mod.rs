//! Shared fixtures for the integration tests

#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use marketplace::prelude::*;
use std::sync::Arc;

pub const BUYER_TOKEN: &str = "buyer-token";
pub const SELLER_TOKEN: &str = "seller-token";
pub const OTHER_SELLER_TOKEN: &str = "other-seller-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const JWT_SECRET: &str = "test-secret";

/// Services over a fresh in-memory store, plus one principal per role
pub struct Fixture {
    pub store: InMemoryStore,
    pub repositories: Repositories,
    pub carts: CartService,
    pub orders: OrderService,
    pub events: EventBus,
    pub buyer: Principal,
    pub seller: Principal,
    pub other_seller: Principal,
    pub admin: Principal,
}

impl Fixture {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let repositories = Repositories::from_store(store.clone());
        let events = EventBus::new(64);

        Self {
            carts: CartService::new(&repositories),
            orders: OrderService::new(&repositories, events.clone()),
            store,
            repositories,
            events,
            buyer: Principal::buyer(Uuid::new_v4()),
            seller: Principal::seller(Uuid::new_v4()),
            other_seller: Principal::seller(Uuid::new_v4()),
            admin: Principal::admin(Uuid::new_v4()),
        }
    }

    /// Insert a product listed by `seller`
    pub async fn product(&self, seller: &Principal, title: &str, price: i64) -> Product {
        self.repositories
            .products
            .save(Product::new(title, Decimal::from(price), seller.id))
            .await
            .unwrap()
    }

    /// Change the catalog price of an existing product
    pub async fn reprice(&self, product: &Product, price: i64) {
        let mut updated = product.clone();
        updated.price = Decimal::from(price);
        self.repositories.products.save(updated).await.unwrap();
    }

    /// A pending order of `quantity` × `product` placed by the buyer
    pub async fn order(&self, product: &Product, quantity: i64) -> OrderView {
        self.orders
            .create_order(&self.buyer, vec![OrderLine::new(product.id, quantity)])
            .await
            .unwrap()
    }

    /// The REST router on top of this fixture's store and event bus.
    ///
    /// Every principal gets a static token; JWTs signed with [`JWT_SECRET`]
    /// are accepted as well.
    pub fn router(&self) -> Router {
        let jwt = Arc::new(JwtAuthProvider::new(JWT_SECRET));
        let auth = StaticTokenProvider::new()
            .with_token(BUYER_TOKEN, self.buyer)
            .with_token(SELLER_TOKEN, self.seller)
            .with_token(OTHER_SELLER_TOKEN, self.other_seller)
            .with_token(ADMIN_TOKEN, self.admin)
            .with_fallback(jwt);

        ServerBuilder::new()
            .with_repositories(self.repositories.clone())
            .with_auth_provider(auth)
            .with_shared_event_bus(self.events.clone())
            .build()
            .expect("Failed to build app")
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router())
    }
}
