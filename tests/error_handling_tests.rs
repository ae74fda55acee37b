//! Status codes and JSON error bodies

mod common;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{BUYER_TOKEN, Fixture, SELLER_TOKEN};
use marketplace::prelude::*;
use serde_json::{Value, json};

async fn render(err: MarketError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Rendering
// =============================================================================

mod rendering_tests {
    use super::*;

    #[tokio::test]
    async fn test_status_codes() {
        let cases = vec![
            (MarketError::unauthorized("no token"), StatusCode::UNAUTHORIZED),
            (MarketError::forbidden("sellers only"), StatusCode::FORBIDDEN),
            (
                MarketError::Order(OrderError::NothingToOrder),
                StatusCode::BAD_REQUEST,
            ),
            (
                MarketError::Cart(CartError::CartNotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                MarketError::Cart(CartError::MixedSeller {
                    cart_seller: Uuid::new_v4(),
                    product_seller: Uuid::new_v4(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                MarketError::Order(OrderError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Shipped,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                MarketError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let (status, body) = render(err).await;
            assert_eq!(status, expected, "body: {}", body);
            assert!(body["error"].is_string());
            assert!(body["code"].is_string());
        }
    }

    #[tokio::test]
    async fn test_transition_details() {
        let (_, body) = render(MarketError::Order(OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Shipped,
        }))
        .await;

        assert_eq!(body["error"], "Invalid status transition from delivered to shipped");
        assert_eq!(body["code"], "INVALID_TRANSITION");
        assert_eq!(body["details"], json!({ "from": "delivered", "to": "shipped" }));
    }

    #[tokio::test]
    async fn test_details_omitted_when_absent() {
        let (_, body) = render(MarketError::Cart(CartError::CartNotFound)).await;
        assert_eq!(body, json!({ "error": "Cart not found", "code": "CART_NOT_FOUND" }));
    }
}

// =============================================================================
// Request errors over HTTP
// =============================================================================

mod http_error_tests {
    use super::*;

    #[tokio::test]
    async fn test_malformed_authorization() {
        let fx = Fixture::new();
        let server = fx.server();

        let response = server
            .get("/cart")
            .add_header("authorization", "Basic dXNlcjpwYXNz")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let body: Value = response.json();
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let fx = Fixture::new();
        let server = fx.server();

        let response = server
            .post("/cart")
            .authorization_bearer(BUYER_TOKEN)
            .text("{not json")
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_malformed_checkout_body() {
        let fx = Fixture::new();
        let server = fx.server();

        let response = server
            .post("/orders")
            .authorization_bearer(BUYER_TOKEN)
            .text("{\"items\": 5}")
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_bad_path_id() {
        let fx = Fixture::new();
        let server = fx.server();

        for path in ["/orders/not-a-uuid", "/orders/not-a-uuid/comments"] {
            let response = server.get(path).authorization_bearer(BUYER_TOKEN).await;
            response.assert_status(StatusCode::BAD_REQUEST);

            let body: Value = response.json();
            assert_eq!(body["code"], "INVALID_ID");
        }

        server
            .delete("/cart/42")
            .authorization_bearer(BUYER_TOKEN)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_product_id_in_body() {
        let fx = Fixture::new();
        let server = fx.server();

        let response = server
            .post("/cart")
            .authorization_bearer(BUYER_TOKEN)
            .json(&json!({ "productId": "nope" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_ID");
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let fx = Fixture::new();
        let server = fx.server();

        let response = server
            .post("/cart")
            .authorization_bearer(BUYER_TOKEN)
            .json(&json!({ "productId": Uuid::new_v4() }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = response.json();
        assert_eq!(body["code"], "PRODUCT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unknown_status_value() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;
        let server = fx.server();

        for status in ["teleported", "Shipped", "PROCESSING"] {
            let response = server
                .put(&format!("/seller/orders/{}/status", order.id))
                .authorization_bearer(SELLER_TOKEN)
                .json(&json!({ "status": status }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);

            let body: Value = response.json();
            assert_eq!(body["code"], "INVALID_ARGUMENT");
        }
    }

    #[tokio::test]
    async fn test_own_product_checkout_is_forbidden() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let server = fx.server();

        let response = server
            .post("/orders")
            .authorization_bearer(SELLER_TOKEN)
            .json(&json!({ "items": [{ "productId": mug.id }] }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let body: Value = response.json();
        assert_eq!(body["error"], "Cannot order own product");
    }
}
