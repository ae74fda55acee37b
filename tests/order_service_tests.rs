//! Order service scenarios: checkout, visibility, status transitions,
//! comments and notifications

mod common;

use common::Fixture;
use marketplace::prelude::*;
use std::time::Duration;
use tokio_test::assert_ok;

// =============================================================================
// Checkout
// =============================================================================

mod checkout_tests {
    use super::*;

    #[tokio::test]
    async fn test_checkout_from_cart() {
        let fx = Fixture::new();
        let product = fx.product(&fx.seller, "Mug", 10).await;
        fx.carts.add_item(&fx.buyer, product.id, 2).await.unwrap();

        let order = fx.orders.create_order(&fx.buyer, vec![]).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::from(20));
        assert_eq!(order.buyer, fx.buyer.id);
        assert_eq!(order.items[0].quantity, 2);
        assert!(fx.store.find_by_owner(&fx.buyer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkout_without_cart_is_invalid() {
        let fx = Fixture::new();
        let err = fx.orders.create_order(&fx.buyer, vec![]).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "No items to create order");
    }

    #[tokio::test]
    async fn test_explicit_lines_may_span_sellers_and_repeat() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let lamp = fx.product(&fx.other_seller, "Lamp", 40).await;

        let order = fx
            .orders
            .create_order(
                &fx.buyer,
                vec![
                    OrderLine::new(mug.id, 1),
                    OrderLine::new(lamp.id, 1),
                    OrderLine::new(mug.id, 2),
                ],
            )
            .await
            .unwrap();

        assert_eq!(order.items.len(), 3);
        assert_eq!(order.total, Decimal::from(70));
    }

    #[tokio::test]
    async fn test_explicit_lines_delete_the_cart_too() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        fx.carts.add_item(&fx.buyer, mug.id, 1).await.unwrap();

        fx.order(&mug, 1).await;
        assert!(fx.carts.get_cart(&fx.buyer).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;

        let unknown = fx
            .orders
            .create_order(&fx.buyer, vec![OrderLine::new(Uuid::new_v4(), 1)])
            .await
            .unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::NotFound);

        let zero = fx
            .orders
            .create_order(&fx.buyer, vec![OrderLine::new(mug.id, 0)])
            .await
            .unwrap_err();
        assert_eq!(zero.kind(), ErrorKind::InvalidArgument);

        let own = fx
            .orders
            .create_order(&fx.seller, vec![OrderLine::new(mug.id, 1)])
            .await
            .unwrap_err();
        assert_eq!(own.kind(), ErrorKind::Forbidden);
        assert_eq!(own.to_string(), "Cannot order own product");

        assert!(fx.orders.list_buyer_orders(&fx.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_total_is_invalid() {
        let fx = Fixture::new();
        let yacht = fx
            .repositories
            .products
            .save(Product::new(
                "Yacht",
                "100000000000000000000".parse::<Decimal>().unwrap(),
                fx.seller.id,
            ))
            .await
            .unwrap();

        let err = fx
            .orders
            .create_order(&fx.buyer, vec![OrderLine::new(yacht.id, 1_000_000_000)])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(fx.orders.list_buyer_orders(&fx.buyer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_is_frozen_at_creation() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 2).await;

        fx.reprice(&mug, 15).await;

        let reloaded = fx.orders.get_order(&fx.buyer, order.id).await.unwrap();
        assert_eq!(reloaded.total, Decimal::from(20));
        assert_eq!(reloaded.items[0].unit_price, Decimal::from(10));
        assert_eq!(
            reloaded.items[0].product.as_ref().unwrap().price,
            Decimal::from(15)
        );
    }
}

// =============================================================================
// Queries and visibility
// =============================================================================

mod query_tests {
    use super::*;

    #[tokio::test]
    async fn test_buyer_orders_newest_first() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;

        let first = fx.order(&mug, 1).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = fx.order(&mug, 1).await;

        let orders = fx.orders.list_buyer_orders(&fx.buyer).await.unwrap();
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_get_order_visibility() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;

        assert_ok!(fx.orders.get_order(&fx.buyer, order.id).await);
        assert_ok!(fx.orders.get_order(&fx.seller, order.id).await);
        assert_ok!(fx.orders.get_order(&fx.admin, order.id).await);

        let err = fx
            .orders
            .get_order(&fx.other_seller, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = fx
            .orders
            .get_order(&fx.buyer, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_seller_orders_filter_by_status() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let lamp = fx.product(&fx.other_seller, "Lamp", 40).await;

        let processing = fx.order(&mug, 1).await;
        fx.order(&mug, 1).await;
        fx.order(&lamp, 1).await;
        fx.orders
            .update_order_status(&fx.seller, processing.id, "processing")
            .await
            .unwrap();

        let all = fx.orders.list_seller_orders(&fx.seller, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = fx
            .orders
            .list_seller_orders(&fx.seller, Some("processing"))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, processing.id);

        let ignored = fx
            .orders
            .list_seller_orders(&fx.seller, Some("teleported"))
            .await
            .unwrap();
        assert_eq!(ignored.len(), 2);

        // Status names are matched exactly
        for near_miss in ["Processing", " processing", "PENDING"] {
            let ignored = fx
                .orders
                .list_seller_orders(&fx.seller, Some(near_miss))
                .await
                .unwrap();
            assert_eq!(ignored.len(), 2, "{:?}", near_miss);
        }
    }

    #[tokio::test]
    async fn test_seller_without_products_sees_nothing() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        fx.order(&mug, 1).await;

        let orders = fx
            .orders
            .list_seller_orders(&fx.other_seller, None)
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_list_all_orders_is_admin_only() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let lamp = fx.product(&fx.other_seller, "Lamp", 40).await;
        fx.order(&mug, 1).await;
        fx.order(&lamp, 1).await;

        let all = fx.orders.list_all_orders(&fx.admin, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let pending = fx
            .orders
            .list_all_orders(&fx.admin, Some("delivered"))
            .await
            .unwrap();
        assert!(pending.is_empty());

        let err = fx.orders.list_all_orders(&fx.seller, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}

// =============================================================================
// Status transitions
// =============================================================================

mod status_tests {
    use super::*;

    async fn order_in(fx: &Fixture, path: &[&str]) -> OrderView {
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;
        for status in path {
            fx.orders
                .update_order_status(&fx.seller, order.id, status)
                .await
                .unwrap();
        }
        fx.orders.get_order(&fx.buyer, order.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_full_forward_path() {
        let fx = Fixture::new();
        let order = order_in(&fx, &["processing", "shipped", "delivered"]).await;
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn test_non_owning_seller_is_forbidden() {
        let fx = Fixture::new();
        let order = order_in(&fx, &[]).await;

        let err = fx
            .orders
            .update_order_status(&fx.other_seller, order.id, "processing")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let unchanged = fx.orders.get_order(&fx.buyer, order.id).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_backwards_transition_is_rejected() {
        let fx = Fixture::new();
        let order = order_in(&fx, &["processing", "shipped"]).await;

        let err = fx
            .orders
            .update_order_status(&fx.seller, order.id, "pending")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(
            err.to_string(),
            "Invalid status transition from shipped to pending"
        );

        let unchanged = fx.orders.get_order(&fx.buyer, order.id).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_delivered_cannot_go_back_but_can_cancel() {
        let fx = Fixture::new();
        let order = order_in(&fx, &["processing", "shipped", "delivered"]).await;

        for status in ["processing", "shipped"] {
            let err = fx
                .orders
                .update_order_status(&fx.seller, order.id, status)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        }

        let cancelled = fx
            .orders
            .update_order_status(&fx.seller, order.id, "cancelled")
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_processing_to_cancelled() {
        let fx = Fixture::new();
        let order = order_in(&fx, &["processing"]).await;

        let updated = fx
            .orders
            .update_order_status(&fx.seller, order.id, "cancelled")
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_same_status_is_a_noop() {
        let fx = Fixture::new();
        let order = order_in(&fx, &["processing"]).await;

        let again = fx
            .orders
            .update_order_status(&fx.seller, order.id, "processing")
            .await
            .unwrap();
        assert_eq!(again.status, OrderStatus::Processing);
        assert_eq!(again.updated_at, order.updated_at);
    }

    #[tokio::test]
    async fn test_invalid_status_value() {
        let fx = Fixture::new();
        let order = order_in(&fx, &[]).await;

        let err = fx
            .orders
            .update_order_status(&fx.seller, order.id, "lost")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        for near_miss in ["Processing", " processing ", "CANCELLED"] {
            let err = fx
                .orders
                .update_order_status(&fx.seller, order.id, near_miss)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{:?}", near_miss);
        }
        let unchanged = fx.orders.get_order(&fx.seller, order.id).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_invalid_status_checked_before_lookup() {
        let fx = Fixture::new();
        let err = fx
            .orders
            .update_order_status(&fx.seller, Uuid::new_v4(), "lost")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = fx
            .orders
            .update_order_status(&fx.seller, Uuid::new_v4(), "shipped")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_admin_may_update_any_order() {
        let fx = Fixture::new();
        let order = order_in(&fx, &[]).await;

        let updated = fx
            .orders
            .update_order_status(&fx.admin, order.id, "processing")
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);
    }
}

// =============================================================================
// Comments
// =============================================================================

mod comment_tests {
    use super::*;

    #[tokio::test]
    async fn test_buyer_comments_oldest_first() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;

        fx.orders
            .add_order_comment(&fx.buyer, order.id, "Please gift wrap")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        fx.orders
            .add_order_comment(&fx.buyer, order.id, "  Thanks!  ")
            .await
            .unwrap();

        let comments = fx
            .orders
            .list_order_comments(&fx.seller, order.id)
            .await
            .unwrap();
        let texts: Vec<&str> = comments.iter().map(|c| c.comment.as_str()).collect();
        assert_eq!(texts, vec!["Please gift wrap", "Thanks!"]);
    }

    #[tokio::test]
    async fn test_only_buyer_may_comment() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;

        let err = fx
            .orders
            .add_order_comment(&fx.seller, order.id, "Shipped soon")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_blank_comment_is_invalid() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;

        let err = fx
            .orders
            .add_order_comment(&fx.buyer, order.id, "   ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_outsiders_cannot_read_comments() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;

        let err = fx
            .orders
            .list_order_comments(&fx.other_seller, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}

// =============================================================================
// Notifications
// =============================================================================

mod notification_tests {
    use super::*;

    #[tokio::test]
    async fn test_checkout_and_status_change_publish_events() {
        let fx = Fixture::new();
        let mut rx = fx.events.subscribe();
        let mug = fx.product(&fx.seller, "Mug", 10).await;

        let order = fx.order(&mug, 2).await;
        fx.orders
            .update_order_status(&fx.seller, order.id, "processing")
            .await
            .unwrap();

        let created = rx.recv().await.unwrap();
        match created.event {
            OrderEvent::Created {
                order_id,
                sellers,
                total,
                ..
            } => {
                assert_eq!(order_id, order.id);
                assert_eq!(sellers, vec![fx.seller.id]);
                assert_eq!(total, Decimal::from(20));
            }
            other => panic!("unexpected event {:?}", other),
        }

        let changed = rx.recv().await.unwrap();
        assert_eq!(
            changed.event,
            OrderEvent::StatusChanged {
                order_id: order.id,
                buyer: fx.buyer.id,
                sellers: vec![fx.seller.id],
                from: OrderStatus::Pending,
                to: OrderStatus::Processing,
            }
        );
        assert!(changed.event.concerns(&fx.seller));
        assert!(!changed.event.concerns(&fx.other_seller));
    }

    #[tokio::test]
    async fn test_noop_and_rejected_updates_publish_nothing() {
        let fx = Fixture::new();
        let mug = fx.product(&fx.seller, "Mug", 10).await;
        let order = fx.order(&mug, 1).await;

        let mut rx = fx.events.subscribe();
        fx.orders
            .update_order_status(&fx.seller, order.id, "pending")
            .await
            .unwrap();
        let _ = fx
            .orders
            .update_order_status(&fx.other_seller, order.id, "processing")
            .await;

        assert!(rx.try_recv().is_err());
    }
}
