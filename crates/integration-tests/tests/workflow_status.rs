//! Status transitions and the notification trail they leave.

use licorera_core::{AddressId, OrderId, OrderStatus, ProductId, UserId};
use licorera_integration_tests::{
    CLIENTE_ID, HOME_ADDRESS_ID, OTHER_CLIENTE_ID, Sent, TestContext, address, lat_for_km,
};
use licorera_server::services::workflow::{CartItem, CreateOrderInput, WorkflowError};

async fn place_order(ctx: &TestContext) -> OrderId {
    let created = ctx
        .workflow
        .create(
            UserId::new(CLIENTE_ID),
            CreateOrderInput {
                address_id: AddressId::new(HOME_ADDRESS_ID),
                items: vec![CartItem {
                    product_id: ProductId::new(1),
                    quantity: 1,
                }],
                notes: None,
                payment_method: None,
            },
        )
        .await
        .expect("create");
    created.view.order.id
}

#[tokio::test]
async fn creation_sends_and_logs_a_confirmation() {
    let ctx = TestContext::new();
    let order_id = place_order(&ctx).await;

    let sent = ctx.channel.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Sent::Confirmation { to, total, .. } => {
            assert_eq!(to, "+573001234567");
            assert_eq!(*total, 4500 + 5200);
        }
        other => panic!("expected confirmation, got {other:?}"),
    }

    let logs = ctx.workflow.notifications(order_id).await.expect("logs");
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.kind, "ORDER_CREATED");
    assert_eq!(log.to, "+573001234567");
    assert!(log.ok);
    assert!(log.sid.is_some());
    assert_eq!(log.error, None);
}

#[tokio::test]
async fn happy_path_walks_received_en_route_delivered() {
    let ctx = TestContext::new();
    let order_id = place_order(&ctx).await;

    let view = ctx
        .workflow
        .update_status(order_id, OrderStatus::EnRoute)
        .await
        .expect("en route");
    assert_eq!(view.order.status, OrderStatus::EnRoute);

    let view = ctx
        .workflow
        .update_status(order_id, OrderStatus::Delivered)
        .await
        .expect("delivered");
    assert_eq!(view.order.status, OrderStatus::Delivered);

    let logs = ctx.workflow.notifications(order_id).await.expect("logs");
    let mut kinds: Vec<&str> = logs.iter().map(|l| l.kind.as_str()).collect();
    kinds.sort_unstable();
    assert_eq!(kinds, ["ORDER_CREATED", "STATUS_ENTREGADO", "STATUS_EN_CAMINO"]);
}

#[tokio::test]
async fn cancellation_is_allowed_until_delivery() {
    let ctx = TestContext::new();

    let order_id = place_order(&ctx).await;
    ctx.workflow
        .update_status(order_id, OrderStatus::Cancelled)
        .await
        .expect("cancel from received");

    let order_id = place_order(&ctx).await;
    ctx.workflow
        .update_status(order_id, OrderStatus::EnRoute)
        .await
        .expect("en route");
    ctx.workflow
        .update_status(order_id, OrderStatus::Cancelled)
        .await
        .expect("cancel from en route");
}

#[tokio::test]
async fn illegal_transitions_are_rejected() {
    let ctx = TestContext::new();
    let order_id = place_order(&ctx).await;

    // Skipping a step.
    let err = ctx
        .workflow
        .update_status(order_id, OrderStatus::Delivered)
        .await
        .expect_err("received cannot go straight to delivered");
    assert!(matches!(err, WorkflowError::IllegalTransition(_)));

    // Self-transition.
    let err = ctx
        .workflow
        .update_status(order_id, OrderStatus::Received)
        .await
        .expect_err("no self transition");
    assert!(matches!(err, WorkflowError::IllegalTransition(_)));

    // Terminal states accept nothing.
    ctx.workflow
        .update_status(order_id, OrderStatus::Cancelled)
        .await
        .expect("cancel");
    for target in [
        OrderStatus::Received,
        OrderStatus::EnRoute,
        OrderStatus::Delivered,
    ] {
        let err = ctx
            .workflow
            .update_status(order_id, target)
            .await
            .expect_err("cancelled is terminal");
        assert!(matches!(err, WorkflowError::IllegalTransition(_)));
    }
}

#[tokio::test]
async fn updating_a_missing_order_is_not_found() {
    let ctx = TestContext::new();
    let err = ctx
        .workflow
        .update_status(OrderId::new(999), OrderStatus::EnRoute)
        .await
        .expect_err("missing");
    assert!(matches!(err, WorkflowError::OrderNotFound));
}

#[tokio::test]
async fn channel_failure_never_fails_the_operation() {
    let ctx = TestContext::new();
    ctx.channel.fail_with("provider timeout");

    let order_id = place_order(&ctx).await;
    ctx.workflow
        .update_status(order_id, OrderStatus::EnRoute)
        .await
        .expect("status update succeeds despite the channel");

    let logs = ctx.workflow.notifications(order_id).await.expect("logs");
    assert_eq!(logs.len(), 2);
    for log in &logs {
        assert!(!log.ok);
        assert_eq!(log.sid, None);
        assert_eq!(log.error.as_deref(), Some("provider timeout"));
    }
}

#[tokio::test]
async fn missing_phone_still_logs_the_attempt() {
    let ctx = TestContext::new();
    ctx.store
        .insert_address(address(2, OTHER_CLIENTE_ID, Some(lat_for_km(5.0)), Some(0.0)));

    let created = ctx
        .workflow
        .create(
            UserId::new(OTHER_CLIENTE_ID),
            CreateOrderInput {
                address_id: AddressId::new(2),
                items: vec![CartItem {
                    product_id: ProductId::new(2),
                    quantity: 1,
                }],
                notes: None,
                payment_method: None,
            },
        )
        .await
        .expect("create");

    let logs = ctx
        .workflow
        .notifications(created.view.order.id)
        .await
        .expect("logs");
    assert_eq!(logs.len(), 1);
    // No phone on file normalizes to the bare prefix; the provider rejects
    // it, but the attempt is on record.
    assert_eq!(logs[0].to, "+57");
}
