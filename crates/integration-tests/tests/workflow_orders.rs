//! Order creation rules: coverage, stock, pricing, and atomicity.

use licorera_core::{AddressId, OrderStatus, ProductId, UserId};
use licorera_integration_tests::{
    CLIENTE_ID, HOME_ADDRESS_ID, OTHER_CLIENTE_ID, TestContext, address, lat_for_km,
    measured_km, shipping_at_origin,
};
use licorera_server::geo::shipping_for_km;
use licorera_server::services::workflow::{CartItem, CreateOrderInput, WorkflowError};

fn cart(items: &[(i32, i32)]) -> CreateOrderInput {
    CreateOrderInput {
        address_id: AddressId::new(HOME_ADDRESS_ID),
        items: items
            .iter()
            .map(|&(product_id, quantity)| CartItem {
                product_id: ProductId::new(product_id),
                quantity,
            })
            .collect(),
        notes: None,
        payment_method: None,
    }
}

#[tokio::test]
async fn create_computes_totals_with_shipping() {
    let ctx = TestContext::new();

    // Home address sits 8 km out: 2000 + 400 * 8 = 5200, above the floor.
    let created = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 2)]))
        .await
        .expect("create");

    assert_eq!(created.subtotal, 9000);
    assert_eq!(created.shipping, 5200);
    assert_eq!(created.view.order.total, 14_200);
    assert_eq!(created.view.order.status, OrderStatus::Received);

    let item = created.view.items.first().expect("one line");
    assert_eq!(item.unit_price, 4500);
    assert_eq!(item.line_total, 9000);
}

#[tokio::test]
async fn shipping_never_drops_below_the_floor() {
    let ctx = TestContext::new();
    // 1 km out: the linear fee would be 2400, the floor wins.
    ctx.store
        .insert_address(address(2, CLIENTE_ID, Some(lat_for_km(1.0)), Some(0.0)));

    let mut input = cart(&[(1, 1)]);
    input.address_id = AddressId::new(2);
    let created = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), input)
        .await
        .expect("create");

    assert_eq!(created.shipping, 5000);
}

#[test]
fn shipping_is_monotonic_in_distance() {
    let mut last = 0;
    for km in 0..=20 {
        let fee = shipping_for_km(f64::from(km), 2000, 400, 5000);
        assert!(fee >= last, "fee dropped at {km} km");
        assert!(fee >= 5000);
        last = fee;
    }
}

#[tokio::test]
async fn unit_price_is_a_snapshot() {
    let ctx = TestContext::new();
    let created = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 2)]))
        .await
        .expect("create");

    // Reprice the product after checkout.
    ctx.store
        .insert_product(licorera_integration_tests::product(
            1,
            "Club Colombia Dorada 330ml",
            9999,
            98,
        ));

    let view = ctx
        .workflow
        .list_mine(UserId::new(CLIENTE_ID))
        .await
        .expect("list")
        .into_iter()
        .find(|v| v.order.id == created.view.order.id)
        .expect("order present");
    let item = view.items.first().expect("line");
    assert_eq!(item.unit_price, 4500);
    assert_eq!(item.line_total, 9000);
    assert_eq!(view.order.total, 14_200);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let ctx = TestContext::new();
    let err = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[]))
        .await
        .expect_err("empty");
    assert!(matches!(err, WorkflowError::EmptyCart));
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let ctx = TestContext::new();
    let err = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 0)]))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, WorkflowError::InvalidQuantity(id) if id == ProductId::new(1)));
}

#[tokio::test]
async fn anothers_address_reads_as_missing() {
    let ctx = TestContext::new();
    let err = ctx
        .workflow
        .create(UserId::new(OTHER_CLIENTE_ID), cart(&[(1, 1)]))
        .await
        .expect_err("not the owner");
    assert!(matches!(err, WorkflowError::AddressNotFound));
}

#[tokio::test]
async fn address_without_coordinates_cannot_order() {
    let ctx = TestContext::new();
    ctx.store.insert_address(address(2, CLIENTE_ID, None, None));

    let mut input = cart(&[(1, 1)]);
    input.address_id = AddressId::new(2);
    let err = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), input)
        .await
        .expect_err("no geo");
    assert!(matches!(err, WorkflowError::AddressMissingGeo));
    assert_eq!(ctx.store.order_count(), 0);
    assert_eq!(ctx.store.product_stock(ProductId::new(1)), Some(100));
}

#[tokio::test]
async fn delivery_radius_is_inclusive() {
    // Exactly at the boundary: accepted. A hair under: rejected.
    let km = measured_km(8.0);

    let at_edge = TestContext::with_shipping(shipping_at_origin(km));
    at_edge
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 1)]))
        .await
        .expect("on the boundary");

    let inside = TestContext::with_shipping(shipping_at_origin(km - 1e-9));
    let err = inside
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 1)]))
        .await
        .expect_err("outside");
    assert!(matches!(err, WorkflowError::CoverageOutOfRange));
    assert_eq!(inside.store.order_count(), 0);
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let ctx = TestContext::new();
    let err = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 1), (99, 1)]))
        .await
        .expect_err("unknown product");
    assert!(matches!(err, WorkflowError::ProductNotFound));
    assert_eq!(ctx.store.product_stock(ProductId::new(1)), Some(100));
}

#[tokio::test]
async fn oversell_is_rejected_and_stock_untouched() {
    let ctx = TestContext::new();
    // Product 3 has stock 3.
    let err = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(3, 5)]))
        .await
        .expect_err("oversell");
    assert!(matches!(err, WorkflowError::OutOfStock(id) if id == ProductId::new(3)));
    assert_eq!(ctx.store.product_stock(ProductId::new(3)), Some(3));
    assert_eq!(ctx.store.order_count(), 0);
}

#[tokio::test]
async fn failing_line_rolls_back_the_whole_cart() {
    let ctx = TestContext::new();
    let err = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 2), (3, 5)]))
        .await
        .expect_err("second line oversells");
    assert!(matches!(err, WorkflowError::OutOfStock(id) if id == ProductId::new(3)));
    assert_eq!(ctx.store.product_stock(ProductId::new(1)), Some(100));
    assert_eq!(ctx.store.product_stock(ProductId::new(3)), Some(3));
    assert_eq!(ctx.store.order_count(), 0);
}

#[tokio::test]
async fn duplicate_lines_for_one_product_are_summed() {
    let ctx = TestContext::new();
    let created = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(1, 1), (1, 2)]))
        .await
        .expect("duplicates allowed");

    assert_eq!(created.subtotal, 3 * 4500);
    assert_eq!(ctx.store.product_stock(ProductId::new(1)), Some(97));

    // Summed, they can still oversell: stock 3, two lines of 2.
    let err = ctx
        .workflow
        .create(UserId::new(CLIENTE_ID), cart(&[(3, 2), (3, 2)]))
        .await
        .expect_err("summed oversell");
    assert!(matches!(err, WorkflowError::OutOfStock(id) if id == ProductId::new(3)));
    assert_eq!(ctx.store.product_stock(ProductId::new(3)), Some(3));
}
