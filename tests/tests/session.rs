mod utils;
use utils::*;

use ecommerce_load::prelude::*;
use ecommerce_load::StatsRegistry;
use mock_service::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[tracing_test::traced_test]
#[tokio::test]
async fn seeding_caps_ids() {
    let h = init().await;
    let products = h.state.seed_products(15);
    let categories = h.state.seed_categories(8);

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(user.on_start()).await;

    assert_eq!(user.product_ids().len(), 10);
    assert_eq!(user.category_ids().len(), 5);

    let expected: Vec<Id> = products[..10].iter().copied().map(Id::from).collect();
    assert_eq!(user.product_ids(), expected.as_slice());
    let expected: Vec<Id> = categories[..5].iter().copied().map(Id::from).collect();
    assert_eq!(user.category_ids(), expected.as_slice());
}

#[tracing_test::traced_test]
#[tokio::test]
async fn seeding_reads_collection_ids() {
    let h = init().await;
    h.state.set_override(
        Route::ListProducts,
        StatusCode::OK,
        Some(json!({ "collection": [{ "productId": 1 }, { "productId": 2 }] })),
    );

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(user.on_start()).await;

    assert!(user.product_ids().contains(&Id::Num(1)));
    assert_eq!(user.product_ids().len(), 2);
    assert!(user.category_ids().is_empty());
}

#[tracing_test::traced_test]
#[tokio::test]
async fn failed_seeding_turns_dependent_tasks_into_noops() {
    let h = init().await;
    h.state.seed_products(3);
    h.state.seed_categories(3);
    h.state
        .set_override(Route::ListProducts, StatusCode::INTERNAL_SERVER_ERROR, None);
    h.state
        .set_override(Route::ListCategories, StatusCode::INTERNAL_SERVER_ERROR, None);

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(async {
        user.on_start().await;
        user.get_product_by_id().await;
        user.create_product().await;
    })
    .await;

    assert!(user.product_ids().is_empty());
    assert!(user.category_ids().is_empty());
    assert_eq!(h.state.hits(Route::GetProduct), 0);
    assert_eq!(h.state.hits(Route::CreateProduct), 0);

    let seed = h.stats.counts("GET Products List").unwrap();
    assert_eq!(seed.failure, 1);
    assert_eq!(seed.failures.get("Status code: 500"), Some(&1));
    assert!(h.stats.counts("GET Product by ID").is_none());
    assert!(h.stats.counts("POST Create Product").is_none());
    assert!(logs_contain("Failed to load existing products"));
}

#[tracing_test::traced_test]
#[tokio::test]
async fn seeding_survives_transport_errors() {
    let stats = Arc::new(StatsRegistry::default());
    let mut user = EcommerceUser::new(unreachable_gateway().await);

    ecommerce_load::transaction::record_into(stats.clone(), user.on_start()).await;

    assert!(user.product_ids().is_empty());
    assert!(user.category_ids().is_empty());
    assert_eq!(stats.counts("GET Products List").unwrap().failure, 1);
    assert_eq!(stats.counts("GET Categories List").unwrap().failure, 1);
}

#[tracing_test::traced_test]
#[tokio::test]
async fn get_product_by_id_uses_seeded_ids() {
    let h = init().await;
    h.state.seed_products(4);

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(async {
        user.on_start().await;
        user.get_product_by_id().await;
        user.get_product_by_id().await;
    })
    .await;

    assert_eq!(h.state.hits(Route::GetProduct), 2);
    assert_eq!(h.stats.counts("GET Product by ID").unwrap().success, 2);
}

#[tracing_test::traced_test]
#[tokio::test]
async fn create_product_appends_new_id_once() {
    let h = init().await;
    let categories = h.state.seed_categories(2);

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(async {
        user.on_start().await;
        user.create_product().await;
    })
    .await;

    let created = h.state.products();
    assert_eq!(created.len(), 1);
    let product_id = created[0]["productId"].as_i64().unwrap();
    assert_eq!(user.product_ids(), &[Id::Num(product_id)]);

    let category_id = created[0]["category"]["categoryId"].as_i64().unwrap();
    assert!(categories.contains(&category_id));
    assert!(created[0]["sku"].as_str().unwrap().starts_with("PERF-TEST-"));
    assert_eq!(h.stats.counts("POST Create Product").unwrap().success, 1);
}

#[tracing_test::traced_test]
#[tokio::test]
async fn create_product_without_id_in_response() {
    let h = init().await;
    h.state.seed_categories(1);
    h.state
        .set_override(Route::CreateProduct, StatusCode::OK, Some(json!({ "ok": true })));

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(async {
        user.on_start().await;
        user.create_product().await;
    })
    .await;

    assert!(user.product_ids().is_empty());
    assert_eq!(h.stats.counts("POST Create Product").unwrap().success, 1);
}

#[tracing_test::traced_test]
#[tokio::test]
async fn create_product_keeps_non_integer_id() {
    let h = init().await;
    h.state.seed_categories(1);
    h.state.set_override(
        Route::CreateProduct,
        StatusCode::OK,
        Some(json!({ "productId": 1.5 })),
    );

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(async {
        user.on_start().await;
        user.create_product().await;
    })
    .await;

    assert_eq!(user.product_ids().len(), 1);
    assert_eq!(user.product_ids()[0].to_string(), "1.5");
}

#[tracing_test::traced_test]
#[tokio::test]
async fn create_user_stores_user_id() {
    let h = init().await;

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(user.create_user()).await;

    let created = h.state.users();
    assert_eq!(created.len(), 1);
    assert_eq!(
        user.user_id(),
        Some(&Id::Num(created[0]["userId"].as_i64().unwrap()))
    );
    assert_eq!(created[0]["lastName"], json!("Performance"));
}

#[tracing_test::traced_test]
#[tokio::test]
async fn only_200_counts_as_success() {
    let h = init().await;
    h.state.set_override(
        Route::CreateUser,
        StatusCode::CREATED,
        Some(json!({ "userId": 99 })),
    );

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(user.create_user()).await;

    assert_eq!(user.user_id(), None);
    let counts = h.stats.counts("POST Create User").unwrap();
    assert_eq!((counts.success, counts.failure), (0, 1));
    assert_eq!(counts.failures.get("Status code: 201"), Some(&1));
}

#[tracing_test::traced_test]
#[tokio::test]
async fn create_order_runs_full_purchase_flow() {
    let h = init().await;

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(user.create_order()).await;

    assert_eq!(h.state.hits(Route::CreateUser), 1);
    assert_eq!(h.state.hits(Route::CreateCart), 1);
    assert_eq!(h.state.hits(Route::CreateOrder), 1);

    let users = h.state.users();
    let carts = h.state.carts();
    let orders = h.state.orders();
    assert_eq!(
        user.user_id(),
        Some(&Id::Num(users[0]["userId"].as_i64().unwrap()))
    );
    assert_eq!(
        user.cart_id(),
        Some(&Id::Num(carts[0]["cartId"].as_i64().unwrap()))
    );
    assert_eq!(
        user.order_id(),
        Some(&Id::Num(orders[0]["orderId"].as_i64().unwrap()))
    );

    assert!(users[0]["firstName"].as_str().unwrap().starts_with("OrderUser"));
    assert_eq!(carts[0]["userId"], users[0]["userId"]);
    assert_eq!(orders[0]["cart"]["cartId"], carts[0]["cartId"]);
    assert_eq!(orders[0]["cart"]["userId"], users[0]["userId"]);
    assert_eq!(orders[0]["orderDesc"], json!("Performance Test Order"));

    let order_date = orders[0]["orderDate"].as_str().unwrap();
    assert_eq!(order_date.len(), 27);
    assert_eq!(&order_date[10..12], "__");
    assert_eq!(&order_date[20..21], ":");

    for name in [
        "POST Create User (for Order)",
        "POST Create Cart (for Order)",
        "POST Create Order",
    ] {
        assert_eq!(h.stats.counts(name).unwrap().success, 1, "{name}");
    }
}

#[tracing_test::traced_test]
#[tokio::test]
async fn create_order_reuses_session_user() {
    let h = init().await;

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(async {
        user.create_user().await;
        user.create_order().await;
        user.create_order().await;
    })
    .await;

    assert_eq!(h.state.hits(Route::CreateUser), 1);
    assert_eq!(h.state.hits(Route::CreateCart), 2);
    assert_eq!(h.state.hits(Route::CreateOrder), 2);
    assert!(h.stats.counts("POST Create User (for Order)").is_none());
}

#[tracing_test::traced_test]
#[tokio::test]
async fn failed_user_creation_stops_order_flow() {
    let h = init().await;
    h.state
        .set_override(Route::CreateUser, StatusCode::SERVICE_UNAVAILABLE, None);

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(user.create_order()).await;

    assert_eq!(h.state.hits(Route::CreateUser), 1);
    assert_eq!(h.state.hits(Route::CreateCart), 0);
    assert_eq!(h.state.hits(Route::CreateOrder), 0);
    assert_eq!(user.user_id(), None);
    assert_eq!(
        h.stats
            .counts("POST Create User (for Order)")
            .unwrap()
            .failures
            .get("Status code: 503"),
        Some(&1)
    );
}

#[tracing_test::traced_test]
#[tokio::test]
async fn failed_cart_creation_stops_order_flow() {
    let h = init().await;
    h.state
        .set_override(Route::CreateCart, StatusCode::INTERNAL_SERVER_ERROR, None);

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(user.create_order()).await;

    assert_eq!(h.state.hits(Route::CreateCart), 1);
    assert_eq!(h.state.hits(Route::CreateOrder), 0);
    // The user created for the order is kept; nothing is rolled back.
    assert!(user.user_id().is_some());
    assert_eq!(user.cart_id(), None);
    assert_eq!(user.order_id(), None);
}

#[tracing_test::traced_test]
#[tokio::test]
async fn run_dispatches_each_task() {
    let h = init().await;
    h.state.seed_products(2);
    h.state.seed_categories(2);

    let mut user = EcommerceUser::new(h.gateway.clone());
    h.record(async {
        user.on_start().await;
        for task in TASKS {
            user.run(task.kind).await;
        }
    })
    .await;

    // Products and categories are listed once more on top of seeding.
    assert_eq!(h.state.hits(Route::ListProducts), 2);
    assert_eq!(h.state.hits(Route::ListCategories), 2);
    for route in [
        Route::GetProduct,
        Route::CreateProduct,
        Route::ListUsers,
        Route::CreateUser,
        Route::ListOrders,
        Route::CreateCart,
        Route::CreateOrder,
    ] {
        assert_eq!(h.state.hits(route), 1, "{route:?}");
    }
    assert_eq!(h.stats.counts("GET Users List").unwrap().success, 1);
}
