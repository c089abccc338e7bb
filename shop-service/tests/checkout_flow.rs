//! End-to-end checkout against a real PostgreSQL. Set `TEST_DATABASE_URL`
//! to run; every test returns early without it.

use std::str::FromStr;
use std::sync::Once;
use std::time::Duration;

use bigdecimal::BigDecimal;
use diesel::sql_types::Integer;
use diesel::{Connection, ExpressionMethods, PgConnection, QueryDsl};
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use diesel_migrations::MigrationHarness;
use shared::*;
use uuid::Uuid;

use shop_service::auth::TokenKeys;
use shop_service::config::JwtConfig;
use shop_service::error::ShopError;
use shop_service::pagination::Page;
use shop_service::schema::products;
use shop_service::services::*;
use shop_service::upload::LocalUploadStore;
use shop_service::{DbPool, MIGRATIONS};

static MIGRATE: Once = Once::new();

struct Harness {
    url: String,
    pool: DbPool,
    auth: AuthService,
    catalog: CatalogService,
    carts: CartService,
    orders: OrderService,
}

async fn harness() -> Option<Harness> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;

    let migrate_url = url.clone();
    tokio::task::spawn_blocking(move || {
        MIGRATE.call_once(|| {
            let mut conn = PgConnection::establish(&migrate_url).expect("connect for migrations");
            conn.run_pending_migrations(MIGRATIONS).expect("run migrations");
        });
    })
    .await
    .unwrap();

    let pool = pool_of(&url, 8).await;
    let keys = TokenKeys::new(&JwtConfig {
        secret: "integration".into(),
        access_ttl: Duration::from_secs(900),
        refresh_ttl: Duration::from_secs(3600),
    });
    let uploads = LocalUploadStore::new(std::env::temp_dir().join("shop-it-uploads"));

    Some(Harness {
        auth: AuthService::new(pool.clone(), keys),
        catalog: CatalogService::new(pool.clone(), uploads),
        carts: CartService::new(pool.clone()),
        orders: OrderService::new(pool.clone(), Duration::from_secs(5)),
        pool,
        url,
    })
}

async fn pool_of(url: &str, size: u32) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    Pool::builder().max_size(size).build(manager).await.unwrap()
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

impl Harness {
    async fn customer(&self) -> i32 {
        let auth = self
            .auth
            .register(RegisterRequest {
                email: format!("{}@shop.test", Uuid::new_v4()),
                password: "password123".into(),
                first_name: "Test".into(),
                last_name: "Buyer".into(),
                phone: None,
            })
            .await
            .unwrap();
        auth.user.id
    }

    async fn product(&self, name: &str, price: &str, stock: i32) -> ProductResponse {
        let category = self
            .catalog
            .create_category(CreateCategoryRequest {
                name: format!("cat-{}", Uuid::new_v4()),
                description: String::new(),
            })
            .await
            .unwrap();
        self.catalog
            .create_product(CreateProductRequest {
                category_id: category.id,
                name: name.into(),
                description: String::new(),
                price: dec(price),
                stock,
                sku: Uuid::new_v4().to_string(),
            })
            .await
            .unwrap()
    }

    async fn add(&self, user_id: i32, product_id: i32, quantity: i32) {
        self.carts
            .add_to_cart(user_id, AddToCartRequest { product_id, quantity })
            .await
            .unwrap();
    }

    async fn stock(&self, product_id: i32) -> i32 {
        self.catalog.get_product(product_id).await.unwrap().stock
    }

    /// Reads stock straight from the table, deleted rows included.
    async fn raw_stock(&self, product_id: i32) -> i32 {
        let mut pooled = self.pool.get().await.unwrap();
        let conn: &mut AsyncPgConnection = &mut pooled;
        products::table
            .filter(products::id.eq(product_id))
            .select(products::stock)
            .first(conn)
            .await
            .unwrap()
    }

    async fn set_product(&self, product: &ProductResponse, price: &str, stock: i32) {
        self.catalog
            .update_product(
                product.id,
                UpdateProductRequest {
                    category_id: product.category_id,
                    name: product.name.clone(),
                    description: product.description.clone(),
                    price: dec(price),
                    stock,
                    is_active: None,
                },
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn checkout_moves_cart_into_order_and_decrements_stock() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    let a = h.product("A", "10.00", 5).await;
    let b = h.product("B", "5.00", 1).await;
    h.add(user, a.id, 2).await;
    h.add(user, b.id, 1).await;

    let order = h.orders.place_order(user).await.unwrap();

    assert_eq!(order.total_amount, dec("25.00"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.order_items.len(), 2);
    assert_eq!(order.order_items[0].product.id, a.id);
    assert_eq!(order.order_items[0].price, dec("10.00"));
    assert_eq!(h.stock(a.id).await, 3);
    assert_eq!(h.stock(b.id).await, 0);
    assert!(h.carts.get_cart(user).await.unwrap().cart_items.is_empty());

    // a second checkout sees the emptied cart
    assert!(matches!(h.orders.place_order(user).await, Err(ShopError::EmptyCart)));
}

#[tokio::test]
async fn insufficient_stock_leaves_everything_untouched() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    let a = h.product("A", "10.00", 5).await;
    let c = h.product("C", "3.00", 1).await;
    h.add(user, a.id, 2).await;
    h.add(user, c.id, 1).await;
    h.set_product(&c, "3.00", 0).await;

    match h.orders.place_order(user).await {
        Err(ShopError::InsufficientStock { product }) => assert_eq!(product, "C"),
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(h.stock(a.id).await, 5);
    assert_eq!(h.carts.get_cart(user).await.unwrap().cart_items.len(), 2);
    let (orders, meta) = h.orders.list_orders(user, Page::new(1, 10)).await.unwrap();
    assert!(orders.is_empty());
    assert_eq!(meta.total, 0);
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    assert!(matches!(h.orders.place_order(user).await, Err(ShopError::EmptyCart)));
}

#[tokio::test]
async fn order_keeps_price_paid_after_product_price_changes() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    let a = h.product("A", "10.00", 5).await;
    h.add(user, a.id, 1).await;
    let placed = h.orders.place_order(user).await.unwrap();

    h.set_product(&a, "12.00", 4).await;

    let order = h.orders.get_order(user, placed.id).await.unwrap();
    assert_eq!(order.order_items[0].price, dec("10.00"));
    assert_eq!(order.order_items[0].product.price, dec("12.00"));
    assert_eq!(order.total_amount, dec("10.00"));
}

#[tokio::test]
async fn orders_are_paginated_newest_first() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    let a = h.product("A", "1.00", 25).await;

    let mut placed = Vec::new();
    for _ in 0..25 {
        h.add(user, a.id, 1).await;
        placed.push(h.orders.place_order(user).await.unwrap().id);
    }

    let (page, meta) = h.orders.list_orders(user, Page::new(2, 10)).await.unwrap();
    assert_eq!(meta, PaginationMeta { page: 2, limit: 10, total: 25, total_page: 3 });

    let expected: Vec<i32> = placed.iter().rev().skip(10).take(10).copied().collect();
    let got: Vec<i32> = page.iter().map(|o| o.id).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn orders_of_other_users_are_not_found() {
    let Some(h) = harness().await else { return };
    let owner = h.customer().await;
    let stranger = h.customer().await;
    let a = h.product("A", "2.00", 3).await;
    h.add(owner, a.id, 1).await;
    let order = h.orders.place_order(owner).await.unwrap();

    assert!(matches!(
        h.orders.get_order(stranger, order.id).await,
        Err(ShopError::NotFound("order"))
    ));
    let (orders, _) = h.orders.list_orders(stranger, Page::new(1, 10)).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_never_oversell() {
    let Some(h) = harness().await else { return };
    let last = h.product("Last one", "9.99", 1).await;
    let first = h.customer().await;
    let second = h.customer().await;
    h.add(first, last.id, 1).await;
    h.add(second, last.id, 1).await;

    let results = futures::future::join_all([h.orders.place_order(first), h.orders.place_order(second)]).await;

    let placed = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(ShopError::InsufficientStock { .. })))
        .count();
    assert_eq!((placed, rejected), (1, 1));
    assert_eq!(h.stock(last.id).await, 0);
}

#[tokio::test]
async fn adding_same_product_twice_sums_quantities() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    let a = h.product("A", "4.00", 3).await;
    h.add(user, a.id, 1).await;
    h.add(user, a.id, 2).await;

    let cart = h.carts.get_cart(user).await.unwrap();
    assert_eq!(cart.cart_items.len(), 1);
    assert_eq!(cart.cart_items[0].quantity, 3);
    assert_eq!(cart.total, dec("12.00"));

    let over = h
        .carts
        .add_to_cart(user, AddToCartRequest { product_id: a.id, quantity: 1 })
        .await;
    assert!(matches!(over, Err(ShopError::InsufficientStock { .. })));
}

#[tokio::test]
async fn refresh_rotates_and_logout_revokes() {
    let Some(h) = harness().await else { return };
    let email = format!("{}@shop.test", Uuid::new_v4());
    let registered = h
        .auth
        .register(RegisterRequest {
            email: email.clone(),
            password: "password123".into(),
            first_name: "Rae".into(),
            last_name: "Fresh".into(),
            phone: Some("555-0100".into()),
        })
        .await
        .unwrap();

    let duplicate = h
        .auth
        .register(RegisterRequest {
            email: email.clone(),
            password: "password123".into(),
            first_name: "Rae".into(),
            last_name: "Again".into(),
            phone: None,
        })
        .await;
    assert!(matches!(duplicate, Err(ShopError::Conflict(_))));

    let rotated = h.auth.refresh(&registered.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, registered.refresh_token);
    assert!(matches!(
        h.auth.refresh(&registered.refresh_token).await,
        Err(ShopError::Unauthorized(_))
    ));

    h.auth.logout(&rotated.refresh_token).await.unwrap();
    h.auth.logout(&rotated.refresh_token).await.unwrap();
    assert!(h.auth.refresh(&rotated.refresh_token).await.is_err());

    let wrong = h
        .auth
        .login(LoginRequest { email, password: "not-the-password".into() })
        .await;
    assert!(matches!(wrong, Err(ShopError::Unauthorized(_))));
}

#[tokio::test]
async fn deleted_product_in_cart_is_not_sold() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    let kept = h.product("Kept", "3.00", 5).await;
    let gone = h.product("Gone", "7.00", 5).await;
    h.add(user, kept.id, 1).await;
    h.add(user, gone.id, 2).await;
    h.catalog.delete_product(gone.id).await.unwrap();

    let cart = h.carts.get_cart(user).await.unwrap();
    assert_eq!(cart.cart_items.len(), 1);
    assert_eq!(cart.cart_items[0].product.id, kept.id);
    assert_eq!(cart.total, dec("3.00"));

    assert!(matches!(
        h.orders.place_order(user).await,
        Err(ShopError::NotFound("product"))
    ));
    assert_eq!(h.raw_stock(gone.id).await, 5);
    assert_eq!(h.stock(kept.id).await, 5);
    let (orders, _) = h.orders.list_orders(user, Page::new(1, 10)).await.unwrap();
    assert!(orders.is_empty());

    // nor can it be added back
    let dead_line = h
        .carts
        .add_to_cart(user, AddToCartRequest { product_id: gone.id, quantity: 1 })
        .await;
    assert!(matches!(dead_line, Err(ShopError::NotFound("product"))));
}

#[tokio::test]
async fn checkout_past_deadline_rolls_back_and_pool_recovers() {
    let Some(h) = harness().await else { return };
    let user = h.customer().await;
    let held = h.product("Held", "6.00", 4).await;
    h.add(user, held.id, 1).await;

    let single = pool_of(&h.url, 1).await;
    let impatient = OrderService::new(single.clone(), Duration::from_millis(300));

    let mut blocker = AsyncPgConnection::establish(&h.url).await.unwrap();
    diesel::sql_query("BEGIN").execute(&mut blocker).await.unwrap();
    diesel::sql_query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
        .bind::<Integer, _>(held.id)
        .execute(&mut blocker)
        .await
        .unwrap();

    assert!(matches!(
        impatient.place_order(user).await,
        Err(ShopError::Persistence(_))
    ));

    diesel::sql_query("ROLLBACK").execute(&mut blocker).await.unwrap();

    assert_eq!(h.stock(held.id).await, 4);
    assert_eq!(h.carts.get_cart(user).await.unwrap().cart_items.len(), 1);
    let (orders, _) = h.orders.list_orders(user, Page::new(1, 10)).await.unwrap();
    assert!(orders.is_empty());

    let patient = OrderService::new(single, Duration::from_secs(5));
    let order = patient.place_order(user).await.unwrap();
    assert_eq!(order.total_amount, dec("6.00"));
    assert_eq!(h.stock(held.id).await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_images_elect_one_primary() {
    let Some(h) = harness().await else { return };
    let pictured = h.product("Pictured", "2.00", 1).await;

    let results = futures::future::join_all((0..4).map(|i| {
        h.catalog.add_product_image(
            pictured.id,
            format!("/uploads/products/{}/{}.png", pictured.id, i),
            String::new(),
        )
    }))
    .await;

    let images: Vec<ProductImageResponse> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(images.iter().filter(|img| img.is_primary).count(), 1);
    assert_eq!(h.catalog.get_product(pictured.id).await.unwrap().images.len(), 4);
}
