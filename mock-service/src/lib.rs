use axum::{
    debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rand_distr::{Distribution, Normal};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicI64, AtomicU64, Ordering},
    Arc, Mutex, PoisonError, RwLock,
};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use axum::http::StatusCode;

pub mod prelude {
    pub use crate::{spawn, GatewayState, Route, StatusCode};
}

/// Every endpoint the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Route {
    ListProducts,
    GetProduct,
    ListCategories,
    CreateProduct,
    ListUsers,
    CreateUser,
    ListOrders,
    CreateCart,
    CreateOrder,
}

#[derive(Debug, Clone)]
struct Override {
    status: StatusCode,
    body: Option<Value>,
}

#[derive(Debug, Default)]
struct Store {
    products: Vec<Value>,
    categories: Vec<Value>,
    users: Vec<Value>,
    carts: Vec<Value>,
    orders: Vec<Value>,
}

/// In-memory gateway state with per-route hit counters and fault injection.
#[derive(Debug)]
pub struct GatewayState {
    store: RwLock<Store>,
    hits: Mutex<HashMap<Route, u64>>,
    total_hits: AtomicU64,
    overrides: RwLock<HashMap<Route, Override>>,
    latency: RwLock<Option<Normal<f64>>>,
    next_id: AtomicI64,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            hits: Mutex::new(HashMap::new()),
            total_hits: AtomicU64::new(0),
            overrides: RwLock::new(HashMap::new()),
            latency: RwLock::new(None),
            next_id: AtomicI64::new(1),
        }
    }
}

impl GatewayState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn seed_products(&self, count: usize) -> Vec<i64> {
        (0..count)
            .map(|i| {
                let id = self.next_id();
                self.write().products.push(json!({
                    "productId": id,
                    "productTitle": format!("Seeded Product {i}"),
                    "sku": format!("SEED-{id}"),
                    "priceUnit": 10.0,
                    "quantity": 5,
                }));
                id
            })
            .collect()
    }

    pub fn seed_categories(&self, count: usize) -> Vec<i64> {
        (0..count)
            .map(|i| {
                let id = self.next_id();
                self.write().categories.push(json!({
                    "categoryId": id,
                    "categoryTitle": format!("Seeded Category {i}"),
                }));
                id
            })
            .collect()
    }

    /// Requests received on `route`, overridden or not.
    pub fn hits(&self, route: Route) -> u64 {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&route)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits.load(Ordering::Relaxed)
    }

    /// Answer every request on `route` with `status` (and `body`, or an empty object).
    pub fn set_override(&self, route: Route, status: StatusCode, body: Option<Value>) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(route, Override { status, body });
    }

    pub fn clear_override(&self, route: Route) {
        self.overrides
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&route);
    }

    /// Normally distributed response delay.
    pub fn set_latency(&self, mean: Duration, std: Duration) {
        let normal = Normal::new(mean.as_secs_f64(), std.as_secs_f64()).ok();
        *self.latency.write().unwrap_or_else(PoisonError::into_inner) = normal;
    }

    pub fn products(&self) -> Vec<Value> {
        self.read().products.clone()
    }

    pub fn users(&self) -> Vec<Value> {
        self.read().users.clone()
    }

    pub fn carts(&self) -> Vec<Value> {
        self.read().carts.clone()
    }

    pub fn orders(&self) -> Vec<Value> {
        self.read().orders.clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts the hit, applies the configured delay, and returns the override response if one is
    /// set for `route`.
    async fn enter(&self, route: Route) -> Option<Response> {
        *self
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(route)
            .or_insert(0) += 1;
        self.total_hits.fetch_add(1, Ordering::Relaxed);

        let delay = self
            .latency
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|normal| normal.sample(&mut rand::thread_rng()).max(0.));
        if let Some(delay) = delay {
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }

        let overridden = self
            .overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&route)
            .cloned();
        overridden.map(|o| {
            debug!("{route:?} overridden with {}", o.status);
            (o.status, Json(o.body.unwrap_or_else(|| json!({})))).into_response()
        })
    }
}

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(
            "/product-service/api/products",
            get(list_products).post(create_product),
        )
        .route("/product-service/api/products/:product_id", get(get_product))
        .route("/product-service/api/categories", get(list_categories))
        .route("/user-service/api/users", get(list_users).post(create_user))
        .route("/order-service/api/orders", get(list_orders).post(create_order))
        .route("/order-service/api/carts", axum::routing::post(create_cart))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves the gateway in the background. Returns the bound address.
pub async fn spawn(addr: SocketAddr, state: Arc<GatewayState>) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router(state)).await {
            tracing::error!("Mock gateway stopped: {err}");
        }
    });
    Ok(local_addr)
}

pub async fn run(addr: SocketAddr, state: Arc<GatewayState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mock gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn collection(items: Vec<Value>) -> Response {
    Json(json!({ "collection": items })).into_response()
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "msg": msg }))).into_response()
}

/// Stores `body` with a fresh id under `id_field` and echoes it back.
fn create(
    state: &GatewayState,
    mut body: Value,
    id_field: &str,
    table: impl FnOnce(&mut Store) -> &mut Vec<Value>,
) -> Response {
    let Some(object) = body.as_object_mut() else {
        return bad_request("expected a JSON object");
    };
    object.insert(id_field.to_string(), json!(state.next_id()));
    table(&mut state.write()).push(body.clone());
    Json(body).into_response()
}

#[debug_handler]
async fn list_products(State(state): State<Arc<GatewayState>>) -> Response {
    if let Some(res) = state.enter(Route::ListProducts).await {
        return res;
    }
    collection(state.products())
}

#[debug_handler]
async fn get_product(
    State(state): State<Arc<GatewayState>>,
    Path(product_id): Path<i64>,
) -> Response {
    if let Some(res) = state.enter(Route::GetProduct).await {
        return res;
    }
    let product = state
        .read()
        .products
        .iter()
        .find(|p| p["productId"] == json!(product_id))
        .cloned();
    match product {
        Some(product) => Json(product).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_categories(State(state): State<Arc<GatewayState>>) -> Response {
    if let Some(res) = state.enter(Route::ListCategories).await {
        return res;
    }
    collection(state.read().categories.clone())
}

#[debug_handler]
async fn create_product(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(res) = state.enter(Route::CreateProduct).await {
        return res;
    }
    if body["category"]["categoryId"].is_null() {
        return bad_request("category.categoryId is required");
    }
    create(&state, body, "productId", |s| &mut s.products)
}

async fn list_users(State(state): State<Arc<GatewayState>>) -> Response {
    if let Some(res) = state.enter(Route::ListUsers).await {
        return res;
    }
    collection(state.users())
}

async fn create_user(State(state): State<Arc<GatewayState>>, Json(body): Json<Value>) -> Response {
    if let Some(res) = state.enter(Route::CreateUser).await {
        return res;
    }
    create(&state, body, "userId", |s| &mut s.users)
}

async fn list_orders(State(state): State<Arc<GatewayState>>) -> Response {
    if let Some(res) = state.enter(Route::ListOrders).await {
        return res;
    }
    collection(state.orders())
}

async fn create_cart(State(state): State<Arc<GatewayState>>, Json(body): Json<Value>) -> Response {
    if let Some(res) = state.enter(Route::CreateCart).await {
        return res;
    }
    if body["userId"].is_null() {
        return bad_request("userId is required");
    }
    create(&state, body, "cartId", |s| &mut s.carts)
}

async fn create_order(State(state): State<Arc<GatewayState>>, Json(body): Json<Value>) -> Response {
    if let Some(res) = state.enter(Route::CreateOrder).await {
        return res;
    }
    let cart_id = &body["cart"]["cartId"];
    let known_cart = state
        .read()
        .carts
        .iter()
        .any(|cart| &cart["cartId"] == cart_id);
    if !known_cart {
        return bad_request("unknown cart");
    }
    create(&state, body, "orderId", |s| &mut s.orders)
}

/** Request rate printer **/

pub async fn request_rate_task(state: Arc<GatewayState>) {
    let mut last = state.total_hits();
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let total = state.total_hits();
        info!("{} requests/s", total - last);
        last = total;
    }
}
