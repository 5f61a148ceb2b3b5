//! Integration tests for the Bazaar storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! Each test starts its own [`StubShop`]: an `axum` server on an ephemeral
//! localhost port that speaks the shop API's routes and JSON shapes, and
//! records every request it receives. No external services are needed.
//!
//! # Test Categories
//!
//! - `api_gateway` - Endpoint paths, headers, caching, error mapping
//! - `auth_session` - Login, restore, profile, logout
//! - `checkout_flow` - Orders from the cart, cancellation
//! - `cart_persistence` - Cart store over the on-disk state directory

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path as UrlPath, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, RETRY_AFTER};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use bazaar_storefront::config::{ApiConfig, StorefrontConfig};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Username the stub accepts.
pub const USERNAME: &str = "anna";
/// Password the stub accepts for [`USERNAME`].
pub const PASSWORD: &str = "s3cret-pass";
/// Token issued to [`USERNAME`].
pub const TOKEN: &str = "tok-anna";
/// A username whose login succeeds without returning a token.
pub const NO_TOKEN_USERNAME: &str = "legacy";
/// A username whose login fails with a server error.
pub const BROKEN_USERNAME: &str = "broken";
/// A username the stub refuses to register.
pub const TAKEN_USERNAME: &str = "taken";
/// A product ID the stub answers with 429.
pub const RATE_LIMITED_PRODUCT: i64 = 999;
/// Total product count the listing reports.
pub const CATALOG_COUNT: u64 = 17;

/// A request as seen by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug)]
struct ShopState {
    requests: Vec<RecordedRequest>,
    user: Value,
    orders: Vec<Value>,
    next_order_id: i64,
    reject_orders: bool,
}

type Shared = Arc<Mutex<ShopState>>;

fn lock(shop: &Shared) -> MutexGuard<'_, ShopState> {
    shop.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A stub shop API running in the background.
pub struct StubShop {
    base_url: String,
    shop: Shared,
    handle: JoinHandle<()>,
}

impl StubShop {
    /// Bind to `127.0.0.1:0` and start serving.
    pub async fn start() -> Self {
        let shop: Shared = Arc::new(Mutex::new(ShopState {
            requests: Vec::new(),
            user: default_user(),
            orders: Vec::new(),
            next_order_id: 1,
            reject_orders: false,
        }));

        let app = Router::new()
            .route("/users/login/", post(login))
            .route("/users/register/", post(register))
            .route("/users/me/", get(me))
            .route("/users/profile/", patch(update_profile))
            .route("/products/categories/", get(categories))
            .route("/products/products/", get(products))
            .route("/products/products/{id}/", get(product))
            .route("/orders/orders/", get(orders).post(create_order))
            .route(
                "/orders/orders/{id}/",
                get(order).patch(update_order).delete(delete_order),
            )
            .layer(middleware::from_fn_with_state(shop.clone(), record))
            .with_state(shop.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move { axum::serve(listener, app).await.expect("serve stub shop") });

        Self {
            base_url: format!("http://{addr}/"),
            shop,
            handle,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this stub.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::for_base_url(&self.base_url).expect("stub base url")
    }

    /// Full configuration pointing at this stub and persisting into `state_dir`.
    #[must_use]
    pub fn storefront_config(&self, state_dir: &Path) -> StorefrontConfig {
        let vars: HashMap<&str, String> = HashMap::from([
            ("BAZAAR_API_URL", self.base_url.clone()),
            ("BAZAAR_STATE_DIR", state_dir.display().to_string()),
        ]);
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).expect("stub config")
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.shop).requests.clone()
    }

    /// Requests received for one path.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Orders the stub currently holds.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        lock(&self.shop).orders.clone()
    }

    /// Make order creation fail with a server error.
    pub fn reject_orders(&self, reject: bool) {
        lock(&self.shop).reject_orders = reject;
    }

    /// Store an order as if it had been placed earlier.
    pub fn seed_order(&self, status: &str) -> i64 {
        let mut shop = lock(&self.shop);
        let id = shop.next_order_id;
        shop.next_order_id += 1;
        shop.orders.push(json!({
            "id": id,
            "status": status,
            "status_display": display(status),
            "created_at": "2024-05-01T12:30:00Z",
            "total_price": "2490.00",
            "full_name": "Anna Petrova",
            "email": "anna@example.com",
            "phone": "+7 900 000-00-00",
            "address": "Lenina 1",
            "city": "Kazan",
            "postal_code": "",
            "notes": "",
            "items": [
                {"id": 1, "product": {"id": 1, "name": "Electric kettle", "image": null}, "quantity": 1, "price": "2490.00"}
            ]
        }));
        id
    }
}

impl Drop for StubShop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Middleware
// =============================================================================

async fn record(State(shop): State<Shared>, request: Request, next: Next) -> Response {
    let entry = {
        let headers = request.headers();
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            authorization: header_value(headers, AUTHORIZATION),
            content_type: header_value(headers, CONTENT_TYPE),
        }
    };
    lock(&shop).requests.push(entry);

    next.run(request).await
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// =============================================================================
// Users
// =============================================================================

async fn login(State(shop): State<Shared>, Json(body): Json<Value>) -> Response {
    match (body["username"].as_str(), body["password"].as_str()) {
        (Some(USERNAME), Some(PASSWORD)) => {
            let user = lock(&shop).user.clone();
            Json(json!({ "token": TOKEN, "user": user })).into_response()
        }
        (Some(NO_TOKEN_USERNAME), _) => {
            Json(json!({ "id": 2, "username": NO_TOKEN_USERNAME })).into_response()
        }
        (Some(BROKEN_USERNAME), _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Authentication backend unavailable" })),
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "non_field_errors": ["Unable to log in with provided credentials."] })),
        )
            .into_response(),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"] == TAKEN_USERNAME {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "username": ["A user with that username already exists."] })),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({ "id": 3, "username": body["username"], "email": body["email"] })),
    )
        .into_response()
}

async fn me(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(lock(&shop).user.clone()).into_response()
}

/// Answers with the profile only, the way the shop API does.
async fn update_profile(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut shop = lock(&shop);
    for field in ["first_name", "last_name", "email"] {
        if let Some(value) = body.get(field) {
            shop.user[field] = value.clone();
        }
    }
    for field in ["phone_number", "address"] {
        if let Some(value) = body.get(field) {
            shop.user["profile"][field] = value.clone();
        }
    }

    Json(shop.user["profile"].clone()).into_response()
}

// =============================================================================
// Catalog
// =============================================================================

async fn categories() -> Json<Value> {
    Json(json!([
        { "id": 1, "name": "Kitchen", "slug": "kitchen" },
        { "id": 2, "name": "Appliances", "slug": "appliances" }
    ]))
}

async fn products(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let page: u64 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    let next = (page < 3).then(|| format!("/products/products/?page={}", page + 1));

    Json(json!({
        "count": CATALOG_COUNT,
        "next": next,
        "previous": null,
        "results": [catalog_product(1), catalog_product(2)]
    }))
}

async fn product(UrlPath(id): UrlPath<i64>) -> Response {
    if id == RATE_LIMITED_PRODUCT {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(RETRY_AFTER, "7")],
            Json(json!({ "detail": "Request was throttled." })),
        )
            .into_response();
    }

    if (1..=3).contains(&id) {
        Json(catalog_product(id)).into_response()
    } else {
        not_found()
    }
}

// =============================================================================
// Orders
// =============================================================================

async fn orders(State(shop): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let orders = lock(&shop).orders.clone();
    Json(json!({ "count": orders.len(), "next": null, "previous": null, "results": orders }))
        .into_response()
}

async fn create_order(
    State(shop): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut shop = lock(&shop);
    if shop.reject_orders {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Payment service unavailable" })),
        )
            .into_response();
    }

    let requested = body["items"].as_array().cloned().unwrap_or_default();
    if requested.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "items": ["This list may not be empty."] })),
        )
            .into_response();
    }

    let items: Vec<Value> = requested
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let product = catalog_product(item["product_id"].as_i64().unwrap_or_default());
            json!({
                "id": i + 1,
                "product": { "id": product["id"], "name": product["name"], "image": null },
                "quantity": item["quantity"],
                "price": product["price"]
            })
        })
        .collect();

    let id = shop.next_order_id;
    shop.next_order_id += 1;

    let mut order = body.clone();
    order["id"] = json!(id);
    order["status"] = json!("pending");
    order["status_display"] = json!("Pending");
    order["created_at"] = json!("2024-05-01T12:30:00Z");
    order["items"] = Value::Array(items);
    shop.orders.push(order.clone());

    (StatusCode::CREATED, Json(order)).into_response()
}

async fn order(State(shop): State<Shared>, headers: HeaderMap, UrlPath(id): UrlPath<i64>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    lock(&shop)
        .orders
        .iter()
        .find(|order| order["id"] == id)
        .map_or_else(not_found, |order| Json(order.clone()).into_response())
}

async fn update_order(
    State(shop): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut shop = lock(&shop);
    let Some(order) = shop.orders.iter_mut().find(|order| order["id"] == id) else {
        return not_found();
    };

    if let Some(status) = body["status"].as_str() {
        order["status"] = json!(status);
        order["status_display"] = json!(display(status));
    }

    Json(order.clone()).into_response()
}

async fn delete_order(
    State(shop): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<i64>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let mut shop = lock(&shop);
    let before = shop.orders.len();
    shop.orders.retain(|order| order["id"] != id);

    if shop.orders.len() == before {
        not_found()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Token {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Invalid token." })),
    )
        .into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
}

fn display(status: &str) -> String {
    let mut chars = status.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn default_user() -> Value {
    json!({
        "id": 1,
        "username": USERNAME,
        "email": "anna@example.com",
        "first_name": "Anna",
        "last_name": "Petrova",
        "profile": {
            "phone_number": "+7 900 000-00-00",
            "address": "Lenina 1",
            "profile_picture": null
        }
    })
}

/// Catalog fixture. Prices come as strings, numbers, and a nested category,
/// covering the shapes the real API has sent.
#[must_use]
pub fn catalog_product(id: i64) -> Value {
    match id {
        1 => json!({
            "id": 1, "name": "Electric kettle", "description": "1.7 L, steel.",
            "price": "2490.00", "image": "https://cdn.example.com/kettle.jpg",
            "category": 2, "in_stock": true, "stock": 12
        }),
        2 => json!({
            "id": 2, "name": "Teapot", "description": "",
            "price": "990.00", "image": null,
            "category": { "id": 1, "name": "Kitchen" }, "in_stock": true
        }),
        _ => json!({
            "id": id, "name": "Mug", "price": 350, "in_stock": true
        }),
    }
}
