//! Integration tests for the Awis storefront.
//!
//! Each test starts two servers on ephemeral ports: a scripted commerce
//! backend speaking the backend's JSON wire format, and the real storefront
//! router configured to talk to it. A cookie-keeping client then walks the
//! checkout like a browser would, without following redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p awis-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use awis_storefront::config::StorefrontConfig;
use awis_storefront::state::AppState;

/// Session secret accepted by the storefront's strength checks.
pub const TEST_SESSION_SECRET: &str =
    "q8Vt2LxN4pRz7KwB1mYc9HsJ3dFg6TaE0uWo5XiQbZlCnMvAkSjPyDhGrUeO_-+=";

// =============================================================================
// Scripted backend
// =============================================================================

/// Responses the fake backend gives. Tests adjust these before driving the
/// storefront.
#[derive(Debug, Clone)]
pub struct Script {
    /// `None` answers the guest endpoint with a 500.
    pub guest_id: Option<Value>,
    pub config: Value,
    pub shipping: Value,
    pub address_add: Value,
    /// Address-list responses, one per call; the last repeats.
    pub address_lists: Vec<Value>,
    pub cart: Value,
    pub order: Value,
    pub digital: Value,
    /// `None` answers the country list with a 401.
    pub countries: Option<Value>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            guest_id: Some(json!(501)),
            config: json!({
                "cod_status": 1,
                "payment_methods": [],
                "currency_symbol_position": "right",
                "decimal_point_settings": 3,
            }),
            shipping: json!([
                {"id": 1, "title": "Standard", "cost": "2.500", "duration": "2 days"},
                {"id": 2, "title": "", "cost": 4},
            ]),
            address_add: json!({"id": 7}),
            address_lists: vec![json!([])],
            cart: json!([{"cart_group_id": "group-1", "product_id": 11, "quantity": 1}]),
            order: json!({"order_ids": [9001]}),
            digital: json!({"redirect_link": "https://pay.gateway.test/session/abc"}),
            countries: Some(json!(["Kuwait", "Saudi Arabia"])),
        }
    }
}

/// One request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct BackendState {
    script: Script,
    requests: Vec<Recorded>,
    address_list_calls: usize,
}

/// Handle to the running fake backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Change the script.
    pub fn script(&self, edit: impl FnOnce(&mut Script)) {
        edit(&mut self.lock().script);
    }

    /// Every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    /// Requests received on `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    fn record(&self, path: &str, body: Value) {
        self.lock().requests.push(Recorded {
            path: path.to_string(),
            body,
        });
    }

    fn reply(&self, path: &str, pick: impl FnOnce(&Script) -> Value) -> Json<Value> {
        self.record(path, Value::Null);
        Json(pick(&self.lock().script))
    }
}

async fn guest_id(State(backend): State<FakeBackend>) -> Response {
    backend.record("/get-guest-id", Value::Null);
    let guest = backend.lock().script.guest_id.clone();
    match guest {
        Some(id) => Json(json!({"guest_id": id})).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "guest service down").into_response(),
    }
}

async fn config(State(backend): State<FakeBackend>) -> Json<Value> {
    backend.reply("/config", |s| s.config.clone())
}

async fn shipping(
    State(backend): State<FakeBackend>,
    Path((seller, kind)): Path<(String, String)>,
) -> Json<Value> {
    backend.reply(&format!("/shipping-method/by-seller/{seller}/{kind}"), |s| {
        s.shipping.clone()
    })
}

async fn add_address(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    backend.record("/customer/address/add", body);
    Json(backend.lock().script.address_add.clone())
}

async fn list_addresses(State(backend): State<FakeBackend>) -> Json<Value> {
    backend.record("/customer/address/list", Value::Null);
    let mut state = backend.lock();
    let index = state.address_list_calls;
    state.address_list_calls += 1;
    let lists = &state.script.address_lists;
    Json(
        lists
            .get(index)
            .or_else(|| lists.last())
            .cloned()
            .unwrap_or_else(|| json!([])),
    )
}

async fn choose_shipping(
    State(backend): State<FakeBackend>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.record("/shipping-method/choose-for-order", body);
    Json(json!({"message": "ok"}))
}

async fn cart(State(backend): State<FakeBackend>) -> Json<Value> {
    backend.reply("/cart", |s| s.cart.clone())
}

async fn place_order(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    backend.record("/customer/order/place", body);
    Json(backend.lock().script.order.clone())
}

async fn digital_payment(
    State(backend): State<FakeBackend>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.record("/digital-payment", body);
    Json(backend.lock().script.digital.clone())
}

async fn countries(State(backend): State<FakeBackend>) -> Response {
    backend.record("/customer/get-restricted-country-list", Value::Null);
    let countries = backend.lock().script.countries.clone();
    match countries {
        Some(list) => Json(list).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated."})))
            .into_response(),
    }
}

async fn payment_request_page(State(backend): State<FakeBackend>) -> Html<&'static str> {
    backend.record("/customer/web-payment-request", Value::Null);
    Html(r#"<html><head><meta name="csrf-token" content="csrf-test-token"></head></html>"#)
}

fn backend_router(backend: FakeBackend) -> Router {
    let api = Router::new()
        .route("/get-guest-id", get(guest_id))
        .route("/config", get(config))
        .route("/shipping-method/by-seller/{seller}/{kind}", get(shipping))
        .route("/shipping-method/choose-for-order", post(choose_shipping))
        .route("/customer/address/add", post(add_address))
        .route("/customer/address/list", get(list_addresses))
        .route("/cart", get(cart))
        .route("/customer/order/place", post(place_order))
        .route("/digital-payment", post(digital_payment))
        .route("/customer/get-restricted-country-list", get(countries));

    Router::new()
        .nest("/api/v1", api)
        .route("/customer/web-payment-request", get(payment_request_page))
        .with_state(backend)
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server failed");
    });
    addr
}

// =============================================================================
// Test context
// =============================================================================

/// A storefront wired to a fake backend, plus a browser-like client.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub backend: FakeBackend,
}

impl TestContext {
    /// Start both servers with the default script and redirect payment mode.
    pub async fn new() -> Self {
        Self::with_settings(&[]).await
    }

    /// Start both servers, overriding storefront environment settings.
    pub async fn with_settings(settings: &[(&str, &str)]) -> Self {
        let backend = FakeBackend::default();
        let backend_addr = serve(backend_router(backend.clone())).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url = format!("http://{addr}");

        let mut vars: Vec<(String, String)> = vec![
            ("STOREFRONT_BASE_URL".into(), base_url.clone()),
            ("STOREFRONT_SESSION_SECRET".into(), TEST_SESSION_SECRET.into()),
            ("STOREFRONT_DEFAULT_LANGUAGE".into(), "en".into()),
            (
                "AWIS_API_BASE_URL".into(),
                format!("http://{backend_addr}/api/v1"),
            ),
            ("AWIS_WEB_BASE_URL".into(), format!("http://{backend_addr}")),
        ];
        vars.extend(settings.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));
        let config = StorefrontConfig::from_source(&move |key| {
            vars.iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("Invalid test configuration");

        let app = awis_storefront::app(AppState::new(config)).expect("Failed to build router");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Storefront failed");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            backend,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Put one product in the local cart.
    pub async fn add_to_cart(&self) {
        let response = self
            .post(
                "/cart/add",
                &[
                    ("product_id", "11"),
                    ("name", "Oud Royal"),
                    ("unit_price", "5.000"),
                    ("quantity", "1"),
                ],
            )
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    }

    /// Fill in and submit a complete address.
    pub async fn submit_address(&self) -> reqwest::Response {
        self.post(
            "/checkout/address",
            &[
                ("name", "Sara"),
                ("phone", "+965 5123 4567"),
                ("email", ""),
                ("country", "Kuwait"),
                ("city", "Salmiya"),
                ("postal", ""),
                ("street", "Block 10, Street 5"),
                ("address_type", "دائم"),
            ],
        )
        .await
    }

    /// Cart, guest, address and step-2 load: ready to place an order.
    pub async fn reach_step_two(&self) -> String {
        self.add_to_cart().await;
        let response = self.get("/checkout").await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let response = self.submit_address().await;
        assert_eq!(location(&response), "/checkout");
        let response = self.get("/checkout").await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.text().await.expect("Body not text")
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
