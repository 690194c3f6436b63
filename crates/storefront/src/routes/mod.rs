//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (tenant branding)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//! GET  /language/{code}        - Switch display language
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a line
//! POST /cart/remove            - Remove a line
//!
//! # Checkout
//! GET  /checkout               - Current wizard step
//! POST /checkout/address       - Submit the address step
//! POST /checkout/back          - Back to the address step
//! POST /checkout/shipping      - Choose and persist a shipping method
//! POST /checkout/payment       - Choose a payment method
//! POST /checkout/place         - Submit the order
//!
//! # After checkout
//! GET  /order-success          - Confirmation page
//! GET  /payment/callback       - Return from the payment gateway
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod language;
pub mod order_success;
pub mod payment_callback;

use axum::{
    Router,
    routing::{get, post},
};

use awis_core::Language;

use crate::labels::Labels;
use crate::middleware::{CspNonce, cart_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

// =============================================================================
// Page chrome
// =============================================================================

/// Data every page template needs for the shared layout.
pub struct Page {
    pub lang: &'static str,
    pub dir: &'static str,
    pub title: String,
    pub brand_name: &'static str,
    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub nonce: String,
    /// Language the switch link points to.
    pub other_lang: &'static str,
    pub t: &'static Labels,
}

impl Page {
    #[must_use]
    pub fn new(state: &AppState, lang: Language, nonce: CspNonce) -> Self {
        let branding = state.branding();
        let other = match lang {
            Language::Ar => Language::En,
            Language::En => Language::Ar,
        };
        Self {
            lang: lang.code(),
            dir: lang.dir(),
            title: branding.title(),
            brand_name: if lang.is_arabic() {
                branding.name_ar
            } else {
                branding.name_en
            },
            primary_color: branding.primary_color,
            secondary_color: branding.secondary_color,
            nonce: nonce.0,
            other_lang: other.code(),
            t: Labels::for_language(lang),
        }
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(cart::show)).merge(
        Router::new()
            .route("/add", post(cart::add))
            .route("/remove", post(cart::remove))
            .layer(cart_rate_limiter()),
    )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", get(checkout::show)).merge(
        Router::new()
            .route("/address", post(checkout::submit_address))
            .route("/back", post(checkout::back))
            .route("/shipping", post(checkout::choose_shipping))
            .route("/payment", post(checkout::choose_payment))
            .route("/place", post(checkout::place_order))
            .layer(checkout_rate_limiter()),
    )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/language/{code}", get(language::switch))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/order-success", get(order_success::show))
        .route("/payment/callback", get(payment_callback::callback))
}
