//! Remote commerce backend.
//!
//! # Architecture
//!
//! - The backend owns pricing, payment processing and address validation;
//!   this module only speaks its JSON-over-HTTP API
//! - Every call is keyed by the shopper's guest id
//! - Display configuration is cached in-memory via `moka` (5 minute TTL)
//!
//! Handlers and services depend on the [`CommerceBackend`] trait, not on the
//! HTTP client, so the checkout can be driven against a fake in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use awis_storefront::backend::{BackendClient, CommerceBackend};
//!
//! let backend = BackendClient::new(&config.backend);
//! let guest = backend.create_guest().await?;
//! let cart = backend.cart(&guest).await?;
//! ```

mod client;
#[cfg(test)]
pub mod fake;
pub mod payment_form;
pub mod types;

pub use client::BackendClient;
pub use payment_form::{PaymentFormTokenSource, WebPaymentForm, WebPaymentPageClient};
pub use types::{
    BackendCartLine, DigitalPaymentOutcome, DigitalPaymentRequest, DisplayConfig, NewAddress,
    OrderItem, PlaceOrderRequest,
};

use async_trait::async_trait;
use thiserror::Error;

use awis_core::{
    AddressId, CartGroupId, GuestId, Language, OrderReference, SellerRef, ShippingMethodId,
    ShippingOption,
};

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Backend answered 401.
    #[error("Unauthorized")]
    Unauthorized,

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required field was absent from an otherwise valid response.
    #[error("Missing field in response: {0}")]
    MissingField(&'static str),
}

impl BackendError {
    /// The backend's own message, when it sent one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Operations the checkout needs from the commerce backend.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// Issue a new anonymous guest id.
    async fn create_guest(&self) -> Result<GuestId, BackendError>;

    /// Payment methods and price display settings, localized for `lang`.
    async fn display_config(&self, lang: Language) -> Result<DisplayConfig, BackendError>;

    /// Shipping methods configured for one seller.
    async fn shipping_methods(
        &self,
        seller: SellerRef,
        guest: &GuestId,
    ) -> Result<Vec<ShippingOption>, BackendError>;

    /// Create an address record; the id, when the response carries one.
    async fn add_address(&self, address: &NewAddress) -> Result<Option<AddressId>, BackendError>;

    /// Ids of the guest's saved addresses.
    async fn list_addresses(&self, guest: &GuestId) -> Result<Vec<AddressId>, BackendError>;

    /// Persist the chosen shipping method for a cart group.
    async fn choose_shipping(
        &self,
        method: ShippingMethodId,
        group: &CartGroupId,
        guest: &GuestId,
    ) -> Result<(), BackendError>;

    /// The authoritative backend cart.
    async fn cart(&self, guest: &GuestId) -> Result<Vec<BackendCartLine>, BackendError>;

    /// Place a cash-on-delivery order.
    async fn place_order(&self, order: &PlaceOrderRequest) -> Result<OrderReference, BackendError>;

    /// Start a hosted digital payment.
    async fn digital_payment(
        &self,
        request: &DigitalPaymentRequest,
    ) -> Result<DigitalPaymentOutcome, BackendError>;

    /// Countries the store delivers to.
    async fn allowed_countries(&self, guest: &GuestId) -> Result<Vec<String>, BackendError>;
}
